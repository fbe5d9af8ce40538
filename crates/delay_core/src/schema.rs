//! Canonical feature schema and alignment
//!
//! The schema is the ordered column list fixed when the training set is
//! encoded. Any later matrix is reindexed to it: canonical columns are kept
//! in canonical order, columns the schema does not know are dropped, and
//! canonical columns the batch never produced are zero-filled.
//!
//! A category value never seen at training time therefore produces an
//! all-zero indicator block rather than an error. Callers that need to
//! reject such values must validate before encoding.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::encoding::{one_hot_encode, CategoricalColumn, DEFAULT_CATEGORICAL_COLUMNS};
use crate::errors::{CoreError, Result};
use crate::matrix::FeatureMatrix;
use crate::record::FlightRecord;
use crate::serde_canon::{hash_canonical_hex, CanonicalError};

/// Ordered, duplicate-free list of feature column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSchema {
    columns: Vec<String>,
}

impl CanonicalSchema {
    /// Schema from an explicit column list
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    /// Reject empty or duplicated column lists (e.g. after deserialization)
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(CoreError::InvalidSchema("schema has no columns".into()));
        }
        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(CoreError::InvalidSchema(format!(
                    "duplicate column: {column}"
                )));
            }
        }
        Ok(())
    }

    /// Capture the column order of an already-encoded training matrix
    pub fn from_matrix(matrix: &FeatureMatrix) -> Result<Self> {
        Self::new(matrix.columns.clone())
    }

    /// Encode a training batch and capture its columns
    pub fn fit(records: &[FlightRecord], columns: &[CategoricalColumn]) -> Result<Self> {
        Self::from_matrix(&one_hot_encode(records, columns))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Reindex `matrix` to this schema
    ///
    /// Row count and order are preserved; only the column axis changes. A
    /// short row reads its missing trailing cells as zero.
    pub fn align(&self, matrix: &FeatureMatrix) -> FeatureMatrix {
        let source: HashMap<&str, usize> = matrix
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();

        let dropped = matrix
            .columns
            .iter()
            .filter(|c| !self.contains(c))
            .count();
        if dropped > 0 {
            debug!(dropped, "dropping columns absent from the canonical schema");
        }

        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| source.get(c.as_str()).copied())
            .collect();

        let rows = matrix
            .rows
            .iter()
            .map(|row| {
                mapping
                    .iter()
                    .map(|src| src.and_then(|i| row.get(i).copied()).unwrap_or(0))
                    .collect()
            })
            .collect();

        FeatureMatrix {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// BLAKE3 hex digest of the canonical JSON form
    pub fn hash_hex(&self) -> std::result::Result<String, CanonicalError> {
        hash_canonical_hex(self)
    }
}

/// Fit a schema over a training batch using the default categorical columns
pub fn fit_schema(records: &[FlightRecord]) -> Result<CanonicalSchema> {
    CanonicalSchema::fit(records, &DEFAULT_CATEGORICAL_COLUMNS)
}

/// Align `matrix` to `schema`
pub fn align(matrix: &FeatureMatrix, schema: &CanonicalSchema) -> FeatureMatrix {
    schema.align(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn training() -> Vec<FlightRecord> {
        vec![
            FlightRecord::new("Grupo LATAM", 5, "N"),
            FlightRecord::new("Sky Airline", 1, "I"),
            FlightRecord::new("Copa Air", 12, "I"),
            FlightRecord::new("Aerolineas Argentinas", 7, "N"),
        ]
    }

    #[test]
    fn test_fit_schema_order() {
        let schema = fit_schema(&training()).unwrap();
        assert_eq!(
            schema.columns(),
            &[
                "OPERA_Aerolineas Argentinas",
                "OPERA_Copa Air",
                "OPERA_Grupo LATAM",
                "OPERA_Sky Airline",
                "TIPOVUELO_I",
                "TIPOVUELO_N",
                "MES_1",
                "MES_5",
                "MES_7",
                "MES_12",
            ]
        );
    }

    #[test]
    fn test_single_record_alignment() {
        let schema = fit_schema(&training()).unwrap();
        let batch = one_hot_encode(
            &[FlightRecord::new("Grupo LATAM", 5, "N")],
            &DEFAULT_CATEGORICAL_COLUMNS,
        );
        let aligned = schema.align(&batch);

        assert_eq!(aligned.columns, schema.columns());
        assert_eq!(
            aligned.active_columns(0),
            vec!["OPERA_Grupo LATAM", "TIPOVUELO_N", "MES_5"]
        );
        assert_eq!(aligned.rows[0].iter().sum::<i64>(), 3);
    }

    #[test]
    fn test_unknown_columns_dropped_and_missing_zero_filled() {
        let schema = CanonicalSchema::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let matrix = FeatureMatrix::new(
            vec!["z".into(), "c".into(), "a".into()],
            vec![vec![1, 1, 0], vec![1, 0, 1]],
        )
        .unwrap();

        let aligned = schema.align(&matrix);
        assert_eq!(aligned.columns, vec!["a", "b", "c"]);
        assert_eq!(aligned.rows, vec![vec![0, 0, 1], vec![1, 0, 0]]);
    }

    #[test]
    fn test_short_rows_zero_filled() {
        let schema =
            CanonicalSchema::new(vec!["OPERA_Grupo LATAM".into(), "MES_5".into()]).unwrap();
        let ragged = FeatureMatrix {
            columns: vec!["OPERA_Grupo LATAM".into(), "MES_5".into()],
            rows: vec![vec![1]],
        };

        let aligned = schema.align(&ragged);
        assert_eq!(aligned.rows, vec![vec![1, 0]]);
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let schema = fit_schema(&training()).unwrap();
        let batch = one_hot_encode(
            &[FlightRecord::new("Unknown Air", 5, "N")],
            &DEFAULT_CATEGORICAL_COLUMNS,
        );
        let aligned = schema.align(&batch);

        let opera_block: i64 = aligned
            .columns
            .iter()
            .zip(&aligned.rows[0])
            .filter(|(c, _)| c.starts_with("OPERA_"))
            .map(|(_, v)| *v)
            .sum();
        assert_eq!(opera_block, 0);
        assert_eq!(aligned.rows[0].iter().sum::<i64>(), 2);
    }

    #[test]
    fn test_empty_batch_alignment() {
        let schema = fit_schema(&training()).unwrap();
        let aligned = schema.align(&FeatureMatrix::default());
        assert_eq!(aligned.n_rows(), 0);
        assert_eq!(aligned.n_cols(), schema.width());
    }

    #[test]
    fn test_invalid_schemas() {
        assert!(CanonicalSchema::new(vec![]).is_err());
        assert!(CanonicalSchema::new(vec!["a".into(), "a".into()]).is_err());
    }

    #[test]
    fn test_schema_hash_stable() {
        let a = fit_schema(&training()).unwrap();
        let b = fit_schema(&training()).unwrap();
        assert_eq!(a.hash_hex().unwrap(), b.hash_hex().unwrap());
    }

    fn arbitrary_record() -> impl Strategy<Value = FlightRecord> {
        (
            prop::sample::select(vec!["Grupo LATAM", "Sky Airline", "Copa Air", "JetSMART SPA"]),
            1i64..=12,
            prop::sample::select(vec!["N", "I"]),
        )
            .prop_map(|(opera, mes, tipo)| FlightRecord::new(opera, mes, tipo))
    }

    proptest! {
        #[test]
        fn alignment_is_idempotent_and_canonical(
            train in prop::collection::vec(arbitrary_record(), 1..40),
            batch in prop::collection::vec(arbitrary_record(), 0..20),
        ) {
            let schema = fit_schema(&train).unwrap();
            let encoded = one_hot_encode(&batch, &DEFAULT_CATEGORICAL_COLUMNS);
            let once = schema.align(&encoded);
            let twice = schema.align(&once);

            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.columns.as_slice(), schema.columns());
            prop_assert_eq!(once.n_rows(), batch.len());

            for (i, record) in batch.iter().enumerate() {
                for column in DEFAULT_CATEGORICAL_COLUMNS {
                    let name = column.indicator_name(&column.key(record));
                    let expected = i64::from(schema.contains(&name));
                    prop_assert_eq!(once.get(i, &name).unwrap_or(0), expected);
                }
            }
        }
    }
}
