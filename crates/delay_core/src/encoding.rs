//! One-hot encoding of categorical columns
//!
//! Columns are produced only for values observed in the batch being encoded,
//! so two batches can disagree on width and order. Anything that reaches the
//! classifier must go through [`crate::schema::CanonicalSchema::align`] first.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;
use crate::matrix::FeatureMatrix;
use crate::record::FlightRecord;
use crate::temporal::EngineeredRecord;

/// Categorical source columns that can be expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalColumn {
    #[serde(rename = "OPERA")]
    Opera,
    #[serde(rename = "TIPOVUELO")]
    TipoVuelo,
    #[serde(rename = "MES")]
    Mes,
}

/// Expansion order used for training and inference
pub const DEFAULT_CATEGORICAL_COLUMNS: [CategoricalColumn; 3] = [
    CategoricalColumn::Opera,
    CategoricalColumn::TipoVuelo,
    CategoricalColumn::Mes,
];

impl CategoricalColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoricalColumn::Opera => "OPERA",
            CategoricalColumn::TipoVuelo => "TIPOVUELO",
            CategoricalColumn::Mes => "MES",
        }
    }

    /// Category value of this column for one record
    pub fn key(&self, record: &FlightRecord) -> CategoryKey {
        match self {
            CategoricalColumn::Opera => CategoryKey::Text(record.opera.clone()),
            CategoricalColumn::TipoVuelo => CategoryKey::Text(record.tipo_vuelo.clone()),
            CategoricalColumn::Mes => CategoryKey::Int(record.mes),
        }
    }

    /// Indicator column name for a value, e.g. `MES_3`
    pub fn indicator_name(&self, key: &CategoryKey) -> String {
        format!("{}_{}", self.as_str(), key)
    }
}

impl fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoricalColumn {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPERA" => Ok(CategoricalColumn::Opera),
            "TIPOVUELO" => Ok(CategoricalColumn::TipoVuelo),
            "MES" => Ok(CategoricalColumn::Mes),
            other => Err(CoreError::UnknownColumn(other.to_string())),
        }
    }
}

/// Category value; integers sort numerically, so `MES_2` precedes `MES_10`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKey::Int(v) => write!(f, "{v}"),
            CategoryKey::Text(v) => f.write_str(v),
        }
    }
}

/// Expand `columns` of `records` into indicator columns
///
/// Per source column, indicators follow value order; blocks follow the order
/// of `columns`.
pub fn one_hot_encode(records: &[FlightRecord], columns: &[CategoricalColumn]) -> FeatureMatrix {
    // (block, value) -> output column index
    let mut positions: BTreeMap<(usize, CategoryKey), usize> = BTreeMap::new();
    let mut names = Vec::new();

    for (block, column) in columns.iter().enumerate() {
        let observed: BTreeSet<CategoryKey> = records.iter().map(|r| column.key(r)).collect();
        for key in observed {
            names.push(column.indicator_name(&key));
            positions.insert((block, key), names.len() - 1);
        }
    }

    let width = names.len();
    let rows = records
        .iter()
        .map(|record| {
            let mut row = vec![0i64; width];
            for (block, column) in columns.iter().enumerate() {
                if let Some(&idx) = positions.get(&(block, column.key(record))) {
                    row[idx] = 1;
                }
            }
            row
        })
        .collect();

    FeatureMatrix {
        columns: names,
        rows,
    }
}

/// Encode engineered records with the default column set
pub fn encode_engineered(records: &[EngineeredRecord]) -> FeatureMatrix {
    let raw: Vec<FlightRecord> = records.iter().map(|r| r.record.clone()).collect();
    one_hot_encode(&raw, &DEFAULT_CATEGORICAL_COLUMNS)
}
