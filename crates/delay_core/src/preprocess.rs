//! Raw records to model-ready matrices

use tracing::{info, instrument};

use crate::encoding::{encode_engineered, one_hot_encode, DEFAULT_CATEGORICAL_COLUMNS};
use crate::errors::{CoreError, Result};
use crate::label::derive_labels;
use crate::matrix::FeatureMatrix;
use crate::record::FlightRecord;
use crate::schema::CanonicalSchema;
use crate::temporal::{engineer, EngineeredRecord, PeriodDay};

/// Aligned training matrix with its labels and the schema fit on it
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub matrix: FeatureMatrix,
    pub labels: Vec<u8>,
    pub schema: CanonicalSchema,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Share of rows labelled delayed
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l == 1).count() as f64 / self.labels.len() as f64
    }
}

/// Engineer, label and encode a training batch, fitting the canonical schema
#[instrument(skip(records), fields(rows = records.len()))]
pub fn preprocess_training(records: &[FlightRecord]) -> Result<TrainingSet> {
    if records.is_empty() {
        return Err(CoreError::InvalidMatrix("training set is empty".into()));
    }

    let engineered = engineer(records);
    let labels = derive_labels(&engineered);
    log_feature_summary(&engineered, &labels);

    let encoded = encode_engineered(&engineered);
    let schema = CanonicalSchema::from_matrix(&encoded)?;
    let matrix = schema.align(&encoded);

    info!(
        rows = matrix.n_rows(),
        features = schema.width(),
        "training preprocessing complete"
    );

    Ok(TrainingSet {
        matrix,
        labels,
        schema,
    })
}

/// Engineer and encode an inference batch (not yet aligned)
#[instrument(skip(records), fields(rows = records.len()))]
pub fn preprocess_inference(records: &[FlightRecord]) -> FeatureMatrix {
    let engineered = engineer(records);
    let raw: Vec<FlightRecord> = engineered.into_iter().map(|e| e.record).collect();
    one_hot_encode(&raw, &DEFAULT_CATEGORICAL_COLUMNS)
}

fn log_feature_summary(engineered: &[EngineeredRecord], labels: &[u8]) {
    let count = |p: PeriodDay| engineered.iter().filter(|e| e.period_day == p).count();
    let high_season = engineered.iter().filter(|e| e.high_season == 1).count();
    let delayed = labels.iter().filter(|&&l| l == 1).count();

    info!(
        morning = count(PeriodDay::Morning),
        afternoon = count(PeriodDay::Afternoon),
        night = count(PeriodDay::Night),
        high_season,
        delayed,
        "engineered temporal features"
    );
}
