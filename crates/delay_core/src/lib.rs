//! Flight delay prediction core
//!
//! Turns raw flight records into model-ready feature matrices and scores
//! them with a deterministic fixed-point GBDT classifier.
//!
//! Modules:
//! - `record`: Flight records and prediction request/response shapes
//! - `temporal`: Period of day, high season and minute-difference features
//! - `label`: Binary delay label derivation
//! - `encoding`: One-hot encoding of categorical columns
//! - `schema`: Canonical feature schema fitting and alignment
//! - `gbdt`: Integer GBDT evaluator and the `Classifier` seam
//! - `artifact`: Classifier plus schema persisted as one hashed unit
//! - `predictor`: End-to-end inference over a loaded artifact
//! - `validation`: Input-domain checks for served requests
//! - `sink`: Best-effort prediction logging

pub mod artifact;
pub mod encoding;
pub mod errors;
pub mod gbdt;
pub mod label;
pub mod matrix;
pub mod predictor;
pub mod preprocess;
pub mod record;
pub mod schema;
pub mod serde_canon;
pub mod sink;
pub mod temporal;
pub mod validation;

pub use artifact::{ArtifactError, ArtifactMetadata, DelayArtifact};
pub use encoding::{one_hot_encode, CategoricalColumn, CategoryKey, DEFAULT_CATEGORICAL_COLUMNS};
pub use errors::{CoreError, Result};
pub use gbdt::{logistic, Classifier, Model, ModelError, Node, Tree, SCALE};
pub use label::{derive_label, derive_labels, DELAY_THRESHOLD_MINUTES};
pub use matrix::FeatureMatrix;
pub use predictor::{DelayPredictor, PredictError};
pub use preprocess::{preprocess_inference, preprocess_training, TrainingSet};
pub use record::{FlightRecord, PredictionDetails, PredictionRequest, PredictionResponse};
pub use schema::{align, fit_schema, CanonicalSchema};
pub use sink::{JsonLinesSink, NoopSink, PredictionSink, TracingSink};
pub use temporal::{engineer, high_season, min_diff, period_day, EngineeredRecord, PeriodDay};
pub use validation::{FlightValidator, ValidationError};

/// Crate version string recorded in artifact metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
