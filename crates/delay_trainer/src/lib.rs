//! Flight delay trainer and batch pipeline
//!
//! Trains the delay classifier deterministically from a CSV of historical
//! flights, packages it with its canonical schema, and scores CSV batches
//! against a saved artifact.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod metrics;
pub mod trainer;

use flightdelay_core::DelayPredictor;
use std::path::Path;
use tracing::info;

pub use dataset::{FlightDataset, PREDICTION_COLUMN, REQUIRED_COLUMNS};
pub use deterministic::{permutation, train_test_split, LcgRng, SplitIndices, SplitTieBreaker};
pub use errors::TrainerError;
pub use metrics::{ClassMetrics, ClassificationReport};
pub use trainer::{
    log_loss, DelayTrainer, GbdtConfig, GbdtTrainer, TrainingOutcome, DEFAULT_SEED,
};

/// Train from a CSV file and save the artifact; returns the outcome
pub fn train_from_csv(
    data: &Path,
    artifact_path: &Path,
    seed: u64,
) -> Result<TrainingOutcome, TrainerError> {
    let dataset = FlightDataset::from_csv(data)?;
    if !dataset.is_labelled() {
        return Err(TrainerError::Dataset(
            "training data needs Fecha-I and Fecha-O (or delay) columns".into(),
        ));
    }

    let outcome = DelayTrainer::new(seed).train(dataset.records())?;
    let digest = outcome.artifact.save(artifact_path)?;
    info!(path = %artifact_path.display(), digest = %digest, "artifact written");
    Ok(outcome)
}

/// Score a CSV file against a saved artifact and write the annotated copy
pub fn predict_csv(
    data: &Path,
    artifact_path: &Path,
    output: &Path,
) -> Result<Vec<u8>, TrainerError> {
    let predictor = DelayPredictor::from_path(artifact_path)?;
    let dataset = FlightDataset::from_csv(data)?;

    let predictions = predictor.predict(dataset.records())?;
    dataset.write_predictions_csv(output, &predictions)?;

    info!(
        rows = predictions.len(),
        delayed = predictions.iter().filter(|&&p| p == 1).count(),
        "batch prediction complete"
    );
    Ok(predictions)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
