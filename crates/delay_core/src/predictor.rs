//! Delay predictor over a shared, immutable artifact
//!
//! The predictor never mutates its artifact, so one instance can sit behind
//! an `Arc` and serve concurrent callers. Every call is all-or-nothing: a
//! classifier failure fails the whole batch.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::artifact::DelayArtifact;
use crate::gbdt::Classifier;
use crate::matrix::FeatureMatrix;
use crate::preprocess::preprocess_inference;
use crate::record::{FlightRecord, PredictionDetails, PredictionRequest, PredictionResponse};
use crate::schema::CanonicalSchema;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictError {
    #[error("Model not available: {0}")]
    ModelUnavailable(String),

    #[error("Inference error: {0}")]
    Inference(String),
}

/// Applies the canonical schema and classifier to raw records
#[derive(Debug, Clone)]
pub struct DelayPredictor {
    artifact: Option<Arc<DelayArtifact>>,
    unavailable_reason: String,
}

impl DelayPredictor {
    pub fn new(artifact: Arc<DelayArtifact>) -> Self {
        Self {
            artifact: Some(artifact),
            unavailable_reason: String::new(),
        }
    }

    /// A predictor with no artifact; every call fails with `ModelUnavailable`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            artifact: None,
            unavailable_reason: reason.into(),
        }
    }

    /// Load an artifact from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PredictError> {
        DelayArtifact::load(path)
            .map(|a| Self::new(Arc::new(a)))
            .map_err(|e| PredictError::ModelUnavailable(e.to_string()))
    }

    /// Load an artifact, degrading to an unavailable predictor on failure
    pub fn load_or_unavailable<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(predictor) => predictor,
            Err(e) => {
                error!(path = %path.display(), "failed to load delay artifact: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.artifact.is_some()
    }

    pub fn artifact(&self) -> Option<&DelayArtifact> {
        self.artifact.as_deref()
    }

    fn require_artifact(&self) -> Result<&DelayArtifact, PredictError> {
        self.artifact.as_deref().ok_or_else(|| {
            PredictError::ModelUnavailable(if self.unavailable_reason.is_empty() {
                "no artifact loaded".to_string()
            } else {
                self.unavailable_reason.clone()
            })
        })
    }

    pub fn schema(&self) -> Option<&CanonicalSchema> {
        self.artifact().map(DelayArtifact::schema)
    }

    /// Aligned feature matrix for a batch
    pub fn features(&self, records: &[FlightRecord]) -> Result<FeatureMatrix, PredictError> {
        let artifact = self.require_artifact()?;
        let encoded = preprocess_inference(records);
        Ok(artifact.schema().align(&encoded))
    }

    /// One 0/1 prediction per record, in input order
    #[instrument(skip(self, records), fields(rows = records.len()))]
    pub fn predict(&self, records: &[FlightRecord]) -> Result<Vec<u8>, PredictError> {
        let artifact = self.require_artifact()?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = artifact.schema().align(&preprocess_inference(records));
        let predictions = artifact
            .model()
            .predict(&matrix)
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        if predictions.len() != records.len() {
            return Err(PredictError::Inference(format!(
                "classifier returned {} predictions for {} rows",
                predictions.len(),
                records.len()
            )));
        }

        debug!(
            delayed = predictions.iter().filter(|&&p| p == 1).count(),
            "predictions generated"
        );
        Ok(predictions)
    }

    /// Predict for a single or batch request, shaping the response to match
    pub fn predict_request(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictError> {
        let predictions = self.predict(request.records())?;

        match request {
            PredictionRequest::Batch { .. } => Ok(PredictionResponse::Batch {
                predict: predictions,
            }),
            PredictionRequest::Single(record) => {
                let delay_prediction = predictions.first().copied().ok_or_else(|| {
                    PredictError::Inference("empty prediction result".to_string())
                })?;
                Ok(PredictionResponse::Single {
                    delay_prediction,
                    details: PredictionDetails {
                        airline: record.opera.clone(),
                        month: record.mes,
                        flight_type: record.tipo_vuelo.clone(),
                    },
                })
            }
        }
    }
}
