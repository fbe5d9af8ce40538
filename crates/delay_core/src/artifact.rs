//! Trained model artifact: classifier and canonical schema as one unit
//!
//! On disk the artifact is a canonical JSON file with a `.hash` sidecar
//! holding the BLAKE3 hex digest of the file bytes. Loading re-checks the
//! digest and the classifier/schema consistency before anything can score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::gbdt::{Model, ModelError};
use crate::schema::CanonicalSchema;
use crate::serde_canon::{blake3_hex, to_canonical_json, CanonicalError};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Artifact hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("Classifier and schema disagree: {0}")]
    Inconsistent(String),

    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Canonical(#[from] CanonicalError),
}

/// Provenance and held-out evaluation of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ArtifactMetadata {
    /// Unix seconds at training time
    pub created_at: i64,
    pub crate_version: String,
    pub model_hash: String,
    pub schema_hash: String,
    pub feature_count: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub seed: u64,
    /// Held-out metrics, e.g. `accuracy`, `recall_1`
    pub metrics: BTreeMap<String, f64>,
}

/// Classifier plus the schema it was trained against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayArtifact {
    pub(crate) metadata: ArtifactMetadata,
    pub(crate) model: Model,
    pub(crate) schema: CanonicalSchema,
}

impl DelayArtifact {
    /// Bundle a classifier with its schema, filling in hashes and width
    pub fn new(
        model: Model,
        schema: CanonicalSchema,
        mut metadata: ArtifactMetadata,
    ) -> Result<Self, ArtifactError> {
        metadata.model_hash = model.hash_hex()?;
        metadata.schema_hash = schema.hash_hex()?;
        metadata.feature_count = schema.width();

        let artifact = Self {
            metadata,
            model,
            schema,
        };
        artifact.verify()?;
        Ok(artifact)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    /// Check that the classifier can only ever be fed this schema
    pub fn verify(&self) -> Result<(), ArtifactError> {
        self.model.validate()?;
        self.schema
            .validate()
            .map_err(|e| ArtifactError::Schema(e.to_string()))?;

        if let Some(index) = self.model.max_feature_index() {
            if index >= self.schema.width() {
                return Err(ArtifactError::Inconsistent(format!(
                    "model splits on feature {} but schema has {} columns",
                    index,
                    self.schema.width()
                )));
            }
        }

        if self.metadata.feature_count != self.schema.width() {
            return Err(ArtifactError::Inconsistent(format!(
                "metadata feature_count {} != schema width {}",
                self.metadata.feature_count,
                self.schema.width()
            )));
        }

        let schema_hash = self.schema.hash_hex()?;
        if !self.metadata.schema_hash.is_empty() && self.metadata.schema_hash != schema_hash {
            return Err(ArtifactError::Inconsistent(format!(
                "schema hash {} does not match recorded {}",
                schema_hash, self.metadata.schema_hash
            )));
        }

        let model_hash = self.model.hash_hex()?;
        if !self.metadata.model_hash.is_empty() && self.metadata.model_hash != model_hash {
            return Err(ArtifactError::Inconsistent(format!(
                "model hash {} does not match recorded {}",
                model_hash, self.metadata.model_hash
            )));
        }

        Ok(())
    }

    pub fn to_canonical_json(&self) -> Result<String, ArtifactError> {
        Ok(to_canonical_json(self)?)
    }

    /// Digest sidecar path: the artifact file name with `.hash` appended
    pub fn hash_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".hash");
        PathBuf::from(name)
    }

    /// Write artifact JSON and its digest sidecar; returns the digest
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<String, ArtifactError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = self.to_canonical_json()?;
        let digest = blake3_hex(json.as_bytes());

        fs::write(path, &json)?;
        fs::write(Self::hash_path(path), &digest)?;

        info!(
            path = %path.display(),
            digest = %digest,
            features = self.schema.width(),
            trees = self.model.num_trees(),
            "saved delay artifact"
        );
        Ok(digest)
    }

    /// Read, hash-check and verify an artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path)?;
        let actual = blake3_hex(&bytes);

        let hash_path = Self::hash_path(path);
        if hash_path.exists() {
            let expected = fs::read_to_string(&hash_path)?.trim().to_string();
            if expected != actual {
                return Err(ArtifactError::HashMismatch { expected, actual });
            }
        } else {
            warn!(path = %hash_path.display(), "artifact digest sidecar missing, skipping hash check");
        }

        let artifact: DelayArtifact = serde_json::from_slice(&bytes)?;
        artifact.verify()?;

        info!(
            path = %path.display(),
            features = artifact.schema.width(),
            trees = artifact.model.num_trees(),
            "loaded delay artifact"
        );
        Ok(artifact)
    }
}
