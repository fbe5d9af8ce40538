//! GBDT model with deterministic integer scoring
//!
//! The score is a fixed-point log-odds margin:
//! `bias + Σ leaf_value * tree_weight / scale`. A row is labelled delayed
//! when the margin is positive, i.e. when the predicted probability exceeds
//! one half.

use super::tree::Tree;
use crate::matrix::FeatureMatrix;
use crate::serde_canon::{hash_canonical_hex, CanonicalError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// GBDT model errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("Feature width mismatch: row {row} has {actual} values, expected {expected}")]
    WidthMismatch {
        row: usize,
        actual: usize,
        expected: usize,
    },

    #[error("Model references feature {index} but input has only {width} columns")]
    FeatureOutOfRange { index: usize, width: usize },

    #[error("Canonical serialization error: {0}")]
    CanonicalError(#[from] CanonicalError),
}

/// Default scale factor for fixed-point arithmetic (1e6)
pub const SCALE: i64 = 1_000_000;

/// Logistic of a fixed-point margin at `scale`
pub fn logistic(margin: i64, scale: i64) -> f64 {
    1.0 / (1.0 + (-(margin as f64 / scale as f64)).exp())
}

/// Gradient-boosted ensemble of integer trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// Model format version (always 1 for now)
    pub version: i32,

    /// Fixed-point scale factor
    pub scale: i64,

    /// Decision trees in the ensemble
    pub trees: Vec<Tree>,

    /// Initial log-odds margin (fixed-point)
    pub bias: i64,

    /// Scale of the returned margin (same as `scale` for trained models)
    pub post_scale: i64,
}

impl Model {
    pub fn new(trees: Vec<Tree>, bias: i64) -> Self {
        Self {
            version: 1,
            scale: SCALE,
            trees,
            bias,
            post_scale: SCALE,
        }
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != 1 {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if self.scale <= 0 {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid scale: {}",
                self.scale
            )));
        }

        if self.post_scale <= 0 {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid post_scale: {}",
                self.post_scale
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;
        }

        Ok(())
    }

    /// Fixed-point log-odds margin for one feature row
    pub fn score(&self, features: &[i64]) -> i64 {
        let mut sum = self.bias;

        for tree in &self.trees {
            let leaf_value = tree.evaluate(features);
            let weighted = (leaf_value as i128 * tree.weight as i128) / self.scale as i128;
            let contribution = weighted.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
            sum = sum.saturating_add(contribution);
        }

        sum
    }

    /// Delay probability for one feature row
    pub fn probability(&self, features: &[i64]) -> f64 {
        logistic(self.score(features), self.post_scale)
    }

    /// 0/1 label for one feature row
    pub fn predict_one(&self, features: &[i64]) -> u8 {
        u8::from(self.score(features) > 0)
    }

    /// Labels for a batch of rows that must all be `width` wide
    ///
    /// Fails the whole batch if any row has the wrong width or the model
    /// splits on a feature the rows do not have.
    pub fn predict_labels(&self, rows: &[Vec<i64>], width: usize) -> Result<Vec<u8>, ModelError> {
        if let Some(index) = self.max_feature_index() {
            if index >= width {
                return Err(ModelError::FeatureOutOfRange { index, width });
            }
        }

        rows.iter()
            .enumerate()
            .map(|(row, features)| {
                if features.len() != width {
                    return Err(ModelError::WidthMismatch {
                        row,
                        actual: features.len(),
                        expected: width,
                    });
                }
                Ok(self.predict_one(features))
            })
            .collect()
    }

    /// Highest feature index used by any tree
    pub fn max_feature_index(&self) -> Option<usize> {
        self.trees.iter().filter_map(Tree::max_feature_index).max()
    }

    /// Model hash as hex string
    pub fn hash_hex(&self) -> Result<String, ModelError> {
        Ok(hash_canonical_hex(self)?)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Opaque binary classifier over an aligned feature matrix
pub trait Classifier {
    /// One 0/1 label per matrix row, in row order
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<u8>, ModelError>;
}

impl Classifier for Model {
    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<u8>, ModelError> {
        self.predict_labels(&matrix.rows, matrix.n_cols())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tree::Node;

    fn create_test_model() -> Model {
        // feature 0 set -> +2.0 log-odds, else -1.0; feature 1 set -> -0.5
        let tree1 = Tree::new(
            vec![
                Node::internal(0, 0, 0, 1, 2),
                Node::leaf(1, -SCALE),
                Node::leaf(2, 2 * SCALE),
            ],
            SCALE,
        );
        let tree2 = Tree::new(
            vec![
                Node::internal(0, 1, 0, 1, 2),
                Node::leaf(1, 0),
                Node::leaf(2, -SCALE / 2),
            ],
            SCALE,
        );
        Model::new(vec![tree1, tree2], 0)
    }

    #[test]
    fn test_model_creation() {
        let model = create_test_model();
        assert_eq!(model.version, 1);
        assert_eq!(model.num_trees(), 2);
        assert!(model.validate().is_ok());
        assert_eq!(model.max_feature_index(), Some(1));
    }

    #[test]
    fn test_margin_and_labels() {
        let model = create_test_model();
        assert_eq!(model.score(&[1, 0]), 2 * SCALE);
        assert_eq!(model.score(&[1, 1]), 3 * SCALE / 2);
        assert_eq!(model.score(&[0, 1]), -3 * SCALE / 2);

        assert_eq!(model.predict_one(&[1, 1]), 1);
        assert_eq!(model.predict_one(&[0, 0]), 0);
    }

    #[test]
    fn test_shrinkage_weight() {
        let tree = Tree::new(vec![Node::leaf(0, 3 * SCALE)], SCALE / 100);
        let model = Model::new(vec![tree], -SCALE / 10);
        // 3.0 * 0.01 - 0.1 = -0.07
        assert_eq!(model.score(&[]), -70_000);
    }

    #[test]
    fn test_probability() {
        let model = Model::new(vec![], 0);
        assert!((model.probability(&[]) - 0.5).abs() < 1e-12);

        let model = create_test_model();
        assert!(model.probability(&[1, 0]) > 0.85);
        assert!(model.probability(&[0, 1]) < 0.2);
    }

    #[test]
    fn test_predict_labels_checks_width() {
        let model = create_test_model();
        let labels = model.predict_labels(&[vec![1, 0], vec![0, 1]], 2).unwrap();
        assert_eq!(labels, vec![1, 0]);

        let err = model.predict_labels(&[vec![1, 0], vec![1]], 2).unwrap_err();
        assert!(matches!(err, ModelError::WidthMismatch { row: 1, .. }));

        let err = model.predict_labels(&[vec![1]], 1).unwrap_err();
        assert!(matches!(err, ModelError::FeatureOutOfRange { index: 1, width: 1 }));
    }

    #[test]
    fn test_classifier_over_matrix() {
        let model = create_test_model();
        let matrix =
            FeatureMatrix::new(vec!["a".into(), "b".into()], vec![vec![1, 0], vec![0, 0]]).unwrap();
        assert_eq!(Classifier::predict(&model, &matrix).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_hash_is_stable() {
        let model = create_test_model();
        let hash = model.hash_hex().unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(create_test_model().hash_hex().unwrap(), hash);
    }

    #[test]
    fn test_logistic() {
        assert!((logistic(0, SCALE) - 0.5).abs() < 1e-12);
        assert!((logistic(SCALE, SCALE) - 0.731_058_578_6).abs() < 1e-9);
        assert!((logistic(-SCALE, SCALE) + logistic(SCALE, SCALE) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_model_validation() {
        let mut invalid = create_test_model();
        invalid.scale = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.version = 999;
        assert!(invalid.validate().is_err());
    }
}
