//! Deterministic GBDT inference engine
//!
//! Trees split on integer features with `feature <= threshold`; thresholds,
//! leaves, tree weights and the bias are fixed-point integers at [`SCALE`].
//! For the delay classifier every feature is a 0/1 indicator and the score
//! is a log-odds margin.
//!
//! Models serialize to canonical JSON (sorted keys) and hash with BLAKE3, so
//! two identical training runs produce byte-identical artifacts.

pub mod model;
pub mod tree;

pub use model::{logistic, Classifier, Model, ModelError, SCALE};
pub use tree::{Node, Tree};
