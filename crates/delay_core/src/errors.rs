//! Error types for the delay core

use thiserror::Error;

/// Errors that can occur while preparing features or fitting a schema
#[derive(Error, Debug)]
pub enum CoreError {
    /// Feature matrix has an inconsistent shape
    #[error("Invalid feature matrix: {0}")]
    InvalidMatrix(String),

    /// Canonical schema is malformed
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Categorical column name not recognised
    #[error("Unknown categorical column: {0}")]
    UnknownColumn(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
