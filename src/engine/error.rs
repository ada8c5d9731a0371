//! Engine error types
//!
//! Every failure is terminal for the query: no partial result, no retry,
//! no recovery path inside the engine.

use thiserror::Error;

/// Errors produced by query evaluation
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed query shape, unknown/misused field, illegal wildcard
    /// placement, or mixed-dataset reference
    #[error("Invalid query: {0}")]
    Validation(String),

    /// The dataset named by the query does not exist
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// More than the allowed number of entries survived the WHERE clause
    #[error("Query returned more than {} results", crate::engine::MAX_RESULTS)]
    ResultTooLarge,
}

impl EngineError {
    /// Shorthand for a validation failure
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
