//! Error types for the Sagitta library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`SagittaError`] enum. Ranking-model lifecycle violations (scoring before
//! fitting, searching before the engine is ready, loading a model that was
//! never saved) get dedicated variants so callers can match on them.
//!
//! Arithmetic edge cases are deliberately *not* errors: a zero-magnitude
//! document vector, a constant score vector, or a query with no judged
//! documents all evaluate to 0.0 so that metric aggregation stays total over
//! every query.

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for Sagitta operations.
#[derive(Error, Debug)]
pub enum SagittaError {
    /// The corpus contains zero documents.
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    /// A model was asked to score before being fitted or loaded.
    #[error("Model not fitted: {0}")]
    ModelNotFitted(String),

    /// The engine was asked to search before both models were ready.
    #[error("Engine not ready: {0}")]
    EngineNotReady(String),

    /// Score vectors over different document sets were fused.
    #[error("Mismatched keys: {0}")]
    MismatchedKeys(String),

    /// No persisted model state exists under the requested name.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Text analysis errors (tokenization, normalization).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid argument supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Binary serialization errors from persisted model state.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SagittaError.
pub type Result<T> = std::result::Result<T, SagittaError>;

impl SagittaError {
    /// Create a new empty-corpus error.
    pub fn empty_corpus<S: Into<String>>(msg: S) -> Self {
        SagittaError::EmptyCorpus(msg.into())
    }

    /// Create a new model-not-fitted error.
    pub fn not_fitted<S: Into<String>>(msg: S) -> Self {
        SagittaError::ModelNotFitted(msg.into())
    }

    /// Create a new engine-not-ready error.
    pub fn not_ready<S: Into<String>>(msg: S) -> Self {
        SagittaError::EngineNotReady(msg.into())
    }

    /// Create a new mismatched-keys error.
    pub fn mismatched_keys<S: Into<String>>(msg: S) -> Self {
        SagittaError::MismatchedKeys(msg.into())
    }

    /// Create a new model-not-found error.
    pub fn model_not_found<S: Into<String>>(msg: S) -> Self {
        SagittaError::ModelNotFound(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        SagittaError::Analysis(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        SagittaError::Storage(msg.into())
    }

    /// Create a new invalid-argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SagittaError::InvalidArgument(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        SagittaError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SagittaError::Other(msg.into())
    }
}
