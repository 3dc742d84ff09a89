//! Error types for lectern.

use thiserror::Error;

/// Result type alias using lectern's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used by callers that map failures
/// to response codes without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    ModelInvocation,
    Initialization,
}

/// Core error type for lectern operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document association referenced by a resource id does not exist
    #[error("Document association not found: {0}")]
    AssociationNotFound(i64),

    /// Document referenced by an association does not exist
    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    /// No model registered under the descriptor
    #[error("Model not found: {family}/{name}")]
    ModelNotFound { family: String, name: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Actor lacks a permission or tenant required for the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Model invocation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Model runtime failed to start
    #[error("Initialization error: {0}")]
    Initialization(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::Validation,
            Error::NotFound(_)
            | Error::AssociationNotFound(_)
            | Error::DocumentNotFound(_)
            | Error::ModelNotFound { .. } => ErrorKind::NotFound,
            Error::Forbidden(_) => ErrorKind::Authorization,
            Error::Inference(_) => ErrorKind::ModelInvocation,
            Error::Initialization(_) => ErrorKind::Initialization,
        }
    }
}
