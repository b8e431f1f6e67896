//! Chain error types.

use thiserror::Error;

/// Errors that can occur while appending to, reading, or rebuilding a chain.
///
/// Validation failures are not errors: they are reported through
/// [`ValidationReport`](crate::ValidationReport). An `Err` only appears when
/// an operation could not be carried out at all.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Storage error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A JSON value that should be an event was not an object.
    #[error("event must be a JSON object, got {found}")]
    NotAnObject {
        /// The JSON type that was found instead.
        found: &'static str,
    },

    /// Event not found at the requested position.
    #[error("no event at index {index} (chain length {len})")]
    EventNotFound {
        /// Requested index.
        index: usize,
        /// Length of the chain at the time of the lookup.
        len: usize,
    },

    /// A sealed event failed validation and was not persisted.
    #[error("event rejected: {}", errors.join("; "))]
    Rejected {
        /// The validation error codes.
        errors: Vec<String>,
    },

    /// Recomputing the chain failed part-way; nothing was written.
    #[error("recompute failed at index {index}: {reason}")]
    Recompute {
        /// Index of the event that could not be rebuilt.
        index: usize,
        /// Why it failed.
        reason: String,
    },

    /// Crypto error.
    #[error("crypto error: {0}")]
    CryptoError(#[from] truetrace_crypto::CryptoError),
}

impl From<std::io::Error> for ChainError {
    fn from(e: std::io::Error) -> Self {
        Self::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
