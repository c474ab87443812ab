//! Error types for the threat cache.

use crate::types::{RecordId, Verb};
use thiserror::Error;

/// Main error type for store operations.
///
/// Store-integrity codes and empty write replies are not errors; they are
/// reported through [`CommandOutcome`](crate::store::CommandOutcome).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Malformed name map on threat type {id}: {source}")]
    NameDecode {
        id: RecordId,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected reply to {verb}: {detail}")]
    UnexpectedReply { verb: Verb, detail: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
