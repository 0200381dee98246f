//! Error types for the conversation history store.

use thiserror::Error;

use crate::history::core::ids::ConversationId;

/// Conversation store error type.
///
/// Lookups by an unknown session are not errors: they return an empty
/// sequence or `None`. Duplicate creation is not an error either.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller input was rejected before any mutation (bad role, empty field).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A message was addressed to a conversation that does not exist.
    #[error("conversation {0} does not exist")]
    ReferentialIntegrity(ConversationId),
    /// The store handle was used after `close`.
    #[error("conversation store is closed")]
    UseAfterClose,
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A stored row could not be decoded.
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// Metadata encoding error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
