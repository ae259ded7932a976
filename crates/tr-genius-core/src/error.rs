//! Error types for the core library.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the registry, history and diff components.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A corpus entry with this name is already registered.
    #[error("corpus entry already exists: {0}")]
    DuplicateName(String),

    /// The entry is part of the core reference corpus and cannot be changed.
    #[error("corpus entry is protected: {0}")]
    ProtectedEntry(String),

    /// No corpus entry with this name.
    #[error("corpus entry not found: {0}")]
    EntryNotFound(String),

    /// A snapshot index outside the document's history.
    #[error("snapshot {index} not found (history has {len} entries)")]
    SnapshotNotFound { index: usize, len: usize },

    /// Diff input exceeds the configured token ceiling.
    #[error("diff input has {tokens} tokens, limit is {limit}")]
    DiffTooLarge { tokens: usize, limit: usize },

    /// A persisted value does not match any known schema version.
    #[error("unrecognised schema for key '{key}': {reason}")]
    Schema { key: String, reason: String },

    /// The key-value store failed.
    #[error("store error: {0}")]
    Store(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
