//! Error types for raftlog storage
//!
//! `StoreError` is what callers see. Engine failures keep the name of the
//! public operation that hit them; everything else keeps its cause.

use crate::codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for log and stable store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("log not found: index {0}")]
    LogNotFound(u64),

    #[error("key not found: {}", String::from_utf8_lossy(.key))]
    KeyNotFound { key: Vec<u8> },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to encode log entry {index}: {source}")]
    Encode {
        index: u64,
        #[source]
        source: CodecError,
    },

    #[error("{op} failed: {source}")]
    Engine {
        op: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("store initialization failed: {0}")]
    Init(#[from] InitError),

    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Attach the operation name to an engine error.
    ///
    /// A closed engine surfaces as [`StoreError::Closed`] no matter which
    /// operation noticed it.
    pub(crate) fn engine(op: &'static str) -> impl FnOnce(EngineError) -> Self {
        move |source| match source {
            EngineError::Closed => Self::Closed,
            source => Self::Engine { op, source },
        }
    }

    /// Check if this is either not-found error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::LogNotFound(_) | Self::KeyNotFound { .. })
    }

    /// Check if a log index was missing
    #[must_use]
    pub const fn is_log_not_found(&self) -> bool {
        matches!(self, Self::LogNotFound(_))
    }

    /// Check if a stable store key was never set
    #[must_use]
    pub const fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }
}

/// Stored bytes that could not be parsed
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid fixed-width integer: expected 8 bytes, got {actual}")]
    IndexLength { actual: usize },

    #[error("key does not belong to the {namespace} namespace")]
    ForeignKey { namespace: &'static str },

    #[error("failed to decode log entry {index}: {source}")]
    Entry {
        index: u64,
        #[source]
        source: CodecError,
    },
}

/// Failure from the underlying key-value engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("redb error: {0}")]
    Database(#[from] redb::DatabaseError),
    #[error("redb storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("redb table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("redb transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
    #[error("redb commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("engine error: {0}")]
    Backend(String),
    #[error("engine is closed")]
    Closed,
}

impl From<redb::TransactionError> for EngineError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Transaction(Box::new(e))
    }
}

/// Failure while bringing a store up
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open engine at {}: {source}", .path.display())]
    OpenEngine {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
}
