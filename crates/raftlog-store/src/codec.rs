//! Log entry serialization
//!
//! The store never interprets entry bytes itself; it hands them to an
//! [`EntryCodec`]. [`BincodeCodec`] is the default.

use raftlog_common::LogEntry;
use thiserror::Error;

/// Error raised by an entry codec
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("{0}")]
    Custom(String),
}

/// Reversible serialization of a single log entry
pub trait EntryCodec: Send + Sync {
    /// Serialize an entry
    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>, CodecError>;

    /// Deserialize an entry
    fn decode(&self, bytes: &[u8]) -> Result<LogEntry, CodecError>;
}

/// bincode-encoded entries
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl EntryCodec for BincodeCodec {
    fn encode(&self, entry: &LogEntry) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(entry)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<LogEntry, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
