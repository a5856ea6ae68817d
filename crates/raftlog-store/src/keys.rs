//! Key encoding for the flat engine keyspace
//!
//! Keys are designed for efficient prefix scanning:
//! - Log keys: `logs{be_u64 index}`
//! - Stable keys: `conf{raw key}`
//!
//! Every encoder returns a freshly allocated buffer; prefixes are static and
//! never extended in place.

use crate::error::DecodeError;
use std::fmt;

/// Width of an encoded index or u64 value
pub const INDEX_WIDTH: usize = 8;

/// Logical keyspace multiplexed into the engine keyspace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Log entries, keyed by index
    Logs,
    /// Stable store values, keyed by caller bytes
    Conf,
}

impl Namespace {
    /// Fixed key prefix. Both are four bytes with distinct first bytes.
    #[must_use]
    pub const fn prefix(self) -> &'static [u8] {
        match self {
            Self::Logs => b"logs",
            Self::Conf => b"conf",
        }
    }

    /// Namespace name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Logs => "logs",
            Self::Conf => "conf",
        }
    }

    /// Remove this namespace's prefix, or `None` if the key belongs elsewhere
    #[must_use]
    pub fn strip(self, key: &[u8]) -> Option<&[u8]> {
        key.strip_prefix(self.prefix())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-width big-endian form of a u64
#[must_use]
pub const fn encode_index(index: u64) -> [u8; INDEX_WIDTH] {
    index.to_be_bytes()
}

/// Inverse of [`encode_index`]; input must be exactly eight bytes
pub fn decode_index(bytes: &[u8]) -> Result<u64, DecodeError> {
    <[u8; INDEX_WIDTH]>::try_from(bytes)
        .map(u64::from_be_bytes)
        .map_err(|_| DecodeError::IndexLength {
            actual: bytes.len(),
        })
}

/// `prefix ++ be_u64(index)`; byte order matches numeric order
#[must_use]
pub fn encode_index_key(namespace: Namespace, index: u64) -> Vec<u8> {
    let prefix = namespace.prefix();
    let mut key = Vec::with_capacity(prefix.len() + INDEX_WIDTH);
    key.extend_from_slice(prefix);
    key.extend_from_slice(&encode_index(index)); // Big-endian for sorting
    key
}

/// `prefix ++ raw`, raw bytes unchanged
#[must_use]
pub fn encode_raw_key(namespace: Namespace, raw: &[u8]) -> Vec<u8> {
    let prefix = namespace.prefix();
    let mut key = Vec::with_capacity(prefix.len() + raw.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(raw);
    key
}

/// Parse the index out of a full engine key
pub fn decode_index_key(namespace: Namespace, key: &[u8]) -> Result<u64, DecodeError> {
    let suffix = namespace.strip(key).ok_or(DecodeError::ForeignKey {
        namespace: namespace.name(),
    })?;
    decode_index(suffix)
}
