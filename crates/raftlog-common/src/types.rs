//! Core type definitions for raftlog
//!
//! The log entry shape handed to the log store by a Raft engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a replicated log entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Client command applied to the state machine
    #[default]
    Command,
    /// Leader's no-op entry at the start of a term
    Noop,
    /// Legacy single-peer addition
    AddPeer,
    /// Legacy single-peer removal
    RemovePeer,
    /// Barrier ensuring all preceding entries are applied
    Barrier,
    /// Cluster membership configuration
    Configuration,
}

impl EntryKind {
    /// Short lowercase name used in logs and CLI output
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Noop => "noop",
            Self::AddPeer => "add_peer",
            Self::RemovePeer => "remove_peer",
            Self::Barrier => "barrier",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single replicated log entry
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the log
    pub index: u64,
    /// Election term the entry was created in
    pub term: u64,
    /// Entry kind
    pub kind: EntryKind,
    /// Opaque payload
    pub data: Vec<u8>,
    /// Opaque extension bytes carried alongside the payload
    pub extensions: Vec<u8>,
    /// Leader wall-clock time the entry was appended at (unix millis)
    pub appended_at: Option<u64>,
}

impl LogEntry {
    /// Create a command entry
    #[must_use]
    pub fn new(index: u64, term: u64, data: impl Into<Vec<u8>>) -> Self {
        Self {
            index,
            term,
            data: data.into(),
            ..Default::default()
        }
    }

    /// Set the entry kind
    #[must_use]
    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the append timestamp
    #[must_use]
    pub const fn with_appended_at(mut self, millis: u64) -> Self {
        self.appended_at = Some(millis);
        self
    }
}
