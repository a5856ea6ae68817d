//! raftlog Common - Shared types and configuration
//!
//! This crate provides the log entry model and the store configuration
//! used by the storage crate and the admin CLI.

pub mod config;
pub mod types;

pub use config::{StoreConfig, SyncMode};
pub use types::{EntryKind, LogEntry};
