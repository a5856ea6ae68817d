//! raftlog Store - durable storage for a Raft log
//!
//! This crate turns an ordered, transactional key-value engine into the two
//! capability sets a Raft engine persists through: an append-only
//! [`LogStore`] and a [`StableStore`] for term, vote and configuration
//! values.
//!
//! # Layout
//!
//! Both stores share one flat keyspace. Each logical keyspace gets a fixed
//! four byte prefix:
//!
//! ```text
//! logs ++ be_u64(index)   ->  encoded LogEntry
//! conf ++ raw key bytes   ->  raw value (or be_u64 for u64 values)
//! ```
//!
//! Big-endian indices make byte order equal numeric order, so first/last
//! index lookups are a single forward or reverse prefix scan.
//!
//! Every public operation runs inside exactly one engine transaction.

pub mod codec;
pub mod engine;
pub mod error;
mod gateway;
pub mod keys;
pub mod log;
pub mod stable;
pub mod store;
mod tables;

// Re-exports
pub use codec::{BincodeCodec, CodecError, EntryCodec};
pub use engine::{KvEngine, KvRead, KvWrite, MemoryEngine, RedbEngine, ScanControl, ScanDirection};
pub use error::{DecodeError, EngineError, InitError, StoreError, StoreResult};
pub use keys::Namespace;
pub use log::LogStore;
pub use raftlog_common::{EntryKind, LogEntry, StoreConfig, SyncMode};
pub use stable::StableStore;
pub use store::RaftStore;
