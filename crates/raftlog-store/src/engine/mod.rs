//! Ordered key-value engine capability
//!
//! The stores only need a small slice of an embedded engine: scoped read
//! and write transactions with point get/set/delete and key-only prefix
//! scans. Two engines implement it:
//!
//! - [`RedbEngine`]: on-disk, ACID, MVCC readers and a single writer
//! - [`MemoryEngine`]: copy-on-write `BTreeMap`, for tests and ephemeral nodes
//!
//! # Transaction scope
//!
//! A transaction is a value. `commit` consumes a write transaction; dropping
//! any transaction without committing discards it. Error paths therefore
//! release engine resources without extra bookkeeping.

mod memory;
mod redb_engine;

pub use memory::MemoryEngine;
pub use redb_engine::RedbEngine;

use crate::error::EngineError;

/// Direction of a prefix scan
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanDirection {
    /// Ascending from the first key `>= seek`
    Forward,
    /// Descending from the last key `<= seek`
    Reverse,
}

/// Visitor decision after seeing a key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// Operations available in every transaction
pub trait KvRead {
    /// Point lookup
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError>;

    /// Visit keys starting at `seek` in `direction` while they carry `prefix`.
    ///
    /// Values are never read. The scan ends when a key leaves the prefix,
    /// the keyspace is exhausted, or `visit` returns [`ScanControl::Stop`].
    fn scan_keys(
        &self,
        prefix: &[u8],
        seek: &[u8],
        direction: ScanDirection,
        visit: &mut dyn FnMut(&[u8]) -> ScanControl,
    ) -> Result<(), EngineError>;
}

/// Operations only available in write transactions
pub trait KvWrite: KvRead {
    /// Stage a write
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError>;

    /// Stage a delete. Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), EngineError>;

    /// Make every staged change durable and visible at once
    fn commit(self) -> Result<(), EngineError>;
}

/// Embedded ordered key-value engine
pub trait KvEngine: Send + Sync {
    type ReadTxn<'a>: KvRead
    where
        Self: 'a;
    type WriteTxn<'a>: KvWrite
    where
        Self: 'a;

    /// Begin a read-only snapshot transaction
    fn begin_read(&self) -> Result<Self::ReadTxn<'_>, EngineError>;

    /// Begin a read-write transaction. The engine serializes writers.
    fn begin_write(&self) -> Result<Self::WriteTxn<'_>, EngineError>;

    /// Close the connection. Later calls fail with [`EngineError::Closed`].
    ///
    /// May block until transactions held by other threads end; a thread
    /// holding a transaction of its own must drop it first.
    fn close(&self) -> Result<(), EngineError>;
}

/// Does `key` fall inside `prefix`?
pub(crate) fn valid_for_prefix(key: &[u8], prefix: &[u8]) -> bool {
    key.starts_with(prefix)
}
