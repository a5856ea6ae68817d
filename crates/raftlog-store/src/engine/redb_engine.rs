//! redb-backed engine.
//!
//! All keys live in the single `kv` table. redb gives readers an MVCC
//! snapshot and serializes writers, which is the isolation the stores rely
//! on. The connection sits behind an `RwLock<Option<_>>` that is only held
//! while a transaction is being started or the database is being closed.

use super::{KvEngine, KvRead, KvWrite, ScanControl, ScanDirection, valid_for_prefix};
use crate::error::EngineError;
use crate::tables;
use parking_lot::RwLock;
use raftlog_common::{StoreConfig, SyncMode};
use redb::{
    AccessGuard, Database, Durability, ReadOnlyTable, ReadTransaction, ReadableTable,
    StorageError, WriteTransaction,
};
use std::path::Path;
use tracing::{debug, info};

type Key = &'static [u8];
type Value = &'static [u8];

/// On-disk engine backed by a redb database file
pub struct RedbEngine {
    db: RwLock<Option<Database>>,
    sync_mode: SyncMode,
}

impl RedbEngine {
    /// Open (or create) the database file at `path`.
    pub fn open(
        path: impl AsRef<Path>,
        cache_size_bytes: usize,
        sync_mode: SyncMode,
    ) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let db = Database::builder()
            .set_cache_size(cache_size_bytes)
            .create(path)?;

        // Create the table eagerly so later read txns don't fail
        let write_txn = db.begin_write()?;
        {
            let _t = write_txn.open_table(tables::KV)?;
        }
        write_txn.commit()?;

        debug!("Opened redb database at {:?}", path);
        Ok(Self {
            db: RwLock::new(Some(db)),
            sync_mode,
        })
    }

    /// Open the database described by a store config
    pub fn from_config(config: &StoreConfig) -> Result<Self, EngineError> {
        Self::open(config.db_path(), config.cache_size_bytes, config.sync_mode)
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.db.read().is_none()
    }

    const fn durability(&self) -> Durability {
        match self.sync_mode {
            SyncMode::Immediate => Durability::Immediate,
            SyncMode::Eventual => Durability::Eventual,
        }
    }
}

impl KvEngine for RedbEngine {
    type ReadTxn<'a>
        = RedbReadTxn
    where
        Self: 'a;
    type WriteTxn<'a>
        = RedbWriteTxn
    where
        Self: 'a;

    fn begin_read(&self) -> Result<RedbReadTxn, EngineError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(EngineError::Closed)?;
        let txn = db.begin_read()?;
        let table = txn.open_table(tables::KV)?;
        Ok(RedbReadTxn { table, _txn: txn })
    }

    fn begin_write(&self) -> Result<RedbWriteTxn, EngineError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(EngineError::Closed)?;
        let mut txn = db.begin_write()?;
        txn.set_durability(self.durability());
        Ok(RedbWriteTxn { txn })
    }

    /// Dropping the database blocks until live transactions end, so the
    /// calling thread must not hold one.
    fn close(&self) -> Result<(), EngineError> {
        let db = self.db.write().take().ok_or(EngineError::Closed)?;
        drop(db);
        info!("Closed redb database");
        Ok(())
    }
}

/// Read-only snapshot
pub struct RedbReadTxn {
    // Dropped before the transaction that owns it
    table: ReadOnlyTable<Key, Value>,
    _txn: ReadTransaction,
}

impl KvRead for RedbReadTxn {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let value = self.table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn scan_keys(
        &self,
        prefix: &[u8],
        seek: &[u8],
        direction: ScanDirection,
        visit: &mut dyn FnMut(&[u8]) -> ScanControl,
    ) -> Result<(), EngineError> {
        scan_table(&self.table, prefix, seek, direction, visit)
    }
}

/// Read-write transaction; aborted by redb if dropped uncommitted
pub struct RedbWriteTxn {
    txn: WriteTransaction,
}

impl KvRead for RedbWriteTxn {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let table = self.txn.open_table(tables::KV)?;
        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn scan_keys(
        &self,
        prefix: &[u8],
        seek: &[u8],
        direction: ScanDirection,
        visit: &mut dyn FnMut(&[u8]) -> ScanControl,
    ) -> Result<(), EngineError> {
        let table = self.txn.open_table(tables::KV)?;
        scan_table(&table, prefix, seek, direction, visit)
    }
}

impl KvWrite for RedbWriteTxn {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        let mut table = self.txn.open_table(tables::KV)?;
        table.insert(key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), EngineError> {
        let mut table = self.txn.open_table(tables::KV)?;
        table.remove(key)?;
        Ok(())
    }

    fn commit(self) -> Result<(), EngineError> {
        self.txn.commit()?;
        Ok(())
    }
}

fn scan_table<T: ReadableTable<Key, Value>>(
    table: &T,
    prefix: &[u8],
    seek: &[u8],
    direction: ScanDirection,
    visit: &mut dyn FnMut(&[u8]) -> ScanControl,
) -> Result<(), EngineError> {
    match direction {
        ScanDirection::Forward => visit_keys(table.range(seek..)?, prefix, visit),
        ScanDirection::Reverse => visit_keys(table.range(..=seek)?.rev(), prefix, visit),
    }
}

fn visit_keys<'a, I>(
    entries: I,
    prefix: &[u8],
    visit: &mut dyn FnMut(&[u8]) -> ScanControl,
) -> Result<(), EngineError>
where
    I: Iterator<Item = Result<(AccessGuard<'a, Key>, AccessGuard<'a, Value>), StorageError>>,
{
    for entry in entries {
        // Only the key guard is touched; the value page is never copied
        let (key, _) = entry?;
        let key = key.value();
        if !valid_for_prefix(key, prefix) || visit(key) == ScanControl::Stop {
            break;
        }
    }
    Ok(())
}
