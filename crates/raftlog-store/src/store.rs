//! Store handle and lifecycle.
//!
//! `RaftStore` owns the engine connection and the entry codec. It holds no
//! other state: every operation opens its own engine transaction, so
//! concurrent callers are isolated by the engine alone.

use crate::codec::{BincodeCodec, EntryCodec};
use crate::engine::{KvEngine, RedbEngine};
use crate::error::{InitError, StoreError, StoreResult};
use crate::gateway::Txn;
use raftlog_common::StoreConfig;
use std::fs::DirBuilder;
use std::path::{Path, PathBuf};
use tracing::info;

/// Raft log and stable store over an ordered key-value engine
pub struct RaftStore<E = RedbEngine, C = BincodeCodec> {
    engine: E,
    pub(crate) codec: C,
    path: Option<PathBuf>,
}

impl RaftStore {
    /// Open (or create) a redb-backed store with the default codec
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Self::open_with_codec(config, BincodeCodec)
    }

    /// Open a store in `path` with default settings; data and value
    /// directories are both `path`
    pub fn open_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open(&StoreConfig::with_dir(path))
    }
}

impl<C: EntryCodec> RaftStore<RedbEngine, C> {
    /// Open (or create) a redb-backed store with a custom entry codec.
    ///
    /// Directories are provisioned before the engine is opened. Nothing is
    /// returned on failure, so no half-initialized store is ever visible.
    pub fn open_with_codec(config: &StoreConfig, codec: C) -> StoreResult<Self> {
        for dir in config.required_dirs() {
            create_dir(dir)?;
        }

        let db_path = config.db_path();
        let engine = RedbEngine::from_config(config).map_err(|source| InitError::OpenEngine {
            path: db_path.clone(),
            source,
        })?;

        info!("Opened raft store at {:?}", db_path);
        Ok(Self {
            engine,
            codec,
            path: Some(config.dir.clone()),
        })
    }
}

impl<E: KvEngine, C: EntryCodec> RaftStore<E, C> {
    /// Assemble a store over an already-open engine
    pub const fn with_engine(engine: E, codec: C) -> Self {
        Self {
            engine,
            codec,
            path: None,
        }
    }

    /// Data directory, for disk-backed stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) const fn engine(&self) -> &E {
        &self.engine
    }

    /// Close the engine connection.
    ///
    /// Waits for a write that is already in flight on another thread to
    /// finish. Every later call, including a second `close`, fails with
    /// [`StoreError::Closed`].
    pub fn close(&self) -> StoreResult<()> {
        self.engine.close().map_err(StoreError::engine("close"))?;
        info!("Closed raft store");
        Ok(())
    }

    pub(crate) fn begin_read(&self, op: &'static str) -> StoreResult<Txn<E::ReadTxn<'_>>> {
        let txn = self.engine.begin_read().map_err(StoreError::engine(op))?;
        Ok(Txn::new(txn, op))
    }

    pub(crate) fn begin_write(&self, op: &'static str) -> StoreResult<Txn<E::WriteTxn<'_>>> {
        let txn = self.engine.begin_write().map_err(StoreError::engine(op))?;
        Ok(Txn::new(txn, op))
    }
}

/// Create `path` and its parents, owner-only on unix
fn create_dir(path: &Path) -> Result<(), InitError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path).map_err(|source| InitError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_directories() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("nested/raft");
        let value_dir = dir.path().join("values");
        let config = StoreConfig {
            value_dir: Some(value_dir.clone()),
            ..StoreConfig::with_dir(&data_dir)
        };

        let store = RaftStore::open(&config).unwrap();

        assert!(data_dir.is_dir());
        assert!(value_dir.is_dir());
        assert!(data_dir.join("raft.redb").is_file());
        assert_eq!(store.path(), Some(data_dir.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_open_creates_private_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("raft");
        RaftStore::open_path(&data_dir).unwrap();

        let mode = std::fs::metadata(&data_dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_open_fails_when_directory_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = RaftStore::open_path(blocker.join("raft")).err().unwrap();
        assert!(matches!(err, StoreError::Init(InitError::CreateDir { .. })));
    }

    #[test]
    fn test_open_fails_on_corrupt_database() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("raft.redb"), b"definitely not redb").unwrap();

        let err = RaftStore::open_path(dir.path()).err().unwrap();
        assert!(matches!(err, StoreError::Init(InitError::OpenEngine { .. })));
    }

    #[test]
    fn test_close_twice() {
        let dir = tempdir().unwrap();
        let store = RaftStore::open_path(dir.path()).unwrap();

        store.close().unwrap();
        assert!(matches!(store.close(), Err(StoreError::Closed)));
    }

    #[test]
    fn test_close_waits_for_writer_on_other_thread() {
        use crate::keys::{Namespace, encode_raw_key};
        use crate::stable::StableStore;
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let dir = tempdir().unwrap();
        let store = RaftStore::open_path(dir.path()).unwrap();
        let (staged_tx, staged_rx) = mpsc::channel();

        thread::scope(|s| {
            let writer = s.spawn(|| {
                let mut txn = store.begin_write("set").unwrap();
                txn.set(&encode_raw_key(Namespace::Conf, b"vote"), b"node-a")
                    .unwrap();
                staged_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(200));
                txn.commit()
            });

            staged_rx.recv().unwrap();
            store.close().unwrap();
            assert!(matches!(store.get(b"vote"), Err(StoreError::Closed)));
            writer.join().unwrap().unwrap();
        });

        let store = RaftStore::open_path(dir.path()).unwrap();
        assert_eq!(store.get(b"vote").unwrap(), b"node-a");
    }

    #[test]
    fn test_with_engine_has_no_path() {
        let store = RaftStore::with_engine(MemoryEngine::new(), BincodeCodec);
        assert!(store.path().is_none());
        assert!(store.engine().is_empty());
    }
}
