//! In-memory engine.
//!
//! Readers take an `Arc` snapshot of the map; a writer holds the writer
//! mutex for its whole lifetime, edits a private copy and swaps it in on
//! commit. That gives the same isolation shape as redb: snapshot reads that
//! never block, one writer at a time, all-or-nothing commits.

use super::{KvEngine, KvRead, KvWrite, ScanControl, ScanDirection, valid_for_prefix};
use crate::error::EngineError;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// Volatile engine for tests and ephemeral nodes
pub struct MemoryEngine {
    /// Committed state; `None` once closed
    state: RwLock<Option<Arc<Map>>>,
    writer: Mutex<()>,
    fail_next_commit: AtomicBool,
}

impl MemoryEngine {
    /// Create an empty engine
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Some(Arc::new(Map::new()))),
            writer: Mutex::new(()),
            fail_next_commit: AtomicBool::new(false),
        }
    }

    /// Make the next commit fail with [`EngineError::Backend`] and change nothing
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of committed keys across all namespaces
    pub fn len(&self) -> usize {
        self.state.read().as_ref().map_or(0, |map| map.len())
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Result<Arc<Map>, EngineError> {
        self.state.read().clone().ok_or(EngineError::Closed)
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KvEngine for MemoryEngine {
    type ReadTxn<'a>
        = MemoryReadTxn
    where
        Self: 'a;
    type WriteTxn<'a>
        = MemoryWriteTxn<'a>
    where
        Self: 'a;

    fn begin_read(&self) -> Result<MemoryReadTxn, EngineError> {
        Ok(MemoryReadTxn {
            map: self.snapshot()?,
        })
    }

    fn begin_write(&self) -> Result<MemoryWriteTxn<'_>, EngineError> {
        let guard = self.writer.lock();
        // Snapshot after taking the writer lock so no commit is missed
        let working = Map::clone(&*self.snapshot()?);
        Ok(MemoryWriteTxn {
            engine: self,
            _writer: guard,
            working,
        })
    }

    fn close(&self) -> Result<(), EngineError> {
        self.state
            .write()
            .take()
            .map(drop)
            .ok_or(EngineError::Closed)
    }
}

/// Snapshot read transaction
pub struct MemoryReadTxn {
    map: Arc<Map>,
}

impl KvRead for MemoryReadTxn {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.map.get(key).cloned())
    }

    fn scan_keys(
        &self,
        prefix: &[u8],
        seek: &[u8],
        direction: ScanDirection,
        visit: &mut dyn FnMut(&[u8]) -> ScanControl,
    ) -> Result<(), EngineError> {
        scan_map(&self.map, prefix, seek, direction, visit);
        Ok(())
    }
}

/// Write transaction over a private copy of the map
pub struct MemoryWriteTxn<'a> {
    engine: &'a MemoryEngine,
    _writer: MutexGuard<'a, ()>,
    working: Map,
}

impl KvRead for MemoryWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        Ok(self.working.get(key).cloned())
    }

    fn scan_keys(
        &self,
        prefix: &[u8],
        seek: &[u8],
        direction: ScanDirection,
        visit: &mut dyn FnMut(&[u8]) -> ScanControl,
    ) -> Result<(), EngineError> {
        scan_map(&self.working, prefix, seek, direction, visit);
        Ok(())
    }
}

impl KvWrite for MemoryWriteTxn<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        self.working.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), EngineError> {
        self.working.remove(key);
        Ok(())
    }

    fn commit(self) -> Result<(), EngineError> {
        if self.engine.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(EngineError::Backend("injected commit failure".to_string()));
        }
        let mut state = self.engine.state.write();
        match state.as_mut() {
            Some(current) => {
                *current = Arc::new(self.working);
                Ok(())
            }
            None => Err(EngineError::Closed),
        }
    }
}

fn scan_map(
    map: &Map,
    prefix: &[u8],
    seek: &[u8],
    direction: ScanDirection,
    visit: &mut dyn FnMut(&[u8]) -> ScanControl,
) {
    let keys: Box<dyn Iterator<Item = &Vec<u8>> + '_> = match direction {
        ScanDirection::Forward => Box::new(
            map.range::<[u8], _>((Bound::Included(seek), Bound::Unbounded))
                .map(|(k, _)| k),
        ),
        ScanDirection::Reverse => Box::new(
            map.range::<[u8], _>((Bound::Unbounded, Bound::Included(seek)))
                .rev()
                .map(|(k, _)| k),
        ),
    };
    for key in keys {
        if !valid_for_prefix(key, prefix) || visit(key) == ScanControl::Stop {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn keys_from(
        engine: &MemoryEngine,
        prefix: &[u8],
        seek: &[u8],
        dir: ScanDirection,
    ) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        engine
            .begin_read()
            .unwrap()
            .scan_keys(prefix, seek, dir, &mut |k| {
                keys.push(k.to_vec());
                ScanControl::Continue
            })
            .unwrap();
        keys
    }

    #[test]
    fn test_commit_publishes_all_writes() {
        let engine = MemoryEngine::new();

        let mut txn = engine.begin_write().unwrap();
        txn.set(b"k1", b"v1").unwrap();
        txn.set(b"k2", b"v2").unwrap();
        txn.delete(b"missing").unwrap();
        txn.commit().unwrap();

        let read = engine.begin_read().unwrap();
        assert_eq!(read.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(read.get(b"k2").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_writer_starts_from_committed_state() {
        let engine = MemoryEngine::new();

        let mut txn = engine.begin_write().unwrap();
        txn.set(b"k1", b"v1").unwrap();
        txn.commit().unwrap();

        let mut txn = engine.begin_write().unwrap();
        assert_eq!(txn.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        txn.set(b"k2", b"v2").unwrap();
        txn.commit().unwrap();

        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_reader_keeps_its_snapshot() {
        let engine = MemoryEngine::new();
        let before = engine.begin_read().unwrap();

        let mut txn = engine.begin_write().unwrap();
        txn.set(b"k", b"v").unwrap();
        txn.commit().unwrap();

        assert_eq!(before.get(b"k").unwrap(), None);
        assert_eq!(
            engine.begin_read().unwrap().get(b"k").unwrap(),
            Some(b"v".to_vec())
        );
    }

    #[test]
    fn test_dropped_or_failed_write_changes_nothing() {
        let engine = MemoryEngine::new();

        {
            let mut txn = engine.begin_write().unwrap();
            txn.set(b"dropped", b"v").unwrap();
        }

        engine.fail_next_commit();
        let mut txn = engine.begin_write().unwrap();
        txn.set(b"failed", b"v").unwrap();
        assert!(matches!(txn.commit(), Err(EngineError::Backend(_))));

        assert!(engine.is_empty());

        // Only one commit fails
        let mut txn = engine.begin_write().unwrap();
        txn.set(b"ok", b"v").unwrap();
        txn.commit().unwrap();
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_scan_directions() {
        let engine = MemoryEngine::new();
        let mut txn = engine.begin_write().unwrap();
        for key in [b"a1", b"b1", b"b2", b"c1"] {
            txn.set(key, b"").unwrap();
        }
        txn.commit().unwrap();

        assert_eq!(
            keys_from(&engine, b"b", b"b", ScanDirection::Forward),
            vec![b"b1".to_vec(), b"b2".to_vec()]
        );
        assert_eq!(
            keys_from(&engine, b"b", b"b\xff", ScanDirection::Reverse),
            vec![b"b2".to_vec(), b"b1".to_vec()]
        );
        // Reverse seek below the prefix sees nothing
        assert!(keys_from(&engine, b"b", b"a9", ScanDirection::Reverse).is_empty());
    }

    #[test]
    fn test_writers_are_serialized() {
        let engine = Arc::new(MemoryEngine::new());

        let handles: Vec<_> = (0u8..8)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0u8..25 {
                        let mut txn = engine.begin_write().unwrap();
                        txn.set(&[t, i], b"").unwrap();
                        txn.commit().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // No lost updates
        assert_eq!(engine.len(), 200);
    }

    #[test]
    fn test_close() {
        let engine = MemoryEngine::new();
        engine.close().unwrap();
        assert!(matches!(engine.begin_read(), Err(EngineError::Closed)));
        assert!(matches!(engine.begin_write(), Err(EngineError::Closed)));
        assert!(matches!(engine.close(), Err(EngineError::Closed)));
    }
}
