//! Stable store operations over the `conf` namespace.
//!
//! Holds the handful of values Raft must not forget across restarts
//! (current term, last vote, ...).

use crate::codec::EntryCodec;
use crate::engine::KvEngine;
use crate::error::{StoreError, StoreResult};
use crate::keys::{Namespace, decode_index, encode_index, encode_raw_key};
use crate::store::RaftStore;
use tracing::debug;

/// Durable key/value storage for Raft's stable state
pub trait StableStore {
    /// Set `key` to `value`, replacing any previous value
    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Value of `key`, or [`StoreError::KeyNotFound`] if it was never set.
    /// An empty value is a value, not an absence.
    fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>>;

    /// Store a u64 as 8 big-endian bytes
    fn set_u64(&self, key: &[u8], value: u64) -> StoreResult<()> {
        self.set(key, &encode_index(value))
    }

    /// Read a value written by [`StableStore::set_u64`]
    fn get_u64(&self, key: &[u8]) -> StoreResult<u64> {
        let bytes = self.get(key)?;
        Ok(decode_index(&bytes)?)
    }
}

impl<E: KvEngine, C: EntryCodec> StableStore for RaftStore<E, C> {
    fn set(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut txn = self.begin_write("set")?;
        txn.set(&encode_raw_key(Namespace::Conf, key), value)?;
        txn.commit()?;

        debug!(key = %String::from_utf8_lossy(key), len = value.len(), "set stable value");
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Vec<u8>> {
        let txn = self.begin_read("get")?;
        txn.get(&encode_raw_key(Namespace::Conf, key))?
            .ok_or_else(|| StoreError::KeyNotFound { key: key.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BincodeCodec;
    use crate::engine::MemoryEngine;
    use crate::error::DecodeError;
    use crate::log::LogStore;
    use raftlog_common::LogEntry;

    fn memory_store() -> RaftStore<MemoryEngine> {
        RaftStore::with_engine(MemoryEngine::new(), BincodeCodec)
    }

    #[test]
    fn test_set_get_overwrite() {
        let store = memory_store();
        store.set(b"voted_for", b"node-1").unwrap();
        assert_eq!(store.get(b"voted_for").unwrap(), b"node-1");

        store.set(b"voted_for", b"node-2").unwrap();
        assert_eq!(store.get(b"voted_for").unwrap(), b"node-2");
    }

    #[test]
    fn test_never_set_differs_from_empty_value() {
        let store = memory_store();
        assert!(store.get(b"k").unwrap_err().is_key_not_found());

        store.set(b"k", b"").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_u64_uses_index_encoding() {
        let store = memory_store();
        store.set_u64(b"term", 42).unwrap();

        assert_eq!(store.get_u64(b"term").unwrap(), 42);
        assert_eq!(store.get(b"term").unwrap(), 42u64.to_be_bytes());
    }

    #[test]
    fn test_get_u64_rejects_wrong_width() {
        let store = memory_store();
        store.set(b"term", b"abc").unwrap();

        let err = store.get_u64(b"term").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Decode(DecodeError::IndexLength { actual: 3 })
        ));
        assert!(store.get_u64(b"missing").unwrap_err().is_key_not_found());
    }

    #[test]
    fn test_stable_keys_do_not_shadow_logs() {
        let store = memory_store();
        // A stable key that spells out a log key still lives under "conf"
        let mut raw = b"logs".to_vec();
        raw.extend_from_slice(&7u64.to_be_bytes());
        store.set(&raw, b"not a log").unwrap();

        assert!(store.get_log(7).unwrap_err().is_log_not_found());
        assert_eq!(store.last_index().unwrap(), 0);

        store.store_log(&LogEntry::new(7, 1, b"real".to_vec())).unwrap();
        assert_eq!(store.get(&raw).unwrap(), b"not a log");
    }
}
