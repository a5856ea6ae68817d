//! Log store operations over the `logs` namespace.

use crate::codec::EntryCodec;
use crate::engine::{KvEngine, ScanControl, ScanDirection};
use crate::error::{DecodeError, StoreError, StoreResult};
use crate::keys::{Namespace, decode_index_key, encode_index_key};
use crate::store::RaftStore;
use raftlog_common::LogEntry;
use tracing::debug;

/// Append-only storage for replicated log entries
pub trait LogStore {
    /// Lowest stored index, or `0` if the log is empty.
    ///
    /// `0` is also what a log whose only entry is index `0` returns; callers
    /// that store index `0` cannot tell the two apart.
    fn first_index(&self) -> StoreResult<u64>;

    /// Highest stored index, or `0` if the log is empty
    fn last_index(&self) -> StoreResult<u64>;

    /// Entry at `index`, or [`StoreError::LogNotFound`]
    fn get_log(&self, index: u64) -> StoreResult<LogEntry>;

    /// Store a single entry
    fn store_log(&self, entry: &LogEntry) -> StoreResult<()> {
        self.store_logs(std::slice::from_ref(entry))
    }

    /// Store a batch atomically: every entry becomes visible, or none does
    fn store_logs(&self, entries: &[LogEntry]) -> StoreResult<()>;

    /// Delete every entry with `min <= index <= max`
    fn delete_range(&self, min: u64, max: u64) -> StoreResult<()>;
}

impl<E: KvEngine, C: EntryCodec> LogStore for RaftStore<E, C> {
    fn first_index(&self) -> StoreResult<u64> {
        self.boundary_index("first_index", ScanDirection::Forward)
    }

    fn last_index(&self) -> StoreResult<u64> {
        self.boundary_index("last_index", ScanDirection::Reverse)
    }

    fn get_log(&self, index: u64) -> StoreResult<LogEntry> {
        let txn = self.begin_read("get_log")?;
        let bytes = txn
            .get(&encode_index_key(Namespace::Logs, index))?
            .ok_or(StoreError::LogNotFound(index))?;
        let entry = self
            .codec
            .decode(&bytes)
            .map_err(|source| DecodeError::Entry { index, source })?;
        Ok(entry)
    }

    fn store_logs(&self, entries: &[LogEntry]) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        // Any early return drops the txn, which discards everything staged
        let mut txn = self.begin_write("store_logs")?;
        for entry in entries {
            let bytes = self
                .codec
                .encode(entry)
                .map_err(|source| StoreError::Encode {
                    index: entry.index,
                    source,
                })?;
            txn.set(&encode_index_key(Namespace::Logs, entry.index), &bytes)?;
        }
        txn.commit()?;

        debug!(
            count = entries.len(),
            first = entries[0].index,
            last = entries[entries.len() - 1].index,
            "stored log entries"
        );
        Ok(())
    }

    fn delete_range(&self, min: u64, max: u64) -> StoreResult<()> {
        if min > max {
            return Ok(());
        }

        let mut txn = self.begin_write("delete_range")?;

        // Keys are ordered by index, so the scan ends at the first index past max
        let mut doomed = Vec::new();
        let mut corrupt = None;
        txn.scan_keys(
            Namespace::Logs.prefix(),
            &encode_index_key(Namespace::Logs, min),
            ScanDirection::Forward,
            |key| match decode_index_key(Namespace::Logs, key) {
                Ok(index) if index > max => ScanControl::Stop,
                Ok(_) => {
                    doomed.push(key.to_vec());
                    ScanControl::Continue
                }
                Err(e) => {
                    corrupt = Some(e);
                    ScanControl::Stop
                }
            },
        )?;
        if let Some(e) = corrupt {
            return Err(e.into());
        }

        for key in &doomed {
            txn.delete(key)?;
        }
        txn.commit()?;

        debug!(min, max, deleted = doomed.len(), "deleted log range");
        Ok(())
    }
}

impl<E: KvEngine, C: EntryCodec> RaftStore<E, C> {
    /// Index of the first key a key-only scan of `logs` yields in `direction`
    fn boundary_index(&self, op: &'static str, direction: ScanDirection) -> StoreResult<u64> {
        let seek = match direction {
            ScanDirection::Forward => encode_index_key(Namespace::Logs, 0),
            ScanDirection::Reverse => encode_index_key(Namespace::Logs, u64::MAX),
        };
        let txn = self.begin_read(op)?;
        match txn.first_key(Namespace::Logs.prefix(), &seek, direction)? {
            Some(key) => Ok(decode_index_key(Namespace::Logs, &key)?),
            None => Ok(0),
        }
    }
}
