//! Transaction gateway
//!
//! Wraps one engine transaction for the duration of one public operation.
//! Engine errors come out as [`StoreError`] tagged with that operation's
//! name. Dropping a `Txn` discards it.

use crate::engine::{KvRead, KvWrite, ScanControl, ScanDirection};
use crate::error::{StoreError, StoreResult};

/// A transaction scoped to a single store operation
pub(crate) struct Txn<T> {
    inner: T,
    op: &'static str,
}

impl<T> Txn<T> {
    pub(crate) const fn new(inner: T, op: &'static str) -> Self {
        Self { inner, op }
    }
}

impl<T: KvRead> Txn<T> {
    pub(crate) fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key).map_err(StoreError::engine(self.op))
    }

    pub(crate) fn scan_keys(
        &self,
        prefix: &[u8],
        seek: &[u8],
        direction: ScanDirection,
        mut visit: impl FnMut(&[u8]) -> ScanControl,
    ) -> StoreResult<()> {
        self.inner
            .scan_keys(prefix, seek, direction, &mut visit)
            .map_err(StoreError::engine(self.op))
    }

    /// First key seen by a scan, if any
    pub(crate) fn first_key(
        &self,
        prefix: &[u8],
        seek: &[u8],
        direction: ScanDirection,
    ) -> StoreResult<Option<Vec<u8>>> {
        let mut found = None;
        self.scan_keys(prefix, seek, direction, |key| {
            found = Some(key.to_vec());
            ScanControl::Stop
        })?;
        Ok(found)
    }
}

impl<T: KvWrite> Txn<T> {
    pub(crate) fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.inner.set(key, value).map_err(StoreError::engine(self.op))
    }

    pub(crate) fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.inner.delete(key).map_err(StoreError::engine(self.op))
    }

    pub(crate) fn commit(self) -> StoreResult<()> {
        let op = self.op;
        self.inner.commit().map_err(StoreError::engine(op))
    }
}
