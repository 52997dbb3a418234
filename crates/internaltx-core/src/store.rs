//! Versioned record storage contract.
//!
//! Output of a task is keyed by `(kind, height, version)`. A store must be able
//! to answer whether a key already holds data and to replace everything under
//! a key in one atomic step, so a re-run never leaves a union of two attempts.

use async_trait::async_trait;
use fvm_shared::clock::ChainEpoch;

use crate::error::TaskError;
use crate::record::InternalTransaction;

/// A column of a persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self { name, sql_type }
    }
}

/// Describes the persisted shape of a record: table name plus ordered columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordKind {
    pub name: &'static str,
    pub columns: &'static [Column],
}

/// Idempotent, versioned persistence.
///
/// Implementations include `MemoryVersionedStore` and, behind the `sqlite`
/// feature of `internaltx-storage`, `SqliteVersionedStore`.
#[async_trait]
pub trait VersionedStore: Send + Sync {
    /// Returns `true` if any record exists for `(kind, height, version)`.
    async fn existed(
        &self,
        kind: &RecordKind,
        height: ChainEpoch,
        version: u32,
    ) -> Result<bool, TaskError>;

    /// Atomically delete everything under `(kind, height, version)` and write
    /// `records` in its place.
    async fn replace_version(
        &self,
        kind: &RecordKind,
        height: ChainEpoch,
        version: u32,
        records: &[InternalTransaction],
    ) -> Result<(), TaskError>;
}

// ─── In-memory store ──────────────────────────────────────────────────────────

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type Key = (&'static str, ChainEpoch, u32);

/// In-memory versioned store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryVersionedStore {
    data: Mutex<HashMap<Key, Vec<InternalTransaction>>>,
}

impl MemoryVersionedStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Key, Vec<InternalTransaction>>>, TaskError> {
        self.data
            .lock()
            .map_err(|_| TaskError::storage("lock", "memory store mutex poisoned"))
    }

    /// Records stored under a key, if any.
    pub fn records(
        &self,
        kind: &RecordKind,
        height: ChainEpoch,
        version: u32,
    ) -> Result<Option<Vec<InternalTransaction>>, TaskError> {
        Ok(self.lock()?.get(&(kind.name, height, version)).cloned())
    }

    /// Total records across all keys.
    pub fn len(&self) -> Result<usize, TaskError> {
        Ok(self.lock()?.values().map(Vec::len).sum())
    }

    pub fn is_empty(&self) -> Result<bool, TaskError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl VersionedStore for MemoryVersionedStore {
    async fn existed(
        &self,
        kind: &RecordKind,
        height: ChainEpoch,
        version: u32,
    ) -> Result<bool, TaskError> {
        Ok(self
            .lock()?
            .get(&(kind.name, height, version))
            .is_some_and(|records| !records.is_empty()))
    }

    async fn replace_version(
        &self,
        kind: &RecordKind,
        height: ChainEpoch,
        version: u32,
        records: &[InternalTransaction],
    ) -> Result<(), TaskError> {
        let mut data = self.lock()?;
        if records.is_empty() {
            data.remove(&(kind.name, height, version));
        } else {
            data.insert((kind.name, height, version), records.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIND: RecordKind = InternalTransaction::KIND;

    fn rec(height: ChainEpoch, version: u32, hash: &str) -> InternalTransaction {
        InternalTransaction {
            height,
            version,
            hash: hash.into(),
            parent_hash: "0xparent".into(),
            from: "0xfrom".into(),
            to: "0xto".into(),
            tx_type: 0,
            value: "0".into(),
        }
    }

    #[tokio::test]
    async fn existed_tracks_height_and_version() {
        let store = MemoryVersionedStore::new();
        assert!(!store.existed(&KIND, 99, 1).await.unwrap());

        store.replace_version(&KIND, 99, 1, &[rec(99, 1, "0xa")]).await.unwrap();

        assert!(store.existed(&KIND, 99, 1).await.unwrap());
        assert!(!store.existed(&KIND, 99, 2).await.unwrap());
        assert!(!store.existed(&KIND, 100, 1).await.unwrap());
    }

    #[tokio::test]
    async fn replace_drops_previous_attempt() {
        let store = MemoryVersionedStore::new();
        store
            .replace_version(&KIND, 99, 1, &[rec(99, 1, "0xa"), rec(99, 1, "0xb")])
            .await
            .unwrap();
        store.replace_version(&KIND, 99, 1, &[rec(99, 1, "0xc")]).await.unwrap();

        let stored = store.records(&KIND, 99, 1).unwrap().unwrap();
        assert_eq!(stored, vec![rec(99, 1, "0xc")]);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn versions_are_isolated() {
        let store = MemoryVersionedStore::new();
        store.replace_version(&KIND, 99, 1, &[rec(99, 1, "0xa")]).await.unwrap();
        store.replace_version(&KIND, 99, 2, &[rec(99, 2, "0xb")]).await.unwrap();
        store.replace_version(&KIND, 99, 2, &[rec(99, 2, "0xc")]).await.unwrap();

        assert_eq!(store.records(&KIND, 99, 1).unwrap().unwrap()[0].hash, "0xa");
        assert_eq!(store.records(&KIND, 99, 2).unwrap().unwrap()[0].hash, "0xc");
    }
}
