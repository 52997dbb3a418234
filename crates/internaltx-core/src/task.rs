//! The task contract consumed by the outer scheduler.

use async_trait::async_trait;
use fvm_shared::clock::ChainEpoch;
use tokio_util::sync::CancellationToken;

use crate::chain::ChainReader;
use crate::error::TaskError;
use crate::store::{RecordKind, VersionedStore};
use crate::types::TipsetRef;

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Genesis has no parent; nothing to do.
    Genesis,
    /// Output for `(height, version)` already exists and the run was not forced.
    AlreadyProcessed { height: ChainEpoch },
    /// Extraction finished. `records == 0` means nothing was written.
    Extracted {
        height: ChainEpoch,
        records: usize,
        duplicates: usize,
    },
}

/// A per-tipset processing stage.
#[async_trait]
pub trait Task: Send + Sync {
    /// Stable identifier, also used as the storage kind name.
    fn name(&self) -> &str;

    /// Persisted record shape.
    fn record_kind(&self) -> RecordKind;

    /// Process `tipset` at processing `version`.
    ///
    /// Unless `force` is set, a `(height, version)` that already holds output
    /// is skipped. Returns only after all in-flight work has settled.
    async fn run(
        &self,
        cancel: &CancellationToken,
        chain: &dyn ChainReader,
        version: u32,
        tipset: &TipsetRef,
        force: bool,
        store: &dyn VersionedStore,
    ) -> Result<RunOutcome, TaskError>;
}
