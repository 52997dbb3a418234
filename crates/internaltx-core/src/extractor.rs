//! The internal-transaction extractor.
//!
//! # Flow
//!
//! ```text
//! run(tipset)
//!   ├── genesis?                      → Genesis
//!   ├── parent = parent_tipset(tipset)
//!   ├── existed(parent.height, v)?    → AlreadyProcessed   (skipped when forced)
//!   ├── messages = messages(parent)
//!   ├── per message, concurrently:
//!   │     replay ∥ canonical_hash
//!   │     for each sub-call: claim → translate from/to → build record
//!   ├── join all units; first error aborts, nothing written
//!   └── replace_version(parent.height, v, records)   (only if non-empty, not raced
//!                                                      against cancellation)
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use cid::Cid;
use fvm_shared::clock::ChainEpoch;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chain::{AddressTranslator, ChainReader, FilecoinAddressTranslator};
use crate::config::{ExtractorConfig, TraceDepth};
use crate::dedup::SubCallDeduplicator;
use crate::error::TaskError;
use crate::eth::EthHash;
use crate::record::{InternalTransaction, RecordBuilder};
use crate::store::{RecordKind, VersionedStore};
use crate::task::{RunOutcome, Task};
use crate::types::{ChainMessage, SubCall, TipsetRef};

/// Stable task identifier.
pub const TASK_NAME: &str = "evm_internal_tx";

/// Extracts internal transactions from the parent of a tipset.
pub struct InternalTxTask {
    config: ExtractorConfig,
    translator: Arc<dyn AddressTranslator>,
}

/// A record together with the claim that produced it.
struct Claimed {
    cid: Cid,
    message_index: usize,
    record: InternalTransaction,
}

/// Output of one replay unit.
#[derive(Default)]
struct UnitOutput {
    claimed: Vec<Claimed>,
    duplicates: usize,
}

impl InternalTxTask {
    pub fn new(
        config: ExtractorConfig,
        translator: Arc<dyn AddressTranslator>,
    ) -> Result<Self, TaskError> {
        config.validate()?;
        Ok(Self { config, translator })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    async fn extract(
        &self,
        cancel: &CancellationToken,
        chain: &dyn ChainReader,
        version: u32,
        tipset: &TipsetRef,
        force: bool,
        store: &dyn VersionedStore,
    ) -> Result<RunOutcome, TaskError> {
        let kind = InternalTransaction::KIND;

        let parent = guard(cancel, chain.parent_tipset(tipset))
            .await
            .map_err(|e| e.wrap_chain("chain_get_tipset"))?;
        let height = parent.height;

        if !force {
            let existed = guard(cancel, store.existed(&kind, height, version))
                .await
                .map_err(|e| e.wrap_storage("existed"))?;
            if existed {
                info!(task = TASK_NAME, height, version, "already processed, skipping");
                return Ok(RunOutcome::AlreadyProcessed { height });
            }
        }

        let messages = guard(cancel, chain.messages(&parent))
            .await
            .map_err(|e| e.wrap_chain("chain_get_messages_in_tipset"))?;

        // Siblings of a failed unit observe this token and settle early.
        let run_cancel = cancel.child_token();
        let dedup = SubCallDeduplicator::new(self.config.parent_hash_policy);

        let units: Vec<_> = messages
            .iter()
            .enumerate()
            .map(|(index, message)| {
                self.extract_message(&run_cancel, chain, &dedup, height, version, index, message)
            })
            .collect();
        let mut settled =
            stream::iter(units).buffer_unordered(self.config.concurrency_for(messages.len()));

        let mut first_error: Option<TaskError> = None;
        let mut claimed = Vec::new();
        let mut duplicates = 0;
        while let Some(result) = settled.next().await {
            match result {
                Ok(out) => {
                    duplicates += out.duplicates;
                    claimed.extend(out.claimed);
                }
                Err(err) if first_error.is_none() => {
                    run_cancel.cancel();
                    first_error = Some(err);
                }
                Err(_) => {}
            }
        }
        drop(settled);

        if let Some(err) = first_error {
            warn!(
                task = TASK_NAME,
                height,
                version,
                tipset = %parent.key,
                error = %err,
                "run aborted"
            );
            return Err(err);
        }

        // Drop claims that a lower-indexed message took over after they were made.
        let observed = claimed.len();
        let records: Vec<InternalTransaction> = claimed
            .into_iter()
            .filter(|c| dedup.is_owner(&c.cid, c.message_index))
            .map(|c| c.record)
            .collect();
        duplicates += observed - records.len();

        debug!(
            task = TASK_NAME,
            height,
            tipset = %parent.key,
            messages = messages.len(),
            duplicates,
            "replay units settled"
        );

        if !records.is_empty() {
            // Not raced against cancellation: the write either commits or errors.
            if cancel.is_cancelled() {
                return Err(TaskError::Cancelled);
            }
            store
                .replace_version(&kind, height, version, &records)
                .await
                .map_err(|e| e.wrap_storage("replace_version"))?;
        }

        info!(
            task = TASK_NAME,
            height,
            version,
            records = records.len(),
            "internal transactions extracted"
        );

        Ok(RunOutcome::Extracted {
            height,
            records: records.len(),
            duplicates,
        })
    }

    /// Replay one top-level message and build records for the sub-calls it
    /// claims.
    #[allow(clippy::too_many_arguments)]
    async fn extract_message(
        &self,
        cancel: &CancellationToken,
        chain: &dyn ChainReader,
        dedup: &SubCallDeduplicator,
        height: ChainEpoch,
        version: u32,
        message_index: usize,
        message: &ChainMessage,
    ) -> Result<UnitOutput, TaskError> {
        let (trace, parent_hash) = guard(cancel, async {
            tokio::try_join!(
                async {
                    chain
                        .replay(message)
                        .await
                        .map_err(|e| e.wrap_chain("state_replay"))
                },
                async {
                    chain
                        .canonical_hash(message)
                        .await
                        .map_err(|e| e.wrap_chain("eth_get_transaction_hash_by_cid"))
                },
            )
        })
        .await?;

        let calls: Vec<&SubCall> = match self.config.trace_depth {
            TraceDepth::Immediate => trace.immediate_subcalls().collect(),
            TraceDepth::Recursive => trace.all_subcalls(),
        };

        let builder = RecordBuilder::new(height, version, &parent_hash);
        let mut out = UnitOutput {
            claimed: Vec::with_capacity(calls.len()),
            duplicates: 0,
        };
        for call in calls {
            if dedup.check_and_insert(call.cid, message_index) {
                debug!(subcall = %call.cid, message = %message.cid, "duplicate sub-call skipped");
                out.duplicates += 1;
                continue;
            }
            let from = self.translator.translate(&call.from)?;
            let to = self.translator.translate(&call.to)?;
            let hash = EthHash::from_cid(&call.cid)?;
            out.claimed.push(Claimed {
                cid: call.cid,
                message_index,
                record: builder.build(call, &hash, &from, &to),
            });
        }
        Ok(out)
    }
}

impl Default for InternalTxTask {
    fn default() -> Self {
        Self {
            config: ExtractorConfig::default(),
            translator: Arc::new(FilecoinAddressTranslator),
        }
    }
}

#[async_trait]
impl Task for InternalTxTask {
    fn name(&self) -> &str {
        TASK_NAME
    }

    fn record_kind(&self) -> RecordKind {
        InternalTransaction::KIND
    }

    async fn run(
        &self,
        cancel: &CancellationToken,
        chain: &dyn ChainReader,
        version: u32,
        tipset: &TipsetRef,
        force: bool,
        store: &dyn VersionedStore,
    ) -> Result<RunOutcome, TaskError> {
        if tipset.is_genesis() {
            return Ok(RunOutcome::Genesis);
        }
        self.extract(cancel, chain, version, tipset, force, store).await
    }
}

/// Race `fut` against the cancellation token.
async fn guard<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, TaskError>
where
    F: Future<Output = Result<T, TaskError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TaskError::Cancelled),
        res = fut => res,
    }
}
