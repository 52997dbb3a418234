//! Fluent builder for the internal-transaction task.
//!
//! # Example
//!
//! ```rust,no_run
//! use internaltx_core::builder::ExtractorBuilder;
//! use internaltx_core::config::{ParentHashPolicy, TraceDepth};
//!
//! let task = ExtractorBuilder::new()
//!     .max_concurrency(16)
//!     .trace_depth(TraceDepth::Recursive)
//!     .parent_hash_policy(ParentHashPolicy::LowestMessageIndex)
//!     .build()
//!     .expect("valid config");
//! ```

use std::sync::Arc;

use crate::chain::{AddressTranslator, FilecoinAddressTranslator};
use crate::config::{ExtractorConfig, ParentHashPolicy, TraceDepth};
use crate::error::TaskError;
use crate::extractor::InternalTxTask;

/// Fluent builder for `InternalTxTask`.
#[derive(Default)]
pub struct ExtractorBuilder {
    config: ExtractorConfig,
    translator: Option<Arc<dyn AddressTranslator>>,
}

impl ExtractorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config (e.g. one loaded from a file).
    pub fn config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    /// Cap the number of messages replayed at once.
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.config.max_concurrency = Some(n);
        self
    }

    pub fn trace_depth(mut self, depth: TraceDepth) -> Self {
        self.config.trace_depth = depth;
        self
    }

    pub fn parent_hash_policy(mut self, policy: ParentHashPolicy) -> Self {
        self.config.parent_hash_policy = policy;
        self
    }

    /// Replace the default Filecoin address translator.
    pub fn translator(mut self, translator: Arc<dyn AddressTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Build the `ExtractorConfig` only.
    pub fn build_config(self) -> ExtractorConfig {
        self.config
    }

    /// Validate the config and build the task.
    pub fn build(self) -> Result<InternalTxTask, TaskError> {
        let translator = self
            .translator
            .unwrap_or_else(|| Arc::new(FilecoinAddressTranslator));
        InternalTxTask::new(self.config, translator)
    }
}
