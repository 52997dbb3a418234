//! Extractor configuration.

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Which sub-calls of a replayed message are extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceDepth {
    /// Only calls made directly by the top-level message.
    #[default]
    Immediate,
    /// Every nested call, at any depth.
    Recursive,
}

/// Which top-level message is recorded as the trigger of a sub-call that
/// shows up in several replays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentHashPolicy {
    /// Whichever replay claims the sub-call first. Not stable across runs.
    #[default]
    FirstObserver,
    /// The message with the lowest index in the tipset. Stable across runs.
    LowestMessageIndex,
}

/// Configuration for an extraction task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Upper bound on messages replayed at once. `None` = one unit per
    /// message, no cap.
    pub max_concurrency: Option<usize>,
    pub trace_depth: TraceDepth,
    pub parent_hash_policy: ParentHashPolicy,
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.max_concurrency == Some(0) {
            return Err(TaskError::Config("max_concurrency must be at least 1".into()));
        }
        Ok(())
    }

    /// Number of units to keep in flight for `messages` top-level messages.
    pub fn concurrency_for(&self, messages: usize) -> usize {
        self.max_concurrency
            .map_or(messages, |cap| cap.min(messages))
            .max(1)
    }
}
