//! Error types for the internal-transaction task.

use std::fmt;

use thiserror::Error;

/// Errors that can abort an extraction run.
///
/// Every variant carries the name of the operation that produced it so the
/// scheduler can log a useful message without inspecting the source.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Tipset, message, replay or hash lookup against the chain failed.
    #[error("chain lookup '{op}' failed: {reason}")]
    ChainLookup { op: String, reason: String },

    /// A native address has no canonical (Ethereum-style) form.
    #[error("address translation '{op}' failed for {address}: {reason}")]
    AddressTranslation {
        op: String,
        address: String,
        reason: String,
    },

    /// Existence check or batch write against the versioned store failed.
    #[error("storage '{op}' failed: {reason}")]
    Storage { op: String, reason: String },

    /// The ambient cancellation signal fired before the run settled.
    #[error("run cancelled")]
    Cancelled,

    #[error("invalid config: {0}")]
    Config(String),
}

impl TaskError {
    pub fn chain_lookup(op: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ChainLookup {
            op: op.into(),
            reason: reason.to_string(),
        }
    }

    pub fn address_translation(
        op: impl Into<String>,
        address: impl fmt::Display,
        reason: impl fmt::Display,
    ) -> Self {
        Self::AddressTranslation {
            op: op.into(),
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn storage(op: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Storage {
            op: op.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a collaborator error as a chain lookup failure of `op`.
    /// Cancellation passes through untouched.
    pub fn wrap_chain(self, op: &str) -> Self {
        match self {
            Self::Cancelled => Self::Cancelled,
            other => Self::chain_lookup(op, other),
        }
    }

    /// Wrap a collaborator error as a storage failure of `op`.
    /// Cancellation passes through untouched.
    pub fn wrap_storage(self, op: &str) -> Self {
        match self {
            Self::Cancelled => Self::Cancelled,
            other => Self::storage(op, other),
        }
    }

    /// Returns `true` for tipset/message/replay/hash lookup failures.
    pub fn is_chain_lookup(&self) -> bool {
        matches!(self, Self::ChainLookup { .. })
    }

    /// Returns `true` for address translation failures.
    pub fn is_address_translation(&self) -> bool {
        matches!(self, Self::AddressTranslation { .. })
    }

    /// Returns `true` for storage failures.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
