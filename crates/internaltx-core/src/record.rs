//! The persisted internal-transaction record and its builder.

use fvm_shared::clock::ChainEpoch;
use fvm_shared::MethodNum;
use serde::{Deserialize, Serialize};

use crate::eth::{EthAddress, EthHash};
use crate::store::{Column, RecordKind};
use crate::types::SubCall;

/// One internal transaction, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InternalTransaction {
    /// Height of the tipset the sub-call executed in.
    pub height: ChainEpoch,
    pub version: u32,
    /// Canonical hash of the sub-call (`0x…`).
    pub hash: String,
    /// Canonical hash of the top-level message that triggered it (`0x…`).
    pub parent_hash: String,
    pub from: String,
    pub to: String,
    /// Invocation method number.
    #[serde(rename = "type")]
    pub tx_type: MethodNum,
    /// Transferred amount in attoFIL, decimal.
    pub value: String,
}

impl InternalTransaction {
    /// Storage shape of this record.
    pub const KIND: RecordKind = RecordKind {
        name: "evm_internal_tx",
        columns: &[
            Column::new("height", "BIGINT"),
            Column::new("version", "INTEGER"),
            Column::new("hash", "TEXT"),
            Column::new("parent_hash", "TEXT"),
            Column::new("from", "TEXT"),
            Column::new("to", "TEXT"),
            Column::new("type", "BIGINT"),
            Column::new("value", "TEXT"),
        ],
    };
}

/// Builds records for the sub-calls of one top-level message.
///
/// Holds the context shared by every sub-call of that message; `build` is
/// pure.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    height: ChainEpoch,
    version: u32,
    parent_hash: String,
}

impl RecordBuilder {
    pub fn new(height: ChainEpoch, version: u32, parent_hash: &EthHash) -> Self {
        Self {
            height,
            version,
            parent_hash: parent_hash.to_string(),
        }
    }

    pub fn build(
        &self,
        call: &SubCall,
        hash: &EthHash,
        from: &EthAddress,
        to: &EthAddress,
    ) -> InternalTransaction {
        InternalTransaction {
            height: self.height,
            version: self.version,
            hash: hash.to_string(),
            parent_hash: self.parent_hash.clone(),
            from: from.to_string(),
            to: to.to_string(),
            tx_type: call.method,
            value: call.value.atto().to_string(),
        }
    }
}
