//! Chain-side types consumed by the extraction task.

use std::fmt;

use cid::Cid;
use fvm_shared::address::Address;
use fvm_shared::clock::ChainEpoch;
use fvm_shared::econ::TokenAmount;
use fvm_shared::error::ExitCode;
use fvm_shared::MethodNum;

// ─── TipsetKey ────────────────────────────────────────────────────────────────

/// The set of block CIDs identifying a tipset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TipsetKey(Vec<Cid>);

impl TipsetKey {
    pub fn new(cids: Vec<Cid>) -> Self {
        Self(cids)
    }

    pub fn cids(&self) -> &[Cid] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Cid>> for TipsetKey {
    fn from(cids: Vec<Cid>) -> Self {
        Self(cids)
    }
}

impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cid) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{cid}")?;
        }
        write!(f, "}}")
    }
}

// ─── TipsetRef ────────────────────────────────────────────────────────────────

/// A reference to a tipset: its key, height, and the key of its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipsetRef {
    pub key: TipsetKey,
    pub height: ChainEpoch,
    /// Empty for genesis.
    pub parents: TipsetKey,
}

impl TipsetRef {
    /// Genesis has no parent to replay.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }
}

// ─── Messages & traces ───────────────────────────────────────────────────────

/// A top-level message included in a tipset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMessage {
    pub cid: Cid,
}

impl ChainMessage {
    pub fn new(cid: Cid) -> Self {
        Self { cid }
    }
}

/// One internal call made while executing a message.
#[derive(Debug, Clone, PartialEq)]
pub struct SubCall {
    /// Identity of the sub-call message; global across the tipset.
    pub cid: Cid,
    pub from: Address,
    pub to: Address,
    pub value: TokenAmount,
    pub method: MethodNum,
    pub subcalls: Vec<SubCall>,
}

/// The result of replaying a top-level message.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionTrace {
    pub msg_cid: Cid,
    pub exit_code: ExitCode,
    /// Execution error reported by the node, if any.
    pub error: Option<String>,
    /// Calls made directly by the message, in execution order.
    pub subcalls: Vec<SubCall>,
}

impl ExecutionTrace {
    /// Immediate sub-calls only.
    pub fn immediate_subcalls(&self) -> impl Iterator<Item = &SubCall> {
        self.subcalls.iter()
    }

    /// All sub-calls at every depth, pre-order.
    pub fn all_subcalls(&self) -> Vec<&SubCall> {
        let mut out = Vec::new();
        let mut stack: Vec<&SubCall> = self.subcalls.iter().rev().collect();
        while let Some(call) = stack.pop() {
            out.push(call);
            stack.extend(call.subcalls.iter().rev());
        }
        out
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
