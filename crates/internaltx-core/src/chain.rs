//! Chain-side collaborator traits and the Filecoin address translator.

use async_trait::async_trait;
use fvm_shared::address::{Address, Payload};
use fvm_shared::ActorID;

use crate::error::TaskError;
use crate::eth::{EthAddress, EthHash};
use crate::types::{ChainMessage, ExecutionTrace, TipsetRef};

/// Actor ID of the Ethereum Address Manager; its delegated namespace holds
/// Ethereum addresses.
pub const EAM_ACTOR_ID: ActorID = 10;

/// Operation name carried by translation errors.
pub const TRANSLATE_OP: &str = "eth_address_from_filecoin_address";

/// Read access to a chain node.
///
/// Implementations must be `Send + Sync`; the extractor calls `replay` and
/// `canonical_hash` concurrently for every message of a tipset.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Load the parent tipset of `tipset`.
    async fn parent_tipset(&self, tipset: &TipsetRef) -> Result<TipsetRef, TaskError>;

    /// All messages executed in `tipset`.
    async fn messages(&self, tipset: &TipsetRef) -> Result<Vec<ChainMessage>, TaskError>;

    /// Replay `message` against chain state and return its execution trace.
    async fn replay(&self, message: &ChainMessage) -> Result<ExecutionTrace, TaskError>;

    /// Public (Ethereum) transaction hash of `message`.
    async fn canonical_hash(&self, message: &ChainMessage) -> Result<EthHash, TaskError>;
}

/// Maps a native address to its canonical Ethereum form.
pub trait AddressTranslator: Send + Sync {
    fn translate(&self, address: &Address) -> Result<EthAddress, TaskError>;
}

/// The chain's own Filecoin → Ethereum address mapping.
///
/// ID addresses become masked ID addresses and EAM-delegated (`f410`)
/// addresses yield their 20-byte sub-address. Key and actor addresses have no
/// Ethereum form.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilecoinAddressTranslator;

impl AddressTranslator for FilecoinAddressTranslator {
    fn translate(&self, address: &Address) -> Result<EthAddress, TaskError> {
        match address.payload() {
            Payload::ID(id) => Ok(EthAddress::from_actor_id(*id)),
            Payload::Delegated(delegated) if delegated.namespace() == EAM_ACTOR_ID => {
                let sub = delegated.subaddress();
                EthAddress::try_from(sub).map_err(|_| {
                    TaskError::address_translation(
                        TRANSLATE_OP,
                        address,
                        format!("expected 20-byte subaddress, got {}", sub.len()),
                    )
                })
            }
            Payload::Delegated(delegated) => Err(TaskError::address_translation(
                TRANSLATE_OP,
                address,
                format!("delegated namespace {} is not the EAM", delegated.namespace()),
            )),
            _ => Err(TaskError::address_translation(
                TRANSLATE_OP,
                address,
                format!("protocol {:?} has no ethereum form", address.protocol()),
            )),
        }
    }
}
