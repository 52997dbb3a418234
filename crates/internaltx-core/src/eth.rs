//! Ethereum-style address and hash forms used in persisted records.

use std::fmt;

use cid::Cid;
use fvm_shared::ActorID;

use crate::error::TaskError;

/// A 20-byte Ethereum address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EthAddress(pub [u8; 20]);

impl EthAddress {
    /// Masked ID address: `0xff`, eleven zero bytes, then the actor ID big-endian.
    pub fn from_actor_id(id: ActorID) -> Self {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xff;
        bytes[12..].copy_from_slice(&id.to_be_bytes());
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for EthAddress {
    type Error = std::array::TryFromSliceError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(<[u8; 20]>::try_from(bytes)?))
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// A 32-byte Ethereum transaction hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EthHash(pub [u8; 32]);

impl EthHash {
    /// The hash of a message is the 32-byte digest of its CID's multihash.
    pub fn from_cid(cid: &Cid) -> Result<Self, TaskError> {
        let digest = cid.hash().digest();
        <[u8; 32]>::try_from(digest).map(Self).map_err(|_| {
            TaskError::chain_lookup(
                "eth_hash_from_cid",
                format!("{cid}: digest is {} bytes, expected 32", digest.len()),
            )
        })
    }
}

impl fmt::Display for EthHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cid::multihash::Multihash;

    const BLAKE2B_256: u64 = 0xb220;
    const DAG_CBOR: u64 = 0x71;

    #[test]
    fn masked_id_layout() {
        let addr = EthAddress::from_actor_id(1234);
        assert_eq!(addr.to_string(), "0xff000000000000000000000000000000000004d2");
    }

    #[test]
    fn address_from_slice() {
        let addr = EthAddress::try_from(&[0x11u8; 20][..]).unwrap();
        assert_eq!(addr.to_string(), "0x1111111111111111111111111111111111111111");
        assert!(EthAddress::try_from(&[0x11u8; 8][..]).is_err());
    }

    #[test]
    fn hash_from_blake2b_cid() {
        let mh = Multihash::wrap(BLAKE2B_256, &[0xab; 32]).unwrap();
        let cid = Cid::new_v1(DAG_CBOR, mh);
        let hash = EthHash::from_cid(&cid).unwrap();
        assert_eq!(hash.0, [0xab; 32]);
        assert_eq!(hash.to_string(), format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn hash_from_short_digest_fails() {
        let mh = Multihash::wrap(BLAKE2B_256, &[0x01; 20]).unwrap();
        let cid = Cid::new_v1(DAG_CBOR, mh);
        let err = EthHash::from_cid(&cid).unwrap_err();
        assert!(err.is_chain_lookup());
        assert!(err.to_string().contains("eth_hash_from_cid"));
    }
}
