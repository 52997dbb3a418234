//! Concurrent sub-call deduplication.
//!
//! The same sub-call can appear in the replay of several unrelated top-level
//! messages. Every replay unit claims the sub-calls it sees here; only the
//! owner of a claim emits a record.

use cid::Cid;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::ParentHashPolicy;

/// Concurrent claim table keyed by sub-call CID.
///
/// Each entry holds the index of the top-level message that currently owns the
/// sub-call. Test-and-set happens under the shard lock of the entry, so a
/// claim made by one unit is visible to every later caller.
#[derive(Debug)]
pub struct SubCallDeduplicator {
    owners: DashMap<Cid, usize>,
    policy: ParentHashPolicy,
}

impl SubCallDeduplicator {
    pub fn new(policy: ParentHashPolicy) -> Self {
        Self {
            owners: DashMap::new(),
            policy,
        }
    }

    /// Claim `id` for the message at `message_index`.
    ///
    /// Returns `true` if the sub-call was already claimed and the caller must
    /// skip it. Under [`ParentHashPolicy::LowestMessageIndex`] a lower index
    /// takes over an existing claim; the displaced record is dropped later by
    /// [`is_owner`](Self::is_owner).
    pub fn check_and_insert(&self, id: Cid, message_index: usize) -> bool {
        match self.owners.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(message_index);
                false
            }
            Entry::Occupied(mut slot) => match self.policy {
                ParentHashPolicy::FirstObserver => true,
                ParentHashPolicy::LowestMessageIndex => {
                    if message_index < *slot.get() {
                        slot.insert(message_index);
                        false
                    } else {
                        true
                    }
                }
            },
        }
    }

    /// Returns `true` if the message at `message_index` owns `id`.
    pub fn is_owner(&self, id: &Cid, message_index: usize) -> bool {
        self.owners
            .get(id)
            .is_some_and(|owner| *owner == message_index)
    }

    /// Number of distinct sub-calls claimed.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
