//! Deterministic Hashing and Verification.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::index::IndexView;
use crate::state::registry::RegistryState;
use crate::types::{Address, DelegationKey};

/// Hash of an index view: cursor plus every record.
///
/// Two views with equal hashes hold the same active triples with the same
/// positions and expect the same next event.
pub fn index_view_hash(view: &IndexView) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&view.next_sequence().to_le_bytes());
    hasher.update(&view.active_count().to_le_bytes());
    for (key, delegate, record) in view.iter() {
        hash_triple(&mut hasher, key, delegate);
        hasher.update(&record.sequence.to_le_bytes());
        hasher.update(&record.timestamp.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Hash of the authoritative membership only.
pub fn registry_state_hash(state: &RegistryState) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for (key, set) in state.iter() {
        for delegate in set.iter() {
            hash_triple(&mut hasher, key, delegate);
        }
    }
    *hasher.finalize().as_bytes()
}

/// Membership hash of a view, comparable with [`registry_state_hash`].
pub fn view_membership_hash(view: &IndexView) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for (key, delegate, _) in view.iter() {
        hash_triple(&mut hasher, key, delegate);
    }
    *hasher.finalize().as_bytes()
}

fn hash_triple(hasher: &mut blake3::Hasher, key: &DelegationKey, delegate: &Address) {
    hasher.update(key.delegator.as_bytes());
    hasher.update(key.space.as_bytes());
    hasher.update(delegate.as_bytes());
}

pub fn checkpoint_hash(body: &[u8]) -> [u8; 32] {
    blake3::hash(body).into()
}
