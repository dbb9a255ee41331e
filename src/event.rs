// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Mutation Events
//!
//! Every accepted registry mutation is recorded as exactly one
//! `MutationEvent`. The event stream is the only channel between the
//! authoritative registry and any index built from it.
//!
//! # Invariants
//! - Events are immutable once sealed
//! - Sequence numbers start at 0 and are gap-free
//! - Same event stream => same registry state and same index view
//! - `ClearAllDelegates` carries no member list

use serde::{Deserialize, Serialize};

use crate::state::command::Command;
use crate::types::{Address, DelegationKey, SpaceId, TxId};

/// The payload of a mutation event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    SetDelegate {
        delegator: Address,
        space: SpaceId,
        delegate: Address,
    },
    ClearDelegate {
        delegator: Address,
        space: SpaceId,
        delegate: Address,
    },
    ClearAllDelegates {
        delegator: Address,
        space: SpaceId,
    },
}

impl EventKind {
    /// Returns a human-readable name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::SetDelegate { .. } => "SetDelegate",
            EventKind::ClearDelegate { .. } => "ClearDelegate",
            EventKind::ClearAllDelegates { .. } => "ClearAllDelegates",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            EventKind::SetDelegate { .. } => 1,
            EventKind::ClearDelegate { .. } => 2,
            EventKind::ClearAllDelegates { .. } => 3,
        }
    }

    pub fn key(&self) -> DelegationKey {
        match *self {
            EventKind::SetDelegate { delegator, space, .. }
            | EventKind::ClearDelegate { delegator, space, .. }
            | EventKind::ClearAllDelegates { delegator, space } => DelegationKey::new(delegator, space),
        }
    }

    pub fn delegate(&self) -> Option<Address> {
        match *self {
            EventKind::SetDelegate { delegate, .. } | EventKind::ClearDelegate { delegate, .. } => Some(delegate),
            EventKind::ClearAllDelegates { .. } => None,
        }
    }

    /// The command that produced this event.
    pub fn to_command(&self) -> Command {
        match *self {
            EventKind::SetDelegate { delegator, space, delegate } => {
                Command::SetDelegate { delegator, space, delegate }
            }
            EventKind::ClearDelegate { delegator, space, delegate } => {
                Command::ClearDelegate { delegator, space, delegate }
            }
            EventKind::ClearAllDelegates { delegator, space } => {
                Command::ClearAllDelegates { delegator, space }
            }
        }
    }
}

/// A sealed, positioned mutation event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEvent {
    /// Log position, strictly increasing from 0.
    pub sequence: u64,
    /// Seconds since the Unix epoch at which the mutation was accepted.
    pub timestamp: u64,
    /// Origin transaction id, derived from the position and payload.
    pub origin: TxId,
    pub kind: EventKind,
}

impl MutationEvent {
    /// Seals `kind` at `sequence`, deriving its origin id.
    pub fn seal(sequence: u64, timestamp: u64, kind: EventKind) -> Self {
        Self {
            sequence,
            timestamp,
            origin: derive_origin(sequence, &kind),
            kind,
        }
    }

    pub fn key(&self) -> DelegationKey {
        self.kind.key()
    }

    pub fn delegate(&self) -> Option<Address> {
        self.kind.delegate()
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    /// True when the origin id matches the one derived from the payload.
    pub fn origin_is_consistent(&self) -> bool {
        self.origin == derive_origin(self.sequence, &self.kind)
    }
}

/// BLAKE3 over `sequence || tag || delegator || space || delegate?`.
fn derive_origin(sequence: u64, kind: &EventKind) -> TxId {
    let key = kind.key();
    let mut hasher = blake3::Hasher::new();
    hasher.update(&sequence.to_le_bytes());
    hasher.update(&[kind.tag()]);
    hasher.update(key.delegator.as_bytes());
    hasher.update(key.space.as_bytes());
    if let Some(delegate) = kind.delegate() {
        hasher.update(delegate.as_bytes());
    }
    TxId(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EventKind {
        EventKind::SetDelegate {
            delegator: Address([1; 20]),
            space: SpaceId::from_label("test_project1"),
            delegate: Address([2; 20]),
        }
    }

    #[test]
    fn test_event_serialization_determinism() {
        let event = MutationEvent::seal(7, 1_700_000_000, sample());

        let bytes1 = bincode::serde::encode_to_vec(&event, bincode::config::standard()).unwrap();
        let bytes2 = bincode::serde::encode_to_vec(&event, bincode::config::standard()).unwrap();

        assert_eq!(bytes1, bytes2, "Event serialization must be deterministic");
    }

    #[test]
    fn test_origin_depends_on_position() {
        let a = MutationEvent::seal(0, 10, sample());
        let b = MutationEvent::seal(1, 10, sample());
        let c = MutationEvent::seal(0, 99, sample());

        assert_ne!(a.origin, b.origin);
        // Timestamp is not part of the origin.
        assert_eq!(a.origin, c.origin);
        assert!(a.origin_is_consistent());
    }

    #[test]
    fn test_tampered_event_detected() {
        let mut event = MutationEvent::seal(3, 10, sample());
        event.kind = EventKind::ClearAllDelegates {
            delegator: Address([1; 20]),
            space: SpaceId::from_label("test_project1"),
        };
        assert!(!event.origin_is_consistent());
    }

    #[test]
    fn test_command_round_trip() {
        let kind = sample();
        assert_eq!(kind.to_command().to_event_kind(), kind);
    }
}
