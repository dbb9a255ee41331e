// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Registry Command definitions.

use serde::{Deserialize, Serialize};

use crate::event::EventKind;
use crate::types::{Address, DelegationKey, SpaceId};
use crate::validate::Operation;

/// A requested mutation, before validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
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

impl Command {
    pub fn key(&self) -> DelegationKey {
        match *self {
            Command::SetDelegate { delegator, space, .. }
            | Command::ClearDelegate { delegator, space, .. }
            | Command::ClearAllDelegates { delegator, space } => DelegationKey::new(delegator, space),
        }
    }

    pub fn delegate(&self) -> Option<&Address> {
        match self {
            Command::SetDelegate { delegate, .. } | Command::ClearDelegate { delegate, .. } => Some(delegate),
            Command::ClearAllDelegates { .. } => None,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Command::SetDelegate { .. } => Operation::SetDelegate,
            Command::ClearDelegate { .. } => Operation::ClearDelegate,
            Command::ClearAllDelegates { .. } => Operation::ClearAllDelegates,
        }
    }

    /// The event payload recorded once this command is accepted.
    pub fn to_event_kind(&self) -> EventKind {
        match *self {
            Command::SetDelegate { delegator, space, delegate } => {
                EventKind::SetDelegate { delegator, space, delegate }
            }
            Command::ClearDelegate { delegator, space, delegate } => {
                EventKind::ClearDelegate { delegator, space, delegate }
            }
            Command::ClearAllDelegates { delegator, space } => {
                EventKind::ClearAllDelegates { delegator, space }
            }
        }
    }
}
