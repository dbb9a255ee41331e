// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The member set of one (delegator, space) key.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::error::RejectionReason;
use crate::state::command::Command;
use crate::types::Address;
use crate::validate::validate;

/// Delegates currently registered under one key.
///
/// Never holds duplicates, the zero address, or the owning delegator; every
/// mutation goes through [`DelegationSet::check`] first. Iteration is in
/// ascending byte order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationSet {
    members: BTreeSet<Address>,
}

impl DelegationSet {
    pub const EMPTY: DelegationSet = DelegationSet { members: BTreeSet::new() };

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, delegate: &Address) -> bool {
        self.members.contains(delegate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> + '_ {
        self.members.iter()
    }

    pub fn to_vec(&self) -> Vec<Address> {
        self.members.iter().copied().collect()
    }

    /// Validates `cmd` against the current members.
    pub fn check(&self, cmd: &Command) -> Result<(), RejectionReason> {
        validate(cmd.operation(), &cmd.key(), cmd.delegate(), self)
    }

    /// Applies a command that already passed [`check`](Self::check).
    ///
    /// Returns how many members were added or removed.
    pub fn commit(&mut self, cmd: &Command) -> usize {
        match cmd {
            Command::SetDelegate { delegate, .. } => {
                debug_assert!(!delegate.is_zero());
                usize::from(self.members.insert(*delegate))
            }
            Command::ClearDelegate { delegate, .. } => usize::from(self.members.remove(delegate)),
            Command::ClearAllDelegates { .. } => {
                let removed = self.members.len();
                self.members.clear();
                removed
            }
        }
    }

    /// Check then commit.
    pub fn apply(&mut self, cmd: &Command) -> Result<usize, RejectionReason> {
        self.check(cmd)?;
        Ok(self.commit(cmd))
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, delegate: Address) {
        self.members.insert(delegate);
    }
}
