// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Registry State definition.
//!
//! The authoritative `(delegator, space) -> set<delegate>` mapping as a plain,
//! single-threaded state machine. Keys with no members are not stored:
//! absence is the empty state.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::error::{KernelError, Result};
use crate::event::MutationEvent;
use crate::state::command::Command;
use crate::state::set::DelegationSet;
use crate::types::{Address, DelegationKey, SpaceId};

static EMPTY: DelegationSet = DelegationSet::EMPTY;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryState {
    pub(crate) version: u64,
    pub(crate) sets: BTreeMap<DelegationKey, DelegationSet>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read APIs ---

    /// Number of commands applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn total_delegates(&self, delegator: &Address, space: &SpaceId) -> usize {
        self.members(&DelegationKey::new(*delegator, *space)).len()
    }

    pub fn members(&self, key: &DelegationKey) -> &DelegationSet {
        self.sets.get(key).unwrap_or(&EMPTY)
    }

    pub fn delegates(&self, delegator: &Address, space: &SpaceId) -> Vec<Address> {
        self.members(&DelegationKey::new(*delegator, *space)).to_vec()
    }

    /// Non-empty sets in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&DelegationKey, &DelegationSet)> + '_ {
        self.sets.iter()
    }

    /// Number of keys with at least one delegate.
    pub fn key_count(&self) -> usize {
        self.sets.len()
    }

    pub fn into_sets(self) -> BTreeMap<DelegationKey, DelegationSet> {
        self.sets
    }

    /// Reassembles a state from sets built through [`DelegationSet::apply`].
    ///
    /// Empty sets are dropped.
    pub fn from_sets<I>(sets: I, version: u64) -> Self
    where
        I: IntoIterator<Item = (DelegationKey, DelegationSet)>,
    {
        Self {
            version,
            sets: sets.into_iter().filter(|(_, set)| !set.is_empty()).collect(),
        }
    }

    // --- Write Logic ---

    /// Validates and applies a command. Returns the number of members changed.
    pub fn apply(&mut self, cmd: &Command) -> Result<usize> {
        let key = cmd.key();
        let changed = match self.sets.get_mut(&key) {
            Some(set) => {
                let changed = set.apply(cmd)?;
                if set.is_empty() {
                    self.sets.remove(&key);
                }
                changed
            }
            None => {
                let mut set = DelegationSet::new();
                let changed = set.apply(cmd)?;
                if !set.is_empty() {
                    self.sets.insert(key, set);
                }
                changed
            }
        };

        self.version += 1;
        Ok(changed)
    }

    /// Re-applies a recorded event during recovery.
    ///
    /// Events only exist for commands that were accepted, so a rejection here
    /// means the log and this state disagree.
    pub fn apply_event(&mut self, event: &MutationEvent) -> Result<usize> {
        self.apply(&event.kind.to_command())
    }

    /// Replays an ordered event stream into a fresh state.
    pub fn from_events<'a, I>(events: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a MutationEvent>,
    {
        let mut state = Self::new();
        let mut expected = 0u64;
        for event in events {
            if event.sequence != expected {
                return Err(KernelError::OutOfOrder { expected, found: event.sequence });
            }
            state.apply_event(event)?;
            expected += 1;
        }
        Ok(state)
    }
}
