// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Active Delegation View
//!
//! A materialized view keyed by `(delegator, space)` and then by delegate.
//! Grouping by key is what lets a `ClearAllDelegates` event, which names no
//! delegates, drop every record under its key in one removal.
//!
//! # Reducer Contract
//! - `sequence < cursor`  → duplicate, no-op
//! - `sequence == cursor` → applied, cursor advances
//! - `sequence > cursor`  → `OutOfOrder`, view unchanged
//!
//! The same [`IndexView::apply`] drives live updates and full rebuilds, so a
//! rebuild from sequence 0 always lands on the incrementally-built view.

use alloc::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::event::{EventKind, MutationEvent};
use crate::types::{Address, DelegationKey, SpaceId};

/// Where and when a delegation became active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub sequence: u64,
    pub timestamp: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event advanced the cursor.
    Applied,
    /// The event was at or behind the cursor and was ignored.
    Duplicate,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexView {
    next_sequence: u64,
    active: u64,
    groups: BTreeMap<DelegationKey, BTreeMap<Address, IndexRecord>>,
}

impl IndexView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number of the next event this view expects.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Total number of active `(delegator, space, delegate)` triples.
    pub fn active_count(&self) -> u64 {
        self.active
    }

    /// Number of keys with at least one active delegate.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn list_active(&self, delegator: &Address, space: &SpaceId) -> BTreeSet<Address> {
        self.groups
            .get(&DelegationKey::new(*delegator, *space))
            .map(|group| group.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_active(&self, delegator: &Address, space: &SpaceId, delegate: &Address) -> bool {
        self.record(delegator, space, delegate).is_some()
    }

    pub fn record(&self, delegator: &Address, space: &SpaceId, delegate: &Address) -> Option<&IndexRecord> {
        self.groups
            .get(&DelegationKey::new(*delegator, *space))
            .and_then(|group| group.get(delegate))
    }

    /// Every active triple, in key order then delegate order.
    pub fn iter(&self) -> impl Iterator<Item = (&DelegationKey, &Address, &IndexRecord)> + '_ {
        self.groups
            .iter()
            .flat_map(|(key, group)| group.iter().map(move |(delegate, record)| (key, delegate, record)))
    }

    /// Applies one event per the reducer contract.
    pub fn apply(&mut self, event: &MutationEvent) -> Result<ApplyOutcome> {
        if event.sequence < self.next_sequence {
            return Ok(ApplyOutcome::Duplicate);
        }
        if event.sequence > self.next_sequence {
            return Err(KernelError::OutOfOrder {
                expected: self.next_sequence,
                found: event.sequence,
            });
        }

        let record = IndexRecord {
            sequence: event.sequence,
            timestamp: event.timestamp,
        };

        match event.kind {
            EventKind::SetDelegate { delegator, space, delegate } => {
                let group = self.groups.entry(DelegationKey::new(delegator, space)).or_default();
                if group.insert(delegate, record).is_none() {
                    self.active += 1;
                }
            }
            EventKind::ClearDelegate { delegator, space, delegate } => {
                let key = DelegationKey::new(delegator, space);
                if let Some(group) = self.groups.get_mut(&key) {
                    if group.remove(&delegate).is_some() {
                        self.active -= 1;
                    }
                    if group.is_empty() {
                        self.groups.remove(&key);
                    }
                }
            }
            EventKind::ClearAllDelegates { delegator, space } => {
                if let Some(group) = self.groups.remove(&DelegationKey::new(delegator, space)) {
                    self.active -= group.len() as u64;
                }
            }
        }

        self.next_sequence += 1;
        Ok(ApplyOutcome::Applied)
    }
}

/// Pure reducer form: `(view, event) -> view'`.
pub fn reduce(mut view: IndexView, event: &MutationEvent) -> Result<IndexView> {
    view.apply(event)?;
    Ok(view)
}
