// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Raw event entities.
//!
//! An append-only projection that keeps one immutable record per event,
//! keyed by origin transaction id. Nothing is ever removed, including on
//! `ClearAllDelegates`.

use alloc::collections::BTreeMap;

use crate::event::MutationEvent;
use crate::types::{Address, SpaceId, TxId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventEntity {
    pub id: TxId,
    pub event_type: &'static str,
    pub delegator: Address,
    pub space: SpaceId,
    pub delegate: Option<Address>,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub transaction_hash: TxId,
}

impl EventEntity {
    pub fn from_event(event: &MutationEvent) -> Self {
        let key = event.key();
        Self {
            id: event.origin,
            event_type: event.event_type(),
            delegator: key.delegator,
            space: key.space,
            delegate: event.delegate(),
            block_number: event.sequence,
            block_timestamp: event.timestamp,
            transaction_hash: event.origin,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityLog {
    entities: BTreeMap<TxId, EventEntity>,
    by_block: BTreeMap<u64, TxId>,
}

impl EntityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event. Returns false when it was already recorded.
    pub fn record(&mut self, event: &MutationEvent) -> bool {
        if self.entities.contains_key(&event.origin) {
            return false;
        }
        let entity = EventEntity::from_event(event);
        self.by_block.insert(entity.block_number, entity.id);
        self.entities.insert(entity.id, entity);
        true
    }

    pub fn get(&self, id: &TxId) -> Option<&EventEntity> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in block (sequence) order.
    pub fn iter(&self) -> impl Iterator<Item = &EventEntity> + '_ {
        self.by_block.values().filter_map(|id| self.entities.get(id))
    }

    pub fn by_delegator<'a>(&'a self, delegator: &'a Address) -> impl Iterator<Item = &'a EventEntity> + 'a {
        self.iter().filter(move |entity| entity.delegator == *delegator)
    }
}
