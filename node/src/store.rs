// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Delegation Store
//!
//! The authoritative `(delegator, space) -> set<delegate>` mapping.
//!
//! # Mutation Protocol
//! ```text
//! lock key
//! ↓
//! 1. Validate against the current set
//! ↓
//! 2. Append to the event log (durable, sequence assigned)
//! ↓
//! 3. Apply to the in-memory set
//! ↓
//! 4. Notify subscribers
//! ```
//! A failed append leaves the set untouched. Each key has its own lock, so
//! mutations on distinct keys never wait on each other; only the log's
//! writer lock is shared.

use delegation_kernel::state::command::Command;
use delegation_kernel::state::set::DelegationSet;
use delegation_kernel::{Address, DelegationKey, MutationEvent, RegistryState, SpaceId};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::errors::RegistryError;
use crate::events::event_log::{EventLog, MemoryEventLog};
use crate::events::event_replay::recover_registry;

type KeyLock = Arc<Mutex<DelegationSet>>;

pub struct DelegationStore {
    log: Arc<dyn EventLog>,
    clock: Arc<dyn Clock>,
    sets: RwLock<FxHashMap<DelegationKey, KeyLock>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<MutationEvent>>>,
}

impl DelegationStore {
    /// An empty store over a fresh in-memory log.
    pub fn in_memory() -> Self {
        Self {
            log: Arc::new(MemoryEventLog::new()),
            clock: Arc::new(SystemClock),
            sets: RwLock::new(FxHashMap::default()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Recovers the store by replaying `log` from the beginning.
    pub fn open(log: Arc<dyn EventLog>, clock: Arc<dyn Clock>) -> Result<Self, RegistryError> {
        let state = recover_registry(log.as_ref())?;
        let sets = state
            .into_sets()
            .into_iter()
            .map(|(key, set)| (key, Arc::new(Mutex::new(set))))
            .collect();

        Ok(Self {
            log,
            clock,
            sets: RwLock::new(sets),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn log(&self) -> &Arc<dyn EventLog> {
        &self.log
    }

    pub fn set_delegate(&self, delegator: Address, space: SpaceId, delegate: Address) -> Result<MutationEvent, RegistryError> {
        self.mutate(Command::SetDelegate { delegator, space, delegate })
    }

    pub fn clear_delegate(&self, delegator: Address, space: SpaceId, delegate: Address) -> Result<MutationEvent, RegistryError> {
        self.mutate(Command::ClearDelegate { delegator, space, delegate })
    }

    /// Never rejected; an empty or unknown key still records one event.
    pub fn clear_all_delegates(&self, delegator: Address, space: SpaceId) -> Result<MutationEvent, RegistryError> {
        self.mutate(Command::ClearAllDelegates { delegator, space })
    }

    pub fn get_total_delegates(&self, delegator: &Address, space: &SpaceId) -> usize {
        self.existing_lock(&DelegationKey::new(*delegator, *space))
            .map_or(0, |set| set.lock().len())
    }

    /// Current members in ascending byte order.
    pub fn delegates(&self, delegator: &Address, space: &SpaceId) -> Vec<Address> {
        self.existing_lock(&DelegationKey::new(*delegator, *space))
            .map(|set| set.lock().to_vec())
            .unwrap_or_default()
    }

    /// Receives every event committed after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<MutationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Copy of the whole mapping.
    ///
    /// Keys are locked one at a time, so under concurrent writers the result
    /// is not a single point-in-time cut.
    pub fn to_state(&self) -> RegistryState {
        let locks: Vec<(DelegationKey, KeyLock)> = self
            .sets
            .read()
            .iter()
            .map(|(key, lock)| (*key, Arc::clone(lock)))
            .collect();
        let sets = locks.into_iter().map(|(key, lock)| (key, lock.lock().clone()));
        RegistryState::from_sets(sets, self.log.next_sequence())
    }

    fn existing_lock(&self, key: &DelegationKey) -> Option<KeyLock> {
        self.sets.read().get(key).cloned()
    }

    fn key_lock(&self, key: DelegationKey) -> KeyLock {
        if let Some(lock) = self.existing_lock(&key) {
            return lock;
        }
        Arc::clone(self.sets.write().entry(key).or_default())
    }

    /// Drops the map entry for an empty set nobody else holds.
    ///
    /// Handles are only cloned under the map lock, so with the write lock
    /// held a count of two (map + caller) cannot grow.
    fn prune_if_empty(&self, key: &DelegationKey, lock: KeyLock) {
        if !lock.lock().is_empty() {
            return;
        }
        let mut sets = self.sets.write();
        let current = sets.get(key).is_some_and(|held| Arc::ptr_eq(held, &lock));
        if current && Arc::strong_count(&lock) == 2 && lock.lock().is_empty() {
            sets.remove(key);
        }
    }

    fn mutate(&self, cmd: Command) -> Result<MutationEvent, RegistryError> {
        let key = cmd.key();
        let lock = self.key_lock(key);
        let result = self.mutate_locked(&lock, &cmd);
        self.prune_if_empty(&key, lock);
        result
    }

    fn mutate_locked(&self, lock: &KeyLock, cmd: &Command) -> Result<MutationEvent, RegistryError> {
        let mut set = lock.lock();

        if let Err(reason) = set.check(cmd) {
            metrics::counter!("registry_rejections_total", 1);
            debug!(%reason, key = ?cmd.key(), "mutation rejected");
            return Err(RegistryError::Rejected(reason));
        }

        let event = self.log.append(cmd.to_event_kind(), self.clock.now())?;
        set.commit(cmd);
        metrics::counter!("registry_events_committed_total", 1);
        debug!(sequence = event.sequence, kind = event.event_type(), "event committed");

        self.notify(&event);
        Ok(event)
    }

    fn notify(&self, event: &MutationEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delegation_kernel::RejectionReason;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    #[test]
    fn test_rejection_emits_nothing() {
        let store = DelegationStore::in_memory();
        let space = SpaceId::from_label("test_project1");

        let err = store.set_delegate(addr(1), space, Address::ZERO).unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::ZeroAddress));
        assert_eq!(store.log().next_sequence(), 0);
    }

    #[test]
    fn test_subscriber_sees_committed_events() {
        let store = DelegationStore::in_memory();
        let mut rx = store.subscribe();
        let space = SpaceId::from_label("");

        store.set_delegate(addr(1), space, addr(2)).unwrap();
        store.clear_all_delegates(addr(1), space).unwrap();

        assert_eq!(rx.try_recv().unwrap().sequence, 0);
        assert_eq!(rx.try_recv().unwrap().event_type(), "ClearAllDelegates");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let store = DelegationStore::in_memory();
        drop(store.subscribe());

        store.set_delegate(addr(1), SpaceId::from_label("s"), addr(2)).unwrap();
        assert!(store.subscribers.lock().is_empty());
    }

    #[test]
    fn test_empty_keys_are_not_retained() {
        let store = DelegationStore::in_memory();
        let s = SpaceId::from_label("s");

        store.clear_delegate(addr(1), s, addr(2)).unwrap_err();
        store.clear_all_delegates(addr(3), s).unwrap();
        store.set_delegate(addr(4), s, addr(4)).unwrap_err();
        assert!(store.sets.read().is_empty());

        store.set_delegate(addr(1), s, addr(2)).unwrap();
        store.set_delegate(addr(5), s, addr(2)).unwrap();
        assert_eq!(store.sets.read().len(), 2);

        store.clear_delegate(addr(1), s, addr(2)).unwrap();
        assert_eq!(store.sets.read().len(), 1);
        assert_eq!(store.get_total_delegates(&addr(5), &s), 1);
        assert_eq!(store.log().next_sequence(), 4);
    }
}
