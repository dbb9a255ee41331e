// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Registry Engine
//!
//! Wires a store, its event log and an index builder together according to
//! a [`NodeConfig`]. In synchronous mode every mutation is ingested before
//! the call returns; in background mode a tokio worker follows the store's
//! subscription.

use delegation_kernel::verify::index_view_hash;
use delegation_kernel::index::EventEntity;
use delegation_kernel::{Address, IndexRecord, IndexView, MutationEvent, SpaceId, TxId};
use delegation_persistence::checkpoint::CheckpointHeader;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{IndexMode, NodeConfig};
use crate::errors::{CheckpointError, RegistryError};
use crate::events::event_log::{EventLog, FileEventLog, MemoryEventLog};
use crate::events::event_replay::{rebuild_index, resume_index, verify_consistency};
use crate::indexer::{spawn_index_worker, CheckpointPolicy, IndexBuilder, IndexWorker, SharedIndex};
use crate::store::DelegationStore;

pub struct Engine {
    config: NodeConfig,
    clock: Arc<dyn Clock>,
    store: Arc<DelegationStore>,
    index: SharedIndex,
    worker: Option<IndexWorker>,
    /// Index cursor at the last checkpoint (synchronous mode).
    last_checkpoint: AtomicU64,
}

/// Outcome of the checkpoint part of [`Engine::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointStatus {
    Missing,
    Matches { cursor: u64 },
    Diverged { cursor: u64 },
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub log_head: u64,
    pub rebuilt_hash: [u8; 32],
    /// Live index, caught up to the head.
    pub live_hash: [u8; 32],
    pub index_matches_rebuild: bool,
    pub registry_matches_index: bool,
    pub checkpoint: CheckpointStatus,
}

impl VerifyReport {
    pub fn is_consistent(&self) -> bool {
        self.index_matches_rebuild
            && self.registry_matches_index
            && matches!(self.checkpoint, CheckpointStatus::Missing | CheckpointStatus::Matches { .. })
    }
}

impl Engine {
    pub fn open(config: NodeConfig) -> Result<Self, RegistryError> {
        let log: Arc<dyn EventLog> = match &config.event_log_path {
            Some(path) => Arc::new(FileEventLog::open(path)?),
            None => Arc::new(MemoryEventLog::new()),
        };
        Self::with_log(config, log, Arc::new(SystemClock))
    }

    pub fn with_log(config: NodeConfig, log: Arc<dyn EventLog>, clock: Arc<dyn Clock>) -> Result<Self, RegistryError> {
        let store = Arc::new(DelegationStore::open(Arc::clone(&log), Arc::clone(&clock))?);
        let builder = IndexBuilder::resume_or_rebuild(config.checkpoint_path.as_deref(), log.as_ref())?;
        let last_checkpoint = AtomicU64::new(builder.next_sequence());
        let index: SharedIndex = Arc::new(RwLock::new(builder));

        let mut mode = config.index_mode;
        if mode == IndexMode::Background && tokio::runtime::Handle::try_current().is_err() {
            warn!("background index mode needs a tokio runtime; indexing synchronously");
            mode = IndexMode::Synchronous;
        }

        let worker = match mode {
            IndexMode::Background => {
                let policy = config.checkpoint_path.clone().map(|path| CheckpointPolicy {
                    path,
                    interval: config.checkpoint_interval,
                    clock: Arc::clone(&clock),
                });
                Some(spawn_index_worker(Arc::clone(&index), log, store.subscribe(), policy))
            }
            IndexMode::Synchronous => None,
        };

        info!(?mode, head = store.log().next_sequence(), "registry engine ready");
        Ok(Self {
            config,
            clock,
            store,
            index,
            worker,
            last_checkpoint,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<DelegationStore> {
        &self.store
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    pub fn log(&self) -> &Arc<dyn EventLog> {
        self.store.log()
    }

    // --- Mutations ---

    pub fn set_delegate(&self, delegator: Address, space: SpaceId, delegate: Address) -> Result<MutationEvent, RegistryError> {
        let event = self.store.set_delegate(delegator, space, delegate)?;
        self.after_commit(&event);
        Ok(event)
    }

    pub fn clear_delegate(&self, delegator: Address, space: SpaceId, delegate: Address) -> Result<MutationEvent, RegistryError> {
        let event = self.store.clear_delegate(delegator, space, delegate)?;
        self.after_commit(&event);
        Ok(event)
    }

    pub fn clear_all_delegates(&self, delegator: Address, space: SpaceId) -> Result<MutationEvent, RegistryError> {
        let event = self.store.clear_all_delegates(delegator, space)?;
        self.after_commit(&event);
        Ok(event)
    }

    fn after_commit(&self, event: &MutationEvent) {
        if self.worker.is_some() {
            return;
        }
        let cursor = {
            let mut index = self.index.write();
            index.ingest(event.clone());
            // Events committed straight through the store never reach here.
            if index.has_gap() {
                if let Err(e) = index.catch_up(self.log().as_ref()) {
                    error!(error = %e, "index catch-up failed");
                }
            }
            index.next_sequence()
        };

        let interval = self.config.checkpoint_interval;
        if interval == 0 || self.config.checkpoint_path.is_none() {
            return;
        }
        let last = self.last_checkpoint.load(Ordering::SeqCst);
        if cursor.saturating_sub(last) >= interval
            && self
                .last_checkpoint
                .compare_exchange(last, cursor, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            if let Err(e) = self.checkpoint() {
                error!(error = %e, "automatic checkpoint failed");
            }
        }
    }

    // --- Queries ---

    pub fn get_total_delegates(&self, delegator: &Address, space: &SpaceId) -> usize {
        self.store.get_total_delegates(delegator, space)
    }

    pub fn delegates(&self, delegator: &Address, space: &SpaceId) -> Vec<Address> {
        self.store.delegates(delegator, space)
    }

    pub fn list_active_delegates(&self, delegator: &Address, space: &SpaceId) -> BTreeSet<Address> {
        self.index.read().list_active_delegates(delegator, space)
    }

    pub fn is_active(&self, delegator: &Address, space: &SpaceId, delegate: &Address) -> bool {
        self.index.read().is_active(delegator, space, delegate)
    }

    pub fn record(&self, delegator: &Address, space: &SpaceId, delegate: &Address) -> Option<IndexRecord> {
        self.index.read().record(delegator, space, delegate)
    }

    pub fn active_count(&self) -> u64 {
        self.index.read().active_count()
    }

    /// The raw entity recorded for one event.
    pub fn entity(&self, id: &TxId) -> Option<EventEntity> {
        self.index.read().entity(id)
    }

    /// Every event entity for `delegator` in log order, including cleared history.
    pub fn entities_by_delegator(&self, delegator: &Address) -> Vec<EventEntity> {
        self.index.read().entities_by_delegator(delegator)
    }

    pub fn entity_count(&self) -> usize {
        self.index.read().entities().len()
    }

    // --- Maintenance ---

    /// Writes the current index view to the configured checkpoint path.
    pub fn checkpoint(&self) -> Result<CheckpointHeader, RegistryError> {
        let path = self
            .config
            .checkpoint_path
            .as_ref()
            .ok_or(CheckpointError::NotConfigured)?;
        let header = self.index.read().save_checkpoint(path, self.clock.now())?;
        self.last_checkpoint.fetch_max(header.next_sequence, Ordering::SeqCst);
        Ok(header)
    }

    /// Replays the log from 0 and cross-checks the live index, the store and
    /// the checkpoint against it.
    pub fn verify(&self) -> Result<VerifyReport, RegistryError> {
        let log = self.store.log().as_ref();
        let rebuilt = rebuild_index(log)?;
        let live = resume_index(self.index.read().view().clone(), log)?;

        let rebuilt_hash = index_view_hash(&rebuilt);
        let live_hash = index_view_hash(&live);
        let registry_matches_index = verify_consistency(&self.store.to_state(), &rebuilt);
        let checkpoint = self.check_checkpoint(log);

        Ok(VerifyReport {
            log_head: rebuilt.next_sequence(),
            rebuilt_hash,
            live_hash,
            index_matches_rebuild: rebuilt_hash == live_hash,
            registry_matches_index,
            checkpoint,
        })
    }

    fn check_checkpoint(&self, log: &dyn EventLog) -> CheckpointStatus {
        let path = match &self.config.checkpoint_path {
            Some(path) if path.exists() => path,
            _ => return CheckpointStatus::Missing,
        };
        let saved = match IndexBuilder::load_checkpoint(path) {
            Ok(builder) => builder,
            Err(e) => return CheckpointStatus::Unreadable(e.to_string()),
        };

        let cursor = saved.next_sequence();
        match replay_prefix(log, cursor) {
            Ok(prefix) if prefix.next_sequence() == cursor && index_view_hash(&prefix) == saved.view_hash() => {
                CheckpointStatus::Matches { cursor }
            }
            Ok(_) => CheckpointStatus::Diverged { cursor },
            Err(e) => CheckpointStatus::Unreadable(e.to_string()),
        }
    }

    /// Waits until the background index has caught up with the log head.
    /// Returns immediately in synchronous mode.
    pub async fn sync_index(&self) -> bool {
        match &self.worker {
            Some(worker) => worker.wait_for(self.store.log().next_sequence()).await,
            None => true,
        }
    }

    /// Stops the background worker after it drains its queue.
    ///
    /// The worker only exits once every handle to the store is dropped.
    pub async fn shutdown(self) {
        let Engine { store, worker, .. } = self;
        drop(store);
        if let Some(worker) = worker {
            worker.join().await;
        }
    }
}

/// The view over events `[0, end)`.
fn replay_prefix(log: &dyn EventLog, end: u64) -> Result<IndexView, RegistryError> {
    let mut view = IndexView::new();
    for event in log.replay_from(0)? {
        let event = event?;
        if event.sequence >= end {
            break;
        }
        view.apply(&event)?;
    }
    Ok(view)
}
