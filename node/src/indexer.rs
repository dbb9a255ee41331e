// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Index Builder
//!
//! The single logical reader of the event log. Keeps the active-delegation
//! view and the raw entity projection current, strictly in sequence order:
//! - events behind the cursor are re-deliveries and are ignored
//! - events ahead of the cursor wait in a reorder buffer until the gap fills
//! - `catch_up` pulls anything missing straight from the log
//!
//! Queries are served from the view only, never from the log.

use delegation_kernel::index::{ApplyOutcome, EntityLog, EventEntity};
use delegation_kernel::replay::rebuild_entities;
use delegation_kernel::snapshot::decode::decode_view;
use delegation_kernel::snapshot::encode::encode_view;
use delegation_kernel::verify::index_view_hash;
use delegation_kernel::{Address, IndexRecord, IndexView, MutationEvent, SpaceId, TxId};
use delegation_persistence::checkpoint::{self, CheckpointHeader};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::errors::{CheckpointError, RegistryError};
use crate::events::event_log::{collect_events, EventLog, EventLogError};

#[derive(Debug, Default, Clone)]
pub struct IndexBuilder {
    view: IndexView,
    entities: EntityLog,
    pending: BTreeMap<u64, MutationEvent>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing view, e.g. one loaded from a checkpoint.
    ///
    /// The entity projection starts empty; see [`restore_entities`](Self::restore_entities).
    pub fn from_view(view: IndexView) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    pub fn view(&self) -> &IndexView {
        &self.view
    }

    pub fn entities(&self) -> &EntityLog {
        &self.entities
    }

    pub fn entity(&self, id: &TxId) -> Option<EventEntity> {
        self.entities.get(id).copied()
    }

    /// Every entity recorded for `delegator`, in log order.
    pub fn entities_by_delegator(&self, delegator: &Address) -> Vec<EventEntity> {
        self.entities.by_delegator(delegator).copied().collect()
    }

    /// Sequence number of the next event the view expects.
    pub fn next_sequence(&self) -> u64 {
        self.view.next_sequence()
    }

    /// Events received ahead of the cursor and not yet applied.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn has_gap(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Accepts one delivered event. Returns how many events were applied,
    /// counting any buffered events the delivery released.
    pub fn ingest(&mut self, event: MutationEvent) -> usize {
        let cursor = self.view.next_sequence();
        if event.sequence < cursor {
            debug!(sequence = event.sequence, cursor, "ignoring re-delivered event");
            return 0;
        }
        if event.sequence > cursor {
            debug!(sequence = event.sequence, cursor, "buffering early event");
            self.pending.entry(event.sequence).or_insert(event);
            return 0;
        }

        let mut applied = usize::from(self.apply_next(&event));
        while let Some(next) = self.pending.remove(&self.view.next_sequence()) {
            if !self.apply_next(&next) {
                break;
            }
            applied += 1;
        }
        // Anything left below the cursor was delivered twice while buffered.
        let cursor = self.view.next_sequence();
        self.pending = self.pending.split_off(&cursor);
        applied
    }

    fn apply_next(&mut self, event: &MutationEvent) -> bool {
        match self.view.apply(event) {
            Ok(ApplyOutcome::Applied) => {
                self.entities.record(event);
                metrics::counter!("registry_index_events_applied_total", 1);
                true
            }
            Ok(ApplyOutcome::Duplicate) => false,
            Err(e) => {
                error!(sequence = event.sequence, error = %e, "index rejected an in-order event");
                false
            }
        }
    }

    /// Replays the log from the cursor to the head.
    pub fn catch_up(&mut self, log: &dyn EventLog) -> Result<usize, EventLogError> {
        let mut applied = 0;
        for event in log.replay_from(self.view.next_sequence())? {
            applied += self.ingest(event?);
        }
        Ok(applied)
    }

    /// Rebuilds the entity projection for events `[0, cursor)` from the log.
    ///
    /// Checkpoints carry only the view, so a resumed builder needs this to
    /// hold one entity per event.
    pub fn restore_entities(&mut self, log: &dyn EventLog) -> Result<(), EventLogError> {
        let cursor = self.view.next_sequence();
        let mut prefix = Vec::new();
        for event in log.replay_from(0)? {
            let event = event?;
            if event.sequence >= cursor {
                break;
            }
            prefix.push(event);
        }
        if (prefix.len() as u64) < cursor {
            return Err(EventLogError::Corrupted(format!(
                "log holds {} events, index cursor is {}",
                prefix.len(),
                cursor
            )));
        }
        self.entities = rebuild_entities(&prefix);
        Ok(())
    }

    /// Discards everything and replays the log from 0.
    pub fn rebuild(&mut self, log: &dyn EventLog) -> Result<usize, EventLogError> {
        *self = Self::new();
        let applied = self.catch_up(log)?;
        info!(events = applied, active = self.view.active_count(), "rebuilt index from event log");
        Ok(applied)
    }

    // --- Queries ---

    pub fn list_active_delegates(&self, delegator: &Address, space: &SpaceId) -> BTreeSet<Address> {
        self.view.list_active(delegator, space)
    }

    pub fn is_active(&self, delegator: &Address, space: &SpaceId, delegate: &Address) -> bool {
        self.view.is_active(delegator, space, delegate)
    }

    pub fn record(&self, delegator: &Address, space: &SpaceId, delegate: &Address) -> Option<IndexRecord> {
        self.view.record(delegator, space, delegate).copied()
    }

    pub fn active_count(&self) -> u64 {
        self.view.active_count()
    }

    pub fn view_hash(&self) -> [u8; 32] {
        index_view_hash(&self.view)
    }

    // --- Checkpoints ---

    pub fn save_checkpoint(&self, path: impl AsRef<Path>, timestamp: u64) -> Result<CheckpointHeader, CheckpointError> {
        write_checkpoint(&self.view, path.as_ref(), timestamp)
    }

    /// Loads and verifies a checkpoint.
    pub fn load_checkpoint(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let (header, body) = checkpoint::read_checkpoint(path)?;
        let view = decode_view(&body).map_err(CheckpointError::Body)?;
        if view.next_sequence() != header.next_sequence {
            return Err(CheckpointError::CursorMismatch {
                header: header.next_sequence,
                body: view.next_sequence(),
            });
        }
        Ok(Self::from_view(view))
    }

    /// Resumes from a checkpoint when a usable one exists, otherwise
    /// rebuilds from 0. Either way the result is caught up to the log head.
    pub fn resume_or_rebuild(checkpoint: Option<&Path>, log: &dyn EventLog) -> Result<Self, RegistryError> {
        let head = log.next_sequence();
        let loaded = checkpoint
            .filter(|path| path.exists())
            .map(|path| Self::load_checkpoint(path).and_then(|b| b.check_not_ahead(head)));

        let mut builder = match loaded {
            Some(Ok(mut builder)) => {
                info!(cursor = builder.next_sequence(), head, "resuming index from checkpoint");
                builder.restore_entities(log)?;
                builder
            }
            Some(Err(e)) => {
                warn!(error = %e, "discarding unusable index checkpoint");
                Self::new()
            }
            None => Self::new(),
        };
        builder.catch_up(log)?;
        Ok(builder)
    }

    fn check_not_ahead(self, head: u64) -> Result<Self, CheckpointError> {
        let cursor = self.next_sequence();
        if cursor > head {
            return Err(CheckpointError::AheadOfLog { cursor, head });
        }
        Ok(self)
    }
}

/// Encodes `view` and writes it atomically to `path`.
pub fn write_checkpoint(view: &IndexView, path: &Path, timestamp: u64) -> Result<CheckpointHeader, CheckpointError> {
    let body = encode_view(view).map_err(CheckpointError::Body)?;
    let header = CheckpointHeader::new(view.next_sequence(), timestamp, &body);
    checkpoint::write_to(path, &header, &body)?;
    info!(
        path = %path.display(),
        cursor = header.next_sequence,
        bytes = body.len(),
        "index checkpoint written"
    );
    Ok(header)
}

pub type SharedIndex = Arc<RwLock<IndexBuilder>>;

/// Automatic checkpointing for the background worker.
#[derive(Clone)]
pub struct CheckpointPolicy {
    pub path: PathBuf,
    /// Events between checkpoints; 0 disables.
    pub interval: u64,
    /// Stamps each checkpoint header.
    pub clock: Arc<dyn Clock>,
}

/// Handle to a running index worker.
pub struct IndexWorker {
    handle: JoinHandle<()>,
    progress: watch::Receiver<u64>,
}

impl IndexWorker {
    /// Waits until the index cursor reaches `sequence`.
    ///
    /// Returns false if the worker stopped first.
    pub async fn wait_for(&self, sequence: u64) -> bool {
        let mut progress = self.progress.clone();
        let reached = progress.wait_for(|cursor| *cursor >= sequence).await.is_ok();
        reached
    }

    /// Last cursor the worker reported.
    pub fn cursor(&self) -> u64 {
        *self.progress.borrow()
    }

    /// Waits for the worker to drain and exit. It exits once every sender
    /// of its channel (the store's subscription) is gone.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            error!(error = %e, "index worker panicked");
        }
    }
}

/// Spawns a tokio task feeding `events` into `index`.
///
/// A delivery that leaves a gap triggers a catch-up from `log`; the missing
/// events are already durable there because the store appends before it
/// notifies. Log reads and checkpoint writes run on the blocking pool with
/// the index lock released.
pub fn spawn_index_worker(
    index: SharedIndex,
    log: Arc<dyn EventLog>,
    mut events: mpsc::UnboundedReceiver<MutationEvent>,
    checkpoint: Option<CheckpointPolicy>,
) -> IndexWorker {
    let (progress_tx, progress) = watch::channel(index.read().next_sequence());

    let handle = tokio::spawn(async move {
        let mut last_checkpoint = index.read().next_sequence();

        while let Some(event) = events.recv().await {
            let gap_from = {
                let mut builder = index.write();
                builder.ingest(event);
                builder.has_gap().then(|| builder.next_sequence())
            };

            if let Some(from) = gap_from {
                let log = Arc::clone(&log);
                match tokio::task::spawn_blocking(move || collect_events(log.replay_from(from)?)).await {
                    Ok(Ok(missing)) => {
                        let mut builder = index.write();
                        for event in missing {
                            builder.ingest(event);
                        }
                    }
                    Ok(Err(e)) => error!(error = %e, "index catch-up failed"),
                    Err(e) => error!(error = %e, "index catch-up task failed"),
                }
            }

            let (cursor, due) = {
                let builder = index.read();
                let cursor = builder.next_sequence();
                let due = checkpoint
                    .as_ref()
                    .filter(|p| p.interval > 0 && cursor.saturating_sub(last_checkpoint) >= p.interval)
                    .map(|p| (p.clone(), builder.view().clone()));
                (cursor, due)
            };

            if let Some((policy, view)) = due {
                let written = tokio::task::spawn_blocking(move || {
                    write_checkpoint(&view, &policy.path, policy.clock.now())
                })
                .await;
                match written {
                    Ok(Ok(header)) => last_checkpoint = header.next_sequence,
                    Ok(Err(e)) => error!(error = %e, "automatic checkpoint failed"),
                    Err(e) => error!(error = %e, "checkpoint task failed"),
                }
            }
            progress_tx.send_replace(cursor);
        }
        debug!("index worker stopped");
    });

    IndexWorker { handle, progress }
}
