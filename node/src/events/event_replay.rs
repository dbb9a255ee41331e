// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Replay - Authoritative Recovery
//!
//! **The event log always wins. Checkpoints are just a cache.**
//!
//! # Recovery Protocol
//! 1. Replay the log from 0 through the registry state machine
//! 2. Every event must re-apply cleanly; a rejection means the log and the
//!    rules disagree, and recovery fails closed
//! 3. The index is rebuilt (or resumed) from the same log

use delegation_kernel::verify::{registry_state_hash, view_membership_hash};
use delegation_kernel::{IndexView, KernelError, RegistryState};
use std::time::Instant;
use tracing::{error, info};

use crate::errors::RegistryError;
use crate::events::event_log::EventLog;

/// Replays the whole log into a fresh registry state.
pub fn recover_registry(log: &dyn EventLog) -> Result<RegistryState, RegistryError> {
    let start = Instant::now();
    let mut state = RegistryState::new();
    let mut expected = 0u64;

    for event in log.replay_from(0)? {
        let event = event?;
        if event.sequence != expected {
            error!(expected, found = event.sequence, "event log out of order during recovery");
            return Err(KernelError::OutOfOrder { expected, found: event.sequence }.into());
        }
        state.apply_event(&event).map_err(|e| {
            error!(sequence = event.sequence, error = %e, "event replay failed");
            RegistryError::from(e)
        })?;
        expected += 1;
    }

    metrics::histogram!("registry_replay_duration_seconds", start.elapsed().as_secs_f64());
    info!(events = expected, keys = state.key_count(), "recovered registry from event log");
    Ok(state)
}

/// Rebuilds the active-delegation view from sequence 0.
pub fn rebuild_index(log: &dyn EventLog) -> Result<IndexView, RegistryError> {
    resume_index(IndexView::new(), log)
}

/// Brings `view` up to the log head.
pub fn resume_index(mut view: IndexView, log: &dyn EventLog) -> Result<IndexView, RegistryError> {
    for event in log.replay_from(view.next_sequence())? {
        view.apply(&event?)?;
    }
    Ok(view)
}

/// True when the view holds exactly the registry's memberships.
pub fn verify_consistency(state: &RegistryState, view: &IndexView) -> bool {
    registry_state_hash(state) == view_membership_hash(view)
}
