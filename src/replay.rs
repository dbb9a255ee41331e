//! Deterministic Replay Logic.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

use crate::error::Result;
use crate::event::MutationEvent;
use crate::index::{EntityLog, IndexView};
use crate::state::registry::RegistryState;
use crate::verify::{index_view_hash, registry_state_hash};

/// Rebuilds an index view from sequence 0.
pub fn rebuild_view<'a, I>(events: I) -> Result<IndexView>
where
    I: IntoIterator<Item = &'a MutationEvent>,
{
    resume_view(IndexView::new(), events)
}

/// Continues a view (e.g. one loaded from a checkpoint) with more events.
///
/// Events behind the view's cursor are skipped, so the stream may start
/// anywhere at or before the cursor.
pub fn resume_view<'a, I>(mut view: IndexView, events: I) -> Result<IndexView>
where
    I: IntoIterator<Item = &'a MutationEvent>,
{
    for event in events {
        view.apply(event)?;
    }
    Ok(view)
}

pub fn rebuild_entities<'a, I>(events: I) -> EntityLog
where
    I: IntoIterator<Item = &'a MutationEvent>,
{
    let mut log = EntityLog::new();
    for event in events {
        log.record(event);
    }
    log
}

/// Replays a full event stream through both the registry state machine and
/// the index reducer, returning `(registry hash, view hash)`.
pub fn replay_and_hash(events: &[MutationEvent]) -> Result<([u8; 32], [u8; 32])> {
    let state = RegistryState::from_events(events)?;
    let view = rebuild_view(events)?;
    Ok((registry_state_hash(&state), index_view_hash(&view)))
}
