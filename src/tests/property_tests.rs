// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Property-based tests for the registry state machine and index reducer.

use proptest::prelude::*;
use std::vec::Vec;

use crate::event::MutationEvent;
use crate::index::{reduce, IndexView};
use crate::replay::{rebuild_entities, rebuild_view, resume_view};
use crate::state::command::Command;
use crate::state::registry::RegistryState;
use crate::types::{Address, SpaceId};
use crate::verify::{index_view_hash, registry_state_hash, view_membership_hash};

// ============================================================================
// Arbitrary Implementations
// ============================================================================

fn arb_address() -> impl Strategy<Value = Address> {
    // Tiny pool, zero included, so duplicates and self-delegation show up.
    (0u8..5).prop_map(|b| Address([b; 20]))
}

fn arb_space() -> impl Strategy<Value = SpaceId> {
    prop_oneof![Just(""), Just("alpha"), Just("beta")].prop_map(SpaceId::from_label)
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => (arb_address(), arb_space(), arb_address())
            .prop_map(|(delegator, space, delegate)| Command::SetDelegate { delegator, space, delegate }),
        2 => (arb_address(), arb_space(), arb_address())
            .prop_map(|(delegator, space, delegate)| Command::ClearDelegate { delegator, space, delegate }),
        1 => (arb_address(), arb_space())
            .prop_map(|(delegator, space)| Command::ClearAllDelegates { delegator, space }),
    ]
}

/// Runs commands like the live store; returns final state, live view, events.
fn drive(commands: &[Command]) -> (RegistryState, IndexView, Vec<MutationEvent>) {
    let mut state = RegistryState::new();
    let mut view = IndexView::new();
    let mut events = Vec::new();
    for cmd in commands {
        if state.apply(cmd).is_ok() {
            let event = MutationEvent::seal(events.len() as u64, 1_000, cmd.to_event_kind());
            view.apply(&event).expect("in-order event");
            events.push(event);
        }
    }
    (state, view, events)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Replaying the log from 0 lands on the live view
    #[test]
    fn prop_rebuild_equals_incremental(commands in prop::collection::vec(arb_command(), 0..120)) {
        let (_, live, events) = drive(&commands);
        let rebuilt = rebuild_view(&events).expect("rebuild");
        prop_assert_eq!(index_view_hash(&rebuilt), index_view_hash(&live));
        prop_assert_eq!(rebuilt, live);
    }

    /// Active triples in the view are exactly the registry's members
    #[test]
    fn prop_view_mirrors_registry(commands in prop::collection::vec(arb_command(), 0..120)) {
        let (state, view, _) = drive(&commands);
        prop_assert_eq!(view_membership_hash(&view), registry_state_hash(&state));
    }

    /// Sets never hold zero or their own delegator
    #[test]
    fn prop_set_invariants(commands in prop::collection::vec(arb_command(), 0..120)) {
        let (state, _, _) = drive(&commands);
        for (key, set) in state.iter() {
            prop_assert!(!set.is_empty());
            for delegate in set.iter() {
                prop_assert!(!delegate.is_zero());
                prop_assert_ne!(*delegate, key.delegator);
            }
        }
    }

    /// Redelivering any prefix of the log changes nothing
    #[test]
    fn prop_redelivery_is_idempotent(
        commands in prop::collection::vec(arb_command(), 1..80),
        cut in 0usize..80,
    ) {
        let (_, live, events) = drive(&commands);
        let cut = cut.min(events.len());
        let again = resume_view(live.clone(), &events[..cut]).expect("duplicates are no-ops");
        prop_assert_eq!(again, live);
    }

    /// Registry recovered from the log equals the live registry
    #[test]
    fn prop_registry_recovery(commands in prop::collection::vec(arb_command(), 0..120)) {
        let (state, _, events) = drive(&commands);
        let recovered = RegistryState::from_events(&events).expect("recover");
        prop_assert_eq!(registry_state_hash(&recovered), registry_state_hash(&state));
    }

    /// Folding with the pure reducer matches in-place application
    #[test]
    fn prop_reduce_matches_apply(commands in prop::collection::vec(arb_command(), 0..60)) {
        let (_, live, events) = drive(&commands);
        let folded = events.iter().try_fold(IndexView::new(), reduce).expect("fold");
        prop_assert_eq!(folded, live);
    }

    /// One entity per event, in log order, whatever the event did
    #[test]
    fn prop_entities_cover_every_event(commands in prop::collection::vec(arb_command(), 0..120)) {
        let (_, _, events) = drive(&commands);
        let entities = rebuild_entities(&events);
        prop_assert_eq!(entities.len(), events.len());
        for (entity, event) in entities.iter().zip(&events) {
            prop_assert_eq!(entity.block_number, event.sequence);
            prop_assert_eq!(entity.id, event.origin);
        }
    }
}
