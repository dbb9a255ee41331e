// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::{KernelError, RejectionReason};
use crate::event::EventKind;
use crate::tests::{addr, space, Harness};
use crate::types::Address;

const D1: u8 = 0x11;
const D2: u8 = 0x12;
const A: u8 = 0xA1;
const B: u8 = 0xA2;

#[test]
fn test_set_increments_total_by_one() {
    let mut h = Harness::new();
    assert_eq!(h.total(D1, "test_project1"), 0);

    h.set(D1, "test_project1", A).unwrap();
    assert_eq!(h.total(D1, "test_project1"), 1);

    h.set(D1, "test_project1", B).unwrap();
    assert_eq!(h.total(D1, "test_project1"), 2);
}

#[test]
fn test_duplicate_leaves_count_unchanged() {
    let mut h = Harness::new();
    h.set(D1, "test_project1", A).unwrap();

    let err = h.set(D1, "test_project1", A).unwrap_err();
    assert_eq!(err, KernelError::Rejected(RejectionReason::DuplicateDelegate));
    assert_eq!(h.total(D1, "test_project1"), 1);
    assert_eq!(h.events.len(), 1, "Rejected commands must not emit events");
}

#[test]
fn test_self_and_zero_always_rejected() {
    let mut h = Harness::new();

    let err = h.set(D1, "test_project1", D1).unwrap_err();
    assert_eq!(err, KernelError::Rejected(RejectionReason::SelfDelegation));

    let err = h
        .submit(crate::state::command::Command::SetDelegate {
            delegator: addr(D1),
            space: space("test_project1"),
            delegate: Address::ZERO,
        })
        .unwrap_err();
    assert_eq!(err, KernelError::Rejected(RejectionReason::ZeroAddress));
    assert!(h.events.is_empty());
}

#[test]
fn test_clear_non_member_not_found() {
    let mut h = Harness::new();

    // Nonexistent set.
    let err = h.clear(D1, "test_project1", A).unwrap_err();
    assert_eq!(err, KernelError::Rejected(RejectionReason::DelegateNotFound));

    // Existing set, different member.
    h.set(D1, "test_project1", A).unwrap();
    let err = h.clear(D1, "test_project1", B).unwrap_err();
    assert_eq!(err, KernelError::Rejected(RejectionReason::DelegateNotFound));
    assert_eq!(h.total(D1, "test_project1"), 1);
}

#[test]
fn test_clear_all_on_empty_emits_one_event() {
    let mut h = Harness::new();
    h.clear_all(D2, "test_project1").unwrap();

    assert_eq!(h.events.len(), 1);
    assert!(matches!(h.events[0].kind, EventKind::ClearAllDelegates { .. }));
    assert_eq!(h.total(D2, "test_project1"), 0);
}

#[test]
fn test_independence_of_keys() {
    let mut h = Harness::new();
    h.set(D2, "test_project1", A).unwrap();
    h.set(D2, "test_project1", B).unwrap();
    h.set(D1, "test_project1", B).unwrap();
    h.set(D1, "test_project2", A).unwrap();

    h.clear(D2, "test_project1", B).unwrap();
    assert_eq!(h.total(D2, "test_project1"), 1);
    assert_eq!(h.total(D1, "test_project1"), 1);
    assert_eq!(h.total(D1, "test_project2"), 1);

    h.clear_all(D1, "test_project1").unwrap();
    assert_eq!(h.total(D2, "test_project1"), 1);
    assert_eq!(h.total(D1, "test_project1"), 0);
    assert_eq!(h.total(D1, "test_project2"), 1);
}

#[test]
fn test_same_delegate_for_different_delegators() {
    let mut h = Harness::new();
    h.set(D1, "test_project1", A).unwrap();
    h.set(D2, "test_project1", A).unwrap();

    assert_eq!(h.total(D1, "test_project1"), 1);
    assert_eq!(h.total(D2, "test_project1"), 1);
}

#[test]
fn test_empty_label_space_is_valid_and_distinct() {
    let mut h = Harness::new();
    h.set(D1, "", A).unwrap();

    assert_eq!(h.total(D1, ""), 1);
    assert_eq!(h.total(D1, "test_project1"), 0);
    assert_eq!(space(""), crate::types::SpaceId([0u8; 32]));
}
