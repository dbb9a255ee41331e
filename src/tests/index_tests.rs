// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::collections::BTreeSet;

use crate::replay::rebuild_view;
use crate::tests::{addr, space, Harness};

const D: u8 = 0x0D;
const A: u8 = 0xA1;
const B: u8 = 0xA2;
const C: u8 = 0xA3;

#[test]
fn test_clear_all_drops_only_its_group() {
    let mut h = Harness::new();
    h.set(D, "S2", C).unwrap();
    h.set(D, "S", A).unwrap();
    h.set(D, "S", B).unwrap();

    assert_eq!(h.total(D, "S"), 2);
    let expected: BTreeSet<_> = [addr(A), addr(B)].into_iter().collect();
    assert_eq!(h.view.list_active(&addr(D), &space("S")), expected);

    h.clear_all(D, "S").unwrap();

    assert_eq!(h.total(D, "S"), 0);
    assert!(h.view.list_active(&addr(D), &space("S")).is_empty());

    let remaining: BTreeSet<_> = [addr(C)].into_iter().collect();
    assert_eq!(h.view.list_active(&addr(D), &space("S2")), remaining);
    assert_eq!(h.total(D, "S2"), 1);
    assert_eq!(h.view.active_count(), 1);
}

#[test]
fn test_same_delegate_two_spaces_two_records() {
    let mut h = Harness::new();
    h.set(D, "S1", A).unwrap();
    h.set(D, "S2", A).unwrap();

    let r1 = h.view.record(&addr(D), &space("S1"), &addr(A)).copied().unwrap();
    let r2 = h.view.record(&addr(D), &space("S2"), &addr(A)).copied().unwrap();
    assert_ne!(r1, r2);
    assert_eq!(r1.sequence, 0);
    assert_eq!(r2.sequence, 1);

    h.clear(D, "S1", A).unwrap();
    assert!(!h.view.is_active(&addr(D), &space("S1"), &addr(A)));
    assert!(h.view.is_active(&addr(D), &space("S2"), &addr(A)));
}

#[test]
fn test_reset_after_clear_all_gets_new_record() {
    let mut h = Harness::new();
    h.set(D, "S", A).unwrap();
    h.clear_all(D, "S").unwrap();
    h.set(D, "S", A).unwrap();

    let record = h.view.record(&addr(D), &space("S"), &addr(A)).unwrap();
    assert_eq!(record.sequence, 2);
}

#[test]
fn test_rebuild_matches_incremental() {
    let mut h = Harness::new();
    h.set(D, "S", A).unwrap();
    h.set(D, "S", B).unwrap();
    h.set(D, "S2", C).unwrap();
    let _ = h.set(D, "S", A);
    h.clear(D, "S", B).unwrap();
    h.clear_all(D, "S2").unwrap();
    h.clear_all(D, "never-used").unwrap();

    let rebuilt = rebuild_view(&h.events).unwrap();
    assert_eq!(rebuilt, h.view);
}

#[test]
fn test_view_matches_registry_membership() {
    let mut h = Harness::new();
    h.set(D, "S", A).unwrap();
    h.set(D, "S", B).unwrap();
    h.set(0x0E, "S", A).unwrap();
    h.clear(D, "S", A).unwrap();

    for (key, set) in h.state.iter() {
        let listed = h.view.list_active(&key.delegator, &key.space);
        let members: BTreeSet<_> = set.iter().copied().collect();
        assert_eq!(listed, members);
    }
}
