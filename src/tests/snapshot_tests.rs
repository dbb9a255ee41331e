// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::KernelError;
use crate::index::IndexView;
use crate::snapshot::decode::decode_view;
use crate::snapshot::encode::encode_view;
use crate::tests::Harness;

fn populated() -> Harness {
    let mut h = Harness::new();
    h.set(1, "alpha", 2).unwrap();
    h.set(1, "alpha", 3).unwrap();
    h.set(4, "", 2).unwrap();
    h.clear_all(1, "beta").unwrap();
    h
}

#[test]
fn test_checkpoint_body_restores_view() {
    let h = populated();
    let body = encode_view(&h.view).unwrap();
    let restored = decode_view(&body).unwrap();

    assert_eq!(restored, h.view);
    assert_eq!(restored.next_sequence(), 4);
}

#[test]
fn test_empty_view_body() {
    let body = encode_view(&IndexView::new()).unwrap();
    assert_eq!(decode_view(&body).unwrap(), IndexView::new());
}

#[test]
fn test_bad_magic_rejected() {
    let mut body = encode_view(&populated().view).unwrap();
    body[0] = b'X';
    assert_eq!(decode_view(&body), Err(KernelError::InvalidInput));
}

#[test]
fn test_truncated_body_rejected() {
    let body = encode_view(&populated().view).unwrap();
    assert!(decode_view(&body[..body.len() - 3]).is_err());
    assert!(decode_view(&body[..4]).is_err());
}

#[test]
fn test_trailing_garbage_rejected() {
    let mut body = encode_view(&populated().view).unwrap();
    body.push(0);
    assert_eq!(decode_view(&body), Err(KernelError::InvalidInput));
}
