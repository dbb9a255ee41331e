// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Read models derived from the event stream.
//!
//! - [`view::IndexView`]: currently-active delegations, grouped by key
//! - [`entities::EntityLog`]: one raw record per event, never deleted
//!
//! Both are projections of the same ordered stream and are independent of
//! each other.

pub mod view;
pub mod entities;

pub use entities::{EntityLog, EventEntity};
pub use view::{reduce, ApplyOutcome, IndexRecord, IndexView};
