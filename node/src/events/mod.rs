// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event-Sourced Persistence Layer
//!
//! # Architecture
//! - Event Log = Primary truth (append-only, durable)
//! - Registry state = replay of the log through the validation rules
//! - Index checkpoints = Performance optimization (disposable)

pub mod event_log;
pub mod event_replay;

pub use event_log::{EventLog, EventLogError, EventStream, FileEventLog, MemoryEventLog};
pub use event_replay::{rebuild_index, recover_registry, resume_index, verify_consistency};
