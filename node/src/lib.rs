// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! delegation-node: the std runtime around the delegation kernel.
//!
//! A per-key-locked [`store::DelegationStore`] writes through an
//! [`events::EventLog`]; an [`indexer::IndexBuilder`] follows the log and
//! answers active-delegation queries. [`engine::Engine`] wires them up from a
//! [`config::NodeConfig`].

pub mod config;
pub mod errors;
pub mod clock;
pub mod telemetry;
pub mod events;
pub mod store;
pub mod indexer;
pub mod engine;

pub use config::{IndexMode, NodeConfig};
pub use engine::Engine;
pub use errors::{CheckpointError, RegistryError};
pub use store::DelegationStore;
