// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![no_std]

//! delegation-kernel: a deterministic, no_std delegation registry core.
//!
//! Holds the pieces that must behave identically wherever they run:
//! validation rules, the authoritative set-valued registry state machine,
//! the canonical mutation events, and the index view reducer that turns an
//! ordered event stream into the set of currently-active delegations.

extern crate alloc;

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod error;
pub mod types;
pub mod validate;
pub mod state;
pub mod event;
pub mod index;
pub mod verify;
pub mod snapshot;
pub mod replay;

#[cfg(test)]
pub mod tests;

pub use error::{KernelError, KernelResult, RejectionReason};
pub use event::{EventKind, MutationEvent};
pub use index::{IndexRecord, IndexView};
pub use state::registry::RegistryState;
pub use types::{Address, DelegationKey, SpaceId, TxId};
