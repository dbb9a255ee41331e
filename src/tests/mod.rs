// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod state_tests;
pub mod index_tests;
pub mod snapshot_tests;
pub mod property_tests;

use std::vec::Vec;

use crate::event::MutationEvent;
use crate::index::IndexView;
use crate::state::command::Command;
use crate::state::registry::RegistryState;
use crate::types::{Address, SpaceId};

pub(crate) fn addr(b: u8) -> Address {
    Address([b; 20])
}

pub(crate) fn space(label: &str) -> SpaceId {
    SpaceId::from_label(label)
}

/// Drives commands the way the live store does: validate + apply, seal an
/// event for every accepted command, feed it to the view immediately.
pub(crate) struct Harness {
    pub state: RegistryState,
    pub view: IndexView,
    pub events: Vec<MutationEvent>,
    pub rejected: usize,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            state: RegistryState::new(),
            view: IndexView::new(),
            events: Vec::new(),
            rejected: 0,
        }
    }

    pub fn submit(&mut self, cmd: Command) -> crate::error::Result<()> {
        match self.state.apply(&cmd) {
            Ok(_) => {
                let seq = self.events.len() as u64;
                let event = MutationEvent::seal(seq, 1_700_000_000 + seq, cmd.to_event_kind());
                self.view.apply(&event)?;
                self.events.push(event);
                Ok(())
            }
            Err(e) => {
                self.rejected += 1;
                Err(e)
            }
        }
    }

    pub fn set(&mut self, delegator: u8, label: &str, delegate: u8) -> crate::error::Result<()> {
        self.submit(Command::SetDelegate {
            delegator: addr(delegator),
            space: space(label),
            delegate: addr(delegate),
        })
    }

    pub fn clear(&mut self, delegator: u8, label: &str, delegate: u8) -> crate::error::Result<()> {
        self.submit(Command::ClearDelegate {
            delegator: addr(delegator),
            space: space(label),
            delegate: addr(delegate),
        })
    }

    pub fn clear_all(&mut self, delegator: u8, label: &str) -> crate::error::Result<()> {
        self.submit(Command::ClearAllDelegates {
            delegator: addr(delegator),
            space: space(label),
        })
    }

    pub fn total(&self, delegator: u8, label: &str) -> usize {
        self.state.total_delegates(&addr(delegator), &space(label))
    }
}
