//! On-disk scenarios for tests and tooling.

use crate::checkpoint::{self, CheckpointHeader};
use crate::codec::encode_event;
use crate::error::Result;
use crate::wal::{self, LogHeader};

use delegation_kernel::replay::rebuild_view;
use delegation_kernel::snapshot::encode::encode_view;
use delegation_kernel::state::command::Command;
use delegation_kernel::{Address, MutationEvent, RegistryState, SpaceId};

use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const BASE_TIMESTAMP: u64 = 1_700_000_000;

pub struct TestPaths {
    pub log: PathBuf,
    pub checkpoint: PathBuf,
}

pub fn fixture_address(b: u8) -> Address {
    Address([b; 20])
}

/// The command sequence behind [`generate_test_scenario`].
///
/// Delegator `0x01..` sets three delegates in `project`, clears one, adds one
/// in the zero space, then clears everything in `project`. A second
/// delegator ends with one active delegate.
pub fn scenario_commands() -> Vec<Command> {
    let alice = fixture_address(1);
    let bob = fixture_address(2);
    let project = SpaceId::from_label("project");
    let zero = SpaceId::from_label("");

    vec![
        Command::SetDelegate { delegator: alice, space: project, delegate: fixture_address(0xA1) },
        Command::SetDelegate { delegator: alice, space: project, delegate: fixture_address(0xA2) },
        Command::SetDelegate { delegator: alice, space: project, delegate: fixture_address(0xA3) },
        Command::ClearDelegate { delegator: alice, space: project, delegate: fixture_address(0xA2) },
        Command::SetDelegate { delegator: bob, space: project, delegate: fixture_address(0xB1) },
        Command::SetDelegate { delegator: alice, space: zero, delegate: fixture_address(0xA4) },
        Command::ClearAllDelegates { delegator: alice, space: project },
        Command::SetDelegate { delegator: bob, space: zero, delegate: fixture_address(0xB2) },
    ]
}

/// Runs the commands through a registry, sealing one event per accepted
/// command.
pub fn build_events(commands: &[Command]) -> Result<Vec<MutationEvent>> {
    let mut state = RegistryState::new();
    let mut events = Vec::with_capacity(commands.len());
    for cmd in commands {
        state.apply(cmd)?;
        let sequence = events.len() as u64;
        events.push(MutationEvent::seal(sequence, BASE_TIMESTAMP + sequence, cmd.to_event_kind()));
    }
    Ok(events)
}

/// Writes a fresh log file holding `events`.
pub fn write_log(path: &Path, events: &[MutationEvent]) -> Result<()> {
    let mut file = File::create(path)?;
    LogHeader::new().write_to(&mut file)?;
    for event in events {
        wal::append_frame(&mut file, event.sequence, &encode_event(event)?)?;
    }
    file.sync_all()?;
    Ok(())
}

/// Writes a checkpoint of the view built from `events`.
pub fn write_checkpoint(path: &Path, events: &[MutationEvent]) -> Result<()> {
    let view = rebuild_view(events)?;
    let body = encode_view(&view)?;
    let timestamp = events.last().map_or(0, |e| e.timestamp);
    let header = CheckpointHeader::new(view.next_sequence(), timestamp, &body);
    checkpoint::write_to(path, &header, &body)
}

/// Generates a log of the scenario commands and a checkpoint covering the
/// first half of it.
pub fn generate_test_scenario(dir: &Path) -> Result<TestPaths> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    let events = build_events(&scenario_commands())?;

    let log_path = dir.join("events.log");
    write_log(&log_path, &events)?;

    let checkpoint_path = dir.join("index.ckpt");
    write_checkpoint(&checkpoint_path, &events[..events.len() / 2])?;

    Ok(TestPaths {
        log: log_path,
        checkpoint: checkpoint_path,
    })
}
