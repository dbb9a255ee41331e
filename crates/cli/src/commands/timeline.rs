use anyhow::Context;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use delegation_kernel::MutationEvent;
use delegation_node::NodeConfig;
use delegation_persistence::codec::decode_event;
use delegation_persistence::wal;

use crate::engine::{format_space, format_timestamp, short_hash};

/// Reads events `[from, from + limit)` straight from the log file.
pub fn read_events(dir: &Path, from: u64, limit: Option<usize>) -> anyhow::Result<Vec<MutationEvent>> {
    let log_path = dir.join(NodeConfig::LOG_FILE);
    let frames = wal::read_stream(&log_path).with_context(|| format!("Failed to open {}", log_path.display()))?;

    let mut events = Vec::new();
    for frame in frames {
        let frame = match frame {
            Ok(frame) => frame,
            // Cut off by a crash mid-write; nothing after it is committed.
            Err(e) if e.is_torn_tail() => break,
            Err(e) => return Err(e.into()),
        };
        if frame.header.sequence < from {
            continue;
        }
        if limit.is_some_and(|limit| events.len() >= limit) {
            break;
        }
        events.push(decode_event(&frame.payload)?);
    }
    Ok(events)
}

pub fn run(dir: &Path, from: u64, limit: Option<usize>) -> anyhow::Result<()> {
    let events = read_events(dir, from, limit)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Seq", "Timestamp", "Event", "Delegator", "Space", "Delegate", "Tx"]);

    for event in &events {
        let key = event.key();
        table.add_row(vec![
            event.sequence.to_string(),
            format_timestamp(event.timestamp),
            event.event_type().to_string(),
            key.delegator.to_string(),
            format_space(&key.space),
            event.delegate().map(|d| d.to_string()).unwrap_or_else(|| "*".to_string()),
            short_hash(&event.origin.0),
        ]);
    }

    println!("\nEvent Timeline\n");
    println!("{table}\n");
    Ok(())
}
