use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use delegation_node::NodeConfig;
use delegation_persistence::{checkpoint, wal};

use crate::engine::{format_timestamp, short_hash};

/// Status report for a registry directory. Read-only.
pub fn run(dir: &Path) -> anyhow::Result<()> {
    let config = NodeConfig::for_dir(dir);
    let log_path = dir.join(NodeConfig::LOG_FILE);
    let ckpt_path = dir.join(NodeConfig::CHECKPOINT_FILE);

    println!("\nRegistry Status Report");
    println!("----------------------");
    println!("Directory: {}\n", dir.display());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Status", "Details"]);

    // 1. Event log
    let mut head = None;
    if log_path.exists() {
        match wal::scan(&log_path) {
            Ok(report) => {
                head = Some(report.next_sequence);
                let status = if report.torn_tail { "TORN TAIL" } else { "FOUND" };
                let msg = format!(
                    "{} events, next seq {}, {} bytes valid",
                    report.frames, report.next_sequence, report.valid_len
                );
                table.add_row(vec!["Event Log", status, &msg]);
            }
            Err(e) => {
                table.add_row(vec!["Event Log", "CORRUPT", &e.to_string()]);
            }
        }
    } else {
        table.add_row(vec!["Event Log", "MISSING", ""]);
    }

    // 2. Checkpoint
    if ckpt_path.exists() {
        match checkpoint::read_checkpoint(&ckpt_path) {
            Ok((header, body)) => {
                let msg = format!(
                    "Cursor: {}, Ts: {}, Body: {} bytes, Hash: {}",
                    header.next_sequence,
                    format_timestamp(header.timestamp),
                    body.len(),
                    short_hash(&header.body_hash)
                );
                table.add_row(vec!["Checkpoint", "FOUND", &msg]);

                if let Some(head) = head {
                    let lag = head.saturating_sub(header.next_sequence);
                    let status = if header.next_sequence > head { "AHEAD" } else { "OK" };
                    table.add_row(vec!["Checkpoint Lag", status, &format!("{} events behind log", lag)]);
                }
            }
            Err(e) => {
                table.add_row(vec!["Checkpoint", "CORRUPT", &e.to_string()]);
            }
        }
    } else {
        table.add_row(vec!["Checkpoint", "MISSING", ""]);
    }

    println!("{table}\n");
    println!("Checkpoint interval: {} events\n", config.checkpoint_interval);
    Ok(())
}
