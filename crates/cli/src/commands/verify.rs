use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use delegation_node::engine::{CheckpointStatus, VerifyReport};

use crate::engine::{open_registry, short_hash};

/// Rebuilds the index from sequence 0 and checks it against the live
/// index, the registry state and the checkpoint.
pub fn run(dir: &Path) -> anyhow::Result<VerifyReport> {
    let engine = open_registry(dir)?;
    let report = engine.verify()?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Check", "Result", "Details"]);

    table.add_row(vec![
        "Rebuild vs live index".to_string(),
        pass(report.index_matches_rebuild),
        format!("{} / {}", short_hash(&report.rebuilt_hash), short_hash(&report.live_hash)),
    ]);
    table.add_row(vec![
        "Registry vs index".to_string(),
        pass(report.registry_matches_index),
        format!("{} events replayed", report.log_head),
    ]);
    let (result, details) = match &report.checkpoint {
        CheckpointStatus::Missing => ("SKIPPED".to_string(), "no checkpoint".to_string()),
        CheckpointStatus::Matches { cursor } => (pass(true), format!("cursor {}", cursor)),
        CheckpointStatus::Diverged { cursor } => (pass(false), format!("diverges at cursor {}", cursor)),
        CheckpointStatus::Unreadable(e) => (pass(false), e.clone()),
    };
    table.add_row(vec!["Checkpoint vs replay".to_string(), result, details]);

    println!("{table}\n");

    if report.is_consistent() {
        println!("VERIFIED\n");
        Ok(report)
    } else {
        println!("INCONSISTENT\n");
        anyhow::bail!("registry verification failed")
    }
}

fn pass(ok: bool) -> String {
    if ok { "OK" } else { "MISMATCH" }.to_string()
}
