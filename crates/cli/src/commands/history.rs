use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;

use delegation_kernel::index::EventEntity;

use crate::engine::{format_space, format_timestamp, open_registry, parse_address, short_hash};

/// Every recorded event of one delegator, cleared ones included.
pub fn run(dir: &Path, delegator: &str) -> anyhow::Result<Vec<EventEntity>> {
    let engine = open_registry(dir)?;
    let delegator = parse_address(delegator)?;
    let entities = engine.entities_by_delegator(&delegator);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Block", "Event", "Space", "Delegate", "Time", "Tx"]);

    for entity in &entities {
        table.add_row(vec![
            entity.block_number.to_string(),
            entity.event_type.to_string(),
            format_space(&entity.space),
            entity.delegate.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            format_timestamp(entity.block_timestamp),
            short_hash(&entity.transaction_hash.0),
        ]);
    }

    println!("\nHistory of {} ({} events)\n", delegator, entities.len());
    println!("{table}\n");
    Ok(entities)
}
