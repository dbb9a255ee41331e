use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::collections::BTreeSet;
use std::path::Path;

use delegation_kernel::Address;

use crate::engine::{format_space, format_timestamp, open_registry, parse_address, parse_space};

/// Lists active delegates from the index.
pub fn run(dir: &Path, delegator: &str, space: &str) -> anyhow::Result<BTreeSet<Address>> {
    let engine = open_registry(dir)?;
    let delegator = parse_address(delegator)?;
    let space = parse_space(space);

    let active = engine.list_active_delegates(&delegator, &space);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Delegate", "Since Seq", "Since"]);

    for delegate in &active {
        let (seq, ts) = engine
            .record(&delegator, &space, delegate)
            .map(|r| (r.sequence.to_string(), format_timestamp(r.timestamp)))
            .unwrap_or_default();
        table.add_row(vec![delegate.to_string(), seq, ts]);
    }

    println!("\nActive delegates of {} in {}\n", delegator, format_space(&space));
    println!("{table}\n");
    Ok(active)
}
