use anyhow::Result;
use std::path::Path;

use crate::engine::{format_space, open_registry, parse_address, parse_space};

pub fn run(dir: &Path, delegator: &str, space: &str) -> Result<usize> {
    let engine = open_registry(dir)?;
    let delegator = parse_address(delegator)?;
    let space = parse_space(space);

    let total = engine.get_total_delegates(&delegator, &space);
    println!("{} delegate(s) for {} in {}", total, delegator, format_space(&space));
    Ok(total)
}
