use anyhow::Result;
use std::path::Path;

use delegation_persistence::checkpoint::CheckpointHeader;

use crate::engine::{format_timestamp, open_registry, short_hash};

pub fn run(dir: &Path) -> Result<CheckpointHeader> {
    let engine = open_registry(dir)?;
    let header = engine.checkpoint()?;

    println!("\nCheckpoint written");
    println!("  cursor: {}", header.next_sequence);
    println!("  time:   {}", format_timestamp(header.timestamp));
    println!("  bytes:  {}", header.body_len);
    println!("  hash:   {}\n", short_hash(&header.body_hash));
    Ok(header)
}
