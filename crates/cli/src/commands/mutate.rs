use anyhow::Result;
use std::path::Path;

use delegation_kernel::MutationEvent;

use crate::engine::{format_space, format_timestamp, open_registry, parse_address, parse_space};

pub fn set(dir: &Path, delegator: &str, space: &str, delegate: &str) -> Result<MutationEvent> {
    let engine = open_registry(dir)?;
    let event = engine.set_delegate(parse_address(delegator)?, parse_space(space), parse_address(delegate)?)?;
    report(&event);
    Ok(event)
}

pub fn clear(dir: &Path, delegator: &str, space: &str, delegate: &str) -> Result<MutationEvent> {
    let engine = open_registry(dir)?;
    let event = engine.clear_delegate(parse_address(delegator)?, parse_space(space), parse_address(delegate)?)?;
    report(&event);
    Ok(event)
}

pub fn clear_all(dir: &Path, delegator: &str, space: &str) -> Result<MutationEvent> {
    let engine = open_registry(dir)?;
    let event = engine.clear_all_delegates(parse_address(delegator)?, parse_space(space))?;
    report(&event);
    Ok(event)
}

fn report(event: &MutationEvent) {
    let key = event.key();
    println!("\n{} committed at sequence {}", event.event_type(), event.sequence);
    println!("  delegator: {}", key.delegator);
    println!("  space:     {}", format_space(&key.space));
    if let Some(delegate) = event.delegate() {
        println!("  delegate:  {}", delegate);
    }
    println!("  time:      {}", format_timestamp(event.timestamp));
    println!("  tx:        {}\n", event.origin);
}
