use anyhow::{Context, Result};
use std::path::Path;

use delegation_kernel::{Address, SpaceId};
use delegation_node::{Engine, NodeConfig};

/// Opens (creating if needed) the registry stored in `dir`.
///
/// The index is resumed from the directory's checkpoint when one is usable.
pub fn open_registry(dir: &Path) -> Result<Engine> {
    tracing::debug!(dir = %dir.display(), "opening registry");
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    Engine::open(NodeConfig::for_dir(dir)).with_context(|| format!("Failed to open registry at {}", dir.display()))
}

pub fn parse_address(input: &str) -> Result<Address> {
    input
        .parse::<Address>()
        .map_err(|_| anyhow::anyhow!("Invalid address {:?}: expected 0x followed by 40 hex digits", input))
}

/// `0x` + 64 hex digits, or any other text as a label.
pub fn parse_space(input: &str) -> SpaceId {
    SpaceId::parse(input)
}

pub fn format_space(space: &SpaceId) -> String {
    match space.label() {
        Some("") => "(empty)".to_string(),
        Some(label) => format!("{:?}", label),
        None => space.to_string(),
    }
}

pub fn format_timestamp(secs: u64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub fn short_hash(hash: &[u8]) -> String {
    hex::encode(&hash[..hash.len().min(8)])
}
