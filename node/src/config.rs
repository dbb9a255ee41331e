use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the active-delegation index follows the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexMode {
    /// Each mutation is ingested by the caller's thread before it returns.
    Synchronous,
    /// A tokio task consumes the store's event subscription.
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// File-backed event log. `None` keeps the log in memory.
    pub event_log_path: Option<PathBuf>,
    pub checkpoint_path: Option<PathBuf>,
    /// Events between automatic index checkpoints. 0 disables them.
    pub checkpoint_interval: u64,
    pub index_mode: IndexMode,
}

impl NodeConfig {
    pub const LOG_FILE: &'static str = "events.log";
    pub const CHECKPOINT_FILE: &'static str = "index.ckpt";

    /// Layout of a registry data directory.
    pub fn for_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            event_log_path: Some(dir.join(Self::LOG_FILE)),
            checkpoint_path: Some(dir.join(Self::CHECKPOINT_FILE)),
            checkpoint_interval: 1024,
            index_mode: IndexMode::Synchronous,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            event_log_path: None,
            checkpoint_path: None,
            checkpoint_interval: 0,
            index_mode: IndexMode::Synchronous,
        }
    }
}
