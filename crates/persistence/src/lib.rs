//! On-disk formats for the delegation registry.
//!
//! - [`wal`]: the event log file, a header followed by checksummed frames
//! - [`codec`]: frame payload encoding for mutation events
//! - [`checkpoint`]: index view checkpoint files
pub mod error;
pub mod codec;
pub mod wal;
pub mod checkpoint;
pub mod fixtures;

pub use error::{PersistenceError, Result};
