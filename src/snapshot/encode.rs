//! Checkpoint body encoding.

use alloc::vec::Vec;

use crate::error::{KernelError, Result};
use crate::index::IndexView;
use crate::snapshot::{HEADER_LEN, MAGIC, SCHEMA_VERSION};

pub fn encode_view(view: &IndexView) -> Result<Vec<u8>> {
    let body = bincode::serde::encode_to_vec(view, bincode::config::standard())
        .map_err(|_| KernelError::InvalidInput)?;

    let mut buf = Vec::with_capacity(HEADER_LEN + body.len());
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}
