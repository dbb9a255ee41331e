//! Checkpoint body decoding.

use crate::error::{KernelError, Result};
use crate::index::IndexView;
use crate::snapshot::{HEADER_LEN, MAGIC, SCHEMA_VERSION};

pub fn decode_view(buf: &[u8]) -> Result<IndexView> {
    if buf.len() < HEADER_LEN || &buf[0..4] != MAGIC {
        return Err(KernelError::InvalidInput);
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&buf[4..8]);
    if u32::from_le_bytes(version) != SCHEMA_VERSION {
        return Err(KernelError::InvalidInput);
    }

    let (view, read) = bincode::serde::decode_from_slice::<IndexView, _>(&buf[HEADER_LEN..], bincode::config::standard())
        .map_err(|_| KernelError::InvalidInput)?;

    // Trailing bytes mean the body was not produced by encode_view.
    if HEADER_LEN + read != buf.len() {
        return Err(KernelError::InvalidInput);
    }
    Ok(view)
}
