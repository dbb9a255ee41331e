//! Index checkpoint files.
//!
//! ```text
//! [CheckpointHeader: 64 bytes][body]
//! ```
//!
//! The body is an encoded index view; its BLAKE3 hash is stored in the
//! header and checked on read. Files are replaced atomically (write to a
//! sibling temp file, fsync, rename).

use crate::error::{PersistenceError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use delegation_kernel::verify::checkpoint_hash;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointHeader {
    pub magic: [u8; 4],
    pub version: u32,
    /// Cursor of the checkpointed view: the first sequence not included.
    pub next_sequence: u64,
    pub timestamp: u64,
    pub body_hash: [u8; 32],
    pub body_len: u64,
}

impl CheckpointHeader {
    pub const SIZE: usize = 4 + 4 + 8 + 8 + 32 + 8; // 64 bytes
    pub const MAGIC: [u8; 4] = *b"DRGC";

    pub fn new(next_sequence: u64, timestamp: u64, body: &[u8]) -> Self {
        Self {
            magic: Self::MAGIC,
            version: 1,
            next_sequence,
            timestamp,
            body_hash: checkpoint_hash(body),
            body_len: body.len() as u64,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.extend_from_slice(&self.magic);
        // Writes into a Vec are infallible.
        let _ = buf.write_u32::<LittleEndian>(self.version);
        let _ = buf.write_u64::<LittleEndian>(self.next_sequence);
        let _ = buf.write_u64::<LittleEndian>(self.timestamp);
        buf.extend_from_slice(&self.body_hash);
        let _ = buf.write_u64::<LittleEndian>(self.body_len);
        buf
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != Self::MAGIC {
            return Err(PersistenceError::InvalidMagic);
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != 1 {
            return Err(PersistenceError::UnsupportedVersion(version));
        }
        let next_sequence = reader.read_u64::<LittleEndian>()?;
        let timestamp = reader.read_u64::<LittleEndian>()?;
        let mut body_hash = [0u8; 32];
        reader.read_exact(&mut body_hash)?;
        let body_len = reader.read_u64::<LittleEndian>()?;

        Ok(Self {
            magic,
            version,
            next_sequence,
            timestamp,
            body_hash,
            body_len,
        })
    }
}

pub fn write_to(path: impl AsRef<Path>, header: &CheckpointHeader, body: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&header.to_bytes())?;
        file.write_all(body)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_header(path: impl AsRef<Path>) -> Result<CheckpointHeader> {
    let file = File::open(path)?;
    CheckpointHeader::read_from(file)
}

/// Reads header and body, verifying length and hash.
pub fn read_checkpoint(path: impl AsRef<Path>) -> Result<(CheckpointHeader, Vec<u8>)> {
    let mut file = File::open(path)?;
    let header = CheckpointHeader::read_from(&mut file)?;
    let mut body = Vec::new();
    file.read_to_end(&mut body)?;

    if body.len() as u64 != header.body_len {
        return Err(PersistenceError::InvalidFormat(format!(
            "checkpoint body is {} bytes, header says {}",
            body.len(),
            header.body_len
        )));
    }
    if checkpoint_hash(&body) != header.body_hash {
        return Err(PersistenceError::HashMismatch);
    }
    Ok((header, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_checkpoint_header_serialization() {
        let header = CheckpointHeader::new(100, 1234567890, b"body");
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), CheckpointHeader::SIZE);

        let decoded = CheckpointHeader::read_from(&bytes[..]).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = [0u8; CheckpointHeader::SIZE];
        bytes[0..4].copy_from_slice(b"BADM");
        let result = CheckpointHeader::read_from(&bytes[..]);
        assert!(matches!(result, Err(PersistenceError::InvalidMagic)));
    }

    #[test]
    fn test_tampered_body_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.ckpt");
        let body = b"some view bytes".to_vec();
        write_to(&path, &CheckpointHeader::new(3, 0, &body), &body).unwrap();

        let (header, read_back) = read_checkpoint(&path).unwrap();
        assert_eq!(header.next_sequence, 3);
        assert_eq!(read_back, body);

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(read_checkpoint(&path), Err(PersistenceError::HashMismatch)));
    }

    #[test]
    fn test_rewrite_replaces_previous() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.ckpt");
        write_to(&path, &CheckpointHeader::new(1, 0, b"one"), b"one").unwrap();
        write_to(&path, &CheckpointHeader::new(2, 0, b"two!"), b"two!").unwrap();

        let (header, body) = read_checkpoint(&path).unwrap();
        assert_eq!(header.next_sequence, 2);
        assert_eq!(body, b"two!");
        assert!(!path.with_extension("tmp").exists());
    }
}
