use delegation_kernel::KernelError;
use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Invalid magic bytes in header")]
    InvalidMagic,
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),
    #[error("Checksum mismatch at sequence {sequence}: expected {expected}, found {found}")]
    ChecksumMismatch {
        sequence: u64,
        expected: u64,
        found: u64,
    },
    #[error("Incomplete frame at offset {offset}")]
    TornTail { offset: u64 },
    #[error("Checkpoint body hash mismatch")]
    HashMismatch,
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
    #[error("Kernel error: {0}")]
    Kernel(KernelError),
}

impl From<KernelError> for PersistenceError {
    fn from(e: KernelError) -> Self {
        PersistenceError::Kernel(e)
    }
}

impl PersistenceError {
    /// True for a frame cut short by a crash mid-write.
    pub fn is_torn_tail(&self) -> bool {
        matches!(self, PersistenceError::TornTail { .. })
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
