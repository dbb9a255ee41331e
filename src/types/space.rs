//! 32-byte delegation namespace.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::types::{parse_hex, write_hex};

/// Opaque namespace scoping a delegation set.
///
/// No structural meaning. The all-zero space is an ordinary, valid space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SpaceId(pub [u8; 32]);

impl SpaceId {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        SpaceId(bytes)
    }

    /// Converts a human-readable label to a space.
    ///
    /// UTF-8 bytes, truncated to 32, right-padded with zeros. The empty
    /// label maps to the all-zero space.
    pub fn from_label(label: &str) -> Self {
        let bytes = label.as_bytes();
        let len = bytes.len().min(Self::LEN);
        let mut out = [0u8; 32];
        out[..len].copy_from_slice(&bytes[..len]);
        SpaceId(out)
    }

    /// Accepts either `0x` + 64 hex digits or a label.
    pub fn parse(input: &str) -> Self {
        if input.starts_with("0x") || input.starts_with("0X") {
            if let Some(bytes) = parse_hex::<32>(input) {
                return SpaceId(bytes);
            }
        }
        Self::from_label(input)
    }

    /// The label this space was built from, if it round-trips as UTF-8.
    pub fn label(&self) -> Option<&str> {
        let end = self.0.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        let text = core::str::from_utf8(&self.0[..end]).ok()?;
        if text.contains('\0') {
            None
        } else {
            Some(text)
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for SpaceId {
    fn from(bytes: [u8; 32]) -> Self {
        SpaceId(bytes)
    }
}

impl FromStr for SpaceId {
    type Err = KernelError;

    /// Strict hex form only; use [`SpaceId::parse`] for labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex::<32>(s).map(SpaceId).ok_or(KernelError::InvalidInput)
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl fmt::Debug for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "SpaceId({:?})", label),
            None => write!(f, "SpaceId({})", self),
        }
    }
}
