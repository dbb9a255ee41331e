//! 20-byte account address.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::KernelError;
use crate::types::{parse_hex, write_hex};

/// An account identifier, compared by exact byte equality.
///
/// The all-zero value is reserved and is never a valid delegate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const LEN: usize = 20;
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex::<20>(s).map(Address).ok_or(KernelError::InvalidInput)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}
