//! Identity types.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::types::{write_hex, Address, SpaceId};

/// Identifies one delegation set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DelegationKey {
    pub delegator: Address,
    pub space: SpaceId,
}

impl DelegationKey {
    pub const fn new(delegator: Address, space: SpaceId) -> Self {
        Self { delegator, space }
    }
}

/// Origin transaction id carried by every event.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TxId(pub [u8; 32]);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self)
    }
}
