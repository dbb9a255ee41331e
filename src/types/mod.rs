//! Primitive identifiers.

pub mod address;
pub mod space;
pub mod id;

pub use address::Address;
pub use space::SpaceId;
pub use id::{DelegationKey, TxId};

use core::fmt;

/// Writes `bytes` as `0x`-prefixed lowercase hex.
pub(crate) fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    for b in bytes {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

/// Parses `0x`-prefixed (or bare) hex of exactly `N` bytes.
pub(crate) fn parse_hex<const N: usize>(s: &str) -> Option<[u8; N]> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.len() != N * 2 {
        return None;
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(digits, &mut out).ok()?;
    Some(out)
}
