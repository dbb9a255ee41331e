// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Index view checkpoint bodies.
//!
//! ```text
//! [Magic: 4][SchemaVersion: u32 LE][bincode(IndexView)]
//! ```
pub mod encode;
pub mod decode;

pub const MAGIC: &[u8; 4] = b"DRGV";
pub const SCHEMA_VERSION: u32 = 1;
pub(crate) const HEADER_LEN: usize = 8;
