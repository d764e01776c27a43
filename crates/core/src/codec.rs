//! Byte codec for leaf preimages.
//!
//! Integers are little-endian, identities are their raw 32 bytes and
//! strings are raw UTF-8 with no length prefix and no terminator. There
//! are no delimiters: field order is the only framing, so the order in
//! [`crate::leaf::leaf_preimage`] is part of the protocol and only changes
//! together with the domain prefix version.

use crate::error::{MoatError, Result};
use crate::types::Identity;

/// 4 bytes, little-endian.
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

/// 8 bytes, little-endian.
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Raw UTF-8 bytes: no length prefix, no terminator.
pub fn encode_str(value: &str) -> &[u8] {
    value.as_bytes()
}

/// Narrow a wide integer into u32, failing with `OutOfRange`.
pub fn checked_u32(field: &'static str, value: u128) -> Result<u32> {
    u32::try_from(value).map_err(|_| MoatError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

/// Narrow a wide integer into u64, failing with `OutOfRange`.
pub fn checked_u64(field: &'static str, value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| MoatError::OutOfRange {
        field,
        value: value.to_string(),
    })
}

/// Canonical fixed-width form of an identity.
pub fn encode_identity(bytes: &[u8]) -> Result<Identity> {
    bytes.try_into().map_err(|_| MoatError::InvalidLength {
        expected: 32,
        actual: bytes.len(),
    })
}

/// Decode a base58 identity string into its 32 raw bytes.
pub fn decode_identity(s: &str) -> Result<Identity> {
    let bytes = bs58::decode(s)
        .into_vec()
        .map_err(|e| MoatError::InvalidIdentity(format!("{s}: {e}")))?;
    encode_identity(&bytes).map_err(|e| MoatError::InvalidIdentity(format!("{s}: {e}")))
}
