//! Per-recipient leaf hashing.
//!
//! Preimage layout (byte-exact across implementations):
//!
//! ```text
//! MOAT_LEAF_V1 | creator (32) | batch_id (8, LE) | index (4, LE) | recipient_id | amount | asset_id
//! ```
//!
//! The variable-length strings are concatenated without separators. The
//! encoding is only injective while those fields come from a constrained
//! character set; adding length prefixes would change every committed root,
//! so any such change needs a new domain prefix.

use sha2::{Digest as _, Sha256};

use crate::codec::{checked_u32, encode_str, encode_u32, encode_u64};
use crate::error::Result;
use crate::types::{Digest, Identity, Recipient};

/// Domain separation tag mixed into every leaf.
pub const LEAF_DOMAIN_PREFIX: &[u8] = b"MOAT_LEAF_V1";

/// Build the exact byte string that is hashed into a leaf.
pub fn leaf_preimage(creator: &Identity, batch_id: u64, index: u32, recipient: &Recipient) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
        LEAF_DOMAIN_PREFIX.len()
            + 32
            + 8
            + 4
            + recipient.recipient_id.len()
            + recipient.amount.len()
            + recipient.asset_id.len(),
    );
    buf.extend_from_slice(LEAF_DOMAIN_PREFIX);
    buf.extend_from_slice(creator);
    buf.extend_from_slice(&encode_u64(batch_id));
    buf.extend_from_slice(&encode_u32(index));
    buf.extend_from_slice(encode_str(&recipient.recipient_id));
    buf.extend_from_slice(encode_str(&recipient.amount));
    buf.extend_from_slice(encode_str(&recipient.asset_id));
    buf
}

/// `SHA256(leaf_preimage(..))`
pub fn hash_leaf(creator: &Identity, batch_id: u64, index: u32, recipient: &Recipient) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(leaf_preimage(creator, batch_id, index, recipient));
    hasher.finalize().into()
}

/// Hash the recipient at `position` in a batch, rejecting positions that
/// do not fit the 4-byte index field.
pub fn position_leaf(
    creator: &Identity,
    batch_id: u64,
    position: usize,
    recipient: &Recipient,
) -> Result<Digest> {
    let index = checked_u32("index", position as u128)?;
    Ok(hash_leaf(creator, batch_id, index, recipient))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MoatError;
    use crate::types::to_hex;

    const SOL: &str = "solana:devnet:So11111111111111111111111111111111111111112";

    #[test]
    fn test_preimage_layout() {
        let creator = [0xC0u8; 32];
        let r = Recipient::new("R", "2", "A");
        let pre = leaf_preimage(&creator, 0x0102, 3, &r);

        assert_eq!(&pre[..12], b"MOAT_LEAF_V1");
        assert_eq!(&pre[12..44], &creator);
        assert_eq!(&pre[44..52], &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&pre[52..56], &[3, 0, 0, 0]);
        assert_eq!(&pre[56..], b"R2A");
    }

    #[test]
    fn test_published_vector() {
        let r = Recipient::new("solana:devnet:R1", "1.25", SOL);
        let leaf = hash_leaf(&[1u8; 32], 0, 0, &r);
        assert_eq!(
            to_hex(&leaf),
            "f018a091eb77e30a1e46f5cc6aca453281df31f57bf8c10ff6e6485b70282953"
        );
    }

    #[test]
    fn test_position_is_hashed() {
        let r = Recipient::new("solana:devnet:R1", "1.25", SOL);
        assert_ne!(hash_leaf(&[1u8; 32], 0, 0, &r), hash_leaf(&[1u8; 32], 0, 1, &r));
    }

    #[test]
    fn test_creator_and_batch_are_hashed() {
        let r = Recipient::new("solana:devnet:R1", "1.25", SOL);
        let base = hash_leaf(&[1u8; 32], 0, 0, &r);
        assert_ne!(base, hash_leaf(&[2u8; 32], 0, 0, &r));
        assert_ne!(base, hash_leaf(&[1u8; 32], 1, 0, &r));
    }

    #[test]
    fn test_no_normalization() {
        let a = hash_leaf(&[1u8; 32], 0, 0, &Recipient::new("r", "1.25", "a"));
        let b = hash_leaf(&[1u8; 32], 0, 0, &Recipient::new("r", "1.250", "a"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_unframed_strings_collide() {
        // Field boundaries are implicit: moving a byte between adjacent
        // fields yields the same preimage.
        let a = Recipient::new("ab", "1", "x");
        let b = Recipient::new("a", "b1", "x");
        assert_eq!(leaf_preimage(&[0u8; 32], 0, 0, &a), leaf_preimage(&[0u8; 32], 0, 0, &b));
    }

    #[test]
    fn test_position_out_of_range() {
        let r = Recipient::new("r", "1", "a");
        assert!(position_leaf(&[0u8; 32], 0, 7, &r).is_ok());
        if usize::BITS > 32 {
            let too_far = u32::MAX as usize + 1;
            assert!(matches!(
                position_leaf(&[0u8; 32], 0, too_far, &r),
                Err(MoatError::OutOfRange { field: "index", .. })
            ));
        }
    }
}
