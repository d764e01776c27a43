//! Moat Core
//!
//! Commitment construction for payout batches. A batch is reduced to two
//! 32-byte digests that are anchored on-chain:
//!
//! - **Merkle root** over one leaf per recipient line item
//!   (`SHA256(MOAT_LEAF_V1 || creator || batch_id_le || index_le || recipient || amount || asset)`)
//! - **Memo digest** over the canonical JSON of the batch memo
//!
//! Anyone holding the original batch data recomputes both digests and
//! compares them against the stored commitment. Everything in this crate
//! is pure and synchronous; it never touches the network.

pub mod codec;
pub mod error;
pub mod leaf;
pub mod memo;
pub mod merkle;
pub mod plan;
pub mod types;

pub use codec::{
    checked_u32, checked_u64, decode_identity, encode_identity, encode_str, encode_u32, encode_u64,
};
pub use error::{ErrorKind, MoatError, Result};
pub use leaf::{hash_leaf, leaf_preimage, position_leaf, LEAF_DOMAIN_PREFIX};
pub use memo::{canonical_memo_json, hash_memo};
pub use merkle::{compute_root, hash_pair};
pub use plan::{BatchCommitment, BatchPlan, PlanDocument, WireInt};
pub use types::*;
