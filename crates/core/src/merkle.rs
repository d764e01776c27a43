//! Root aggregation over an ordered list of leaf digests.
//!
//! Internal nodes: `SHA256(left || right)`.
//! An odd-length level pairs its last node with itself; the node is never
//! promoted unchanged. A single leaf is its own root.

use sha2::{Digest as _, Sha256};

use crate::error::{MoatError, Result};
use crate::types::Digest;

/// Hash two child nodes to produce a parent.
pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Reduce one level into the next.
fn next_level(level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_pair(left, right),
            [last] => hash_pair(last, last),
            _ => unreachable!("chunks(2) yields one or two items"),
        })
        .collect()
}

/// Fold leaves into the Merkle root.
pub fn compute_root(leaves: &[Digest]) -> Result<Digest> {
    let (first, _) = leaves.split_first().ok_or(MoatError::EmptyInput)?;
    if leaves.len() == 1 {
        return Ok(*first);
    }

    let mut level = next_level(leaves);
    while level.len() > 1 {
        level = next_level(&level);
    }
    Ok(level[0])
}
