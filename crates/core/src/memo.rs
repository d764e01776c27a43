//! Memo digest: SHA-256 over the canonical JSON of the batch memo.

use serde::Serialize;
use sha2::{Digest as _, Sha256};

use crate::error::{MoatError, Result};
use crate::types::{Digest, Memo};

/// Key order and names are part of the compatibility contract.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalMemo<'a> {
    title: &'a str,
    note: &'a str,
    created_at: &'a str,
}

/// `{"title":"…","note":"…","createdAt":"…"}` with no whitespace.
pub fn canonical_memo_json(memo: &Memo) -> Result<String> {
    let canonical = CanonicalMemo {
        title: memo.title.as_deref().unwrap_or(""),
        note: memo.note.as_deref().unwrap_or(""),
        created_at: &memo.created_at,
    };
    serde_json::to_string(&canonical).map_err(|e| MoatError::Serialization(e.to_string()))
}

pub fn hash_memo(memo: &Memo) -> Result<Digest> {
    let json = canonical_memo_json(memo)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(hasher.finalize().into())
}
