//! JSON representations of commitment records.
//!
//! Different client versions have serialized the same record with
//! camelCase or snake_case keys, and digests as hex strings or byte
//! arrays. Reading tries the known shapes in order; the first that
//! matches wins.

use moat_core::{decode_identity, digest_from_hex, digest_from_slice, Digest, WireInt};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::CommitmentRecord;
use crate::{RegistryError, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum DigestRepr {
    Hex(String),
    Bytes(Vec<u8>),
}

impl DigestRepr {
    fn into_digest(self, field: &'static str) -> moat_core::Result<Digest> {
        match self {
            DigestRepr::Hex(s) => digest_from_hex(field, &s),
            DigestRepr::Bytes(b) => digest_from_slice(field, &b),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CamelRecord {
    creator: String,
    batch_id: WireInt,
    kind: Value,
    merkle_root: DigestRepr,
    memo_hash: DigestRepr,
    created_at: i64,
}

#[derive(Deserialize)]
struct SnakeRecord {
    creator: String,
    batch_id: WireInt,
    kind: Value,
    merkle_root: DigestRepr,
    memo_hash: DigestRepr,
    created_at: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordShape {
    Camel(CamelRecord),
    Snake(SnakeRecord),
}

impl RecordShape {
    fn into_record(self) -> moat_core::Result<CommitmentRecord> {
        let (creator, batch_id, kind, merkle_root, memo_hash, created_at) = match self {
            RecordShape::Camel(r) => (r.creator, r.batch_id, r.kind, r.merkle_root, r.memo_hash, r.created_at),
            RecordShape::Snake(r) => (r.creator, r.batch_id, r.kind, r.merkle_root, r.memo_hash, r.created_at),
        };
        Ok(CommitmentRecord {
            creator: decode_identity(&creator)?,
            batch_id: batch_id.to_u64("batchId")?,
            kind: moat_core::parse_kind_value(&kind)?,
            merkle_root: merkle_root.into_digest("merkleRoot")?,
            memo_hash: memo_hash.into_digest("memoHash")?,
            created_at,
        })
    }
}

impl CommitmentRecord {
    /// Parse a record produced by any known client.
    pub fn from_json(value: &Value) -> Result<Self> {
        let shape = RecordShape::deserialize(value)
            .map_err(|_| RegistryError::MalformedRecord("matches no known record shape".into()))?;
        shape
            .into_record()
            .map_err(|e| RegistryError::MalformedRecord(e.to_string()))
    }

    /// Canonical camelCase form with hex digests and a base58 creator.
    pub fn to_json(&self) -> Value {
        json!({
            "creator": bs58::encode(self.creator).into_string(),
            "batchId": self.batch_id,
            "kind": self.kind,
            "merkleRoot": moat_core::to_hex(&self.merkle_root),
            "memoHash": moat_core::to_hex(&self.memo_hash),
            "createdAt": self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CommitmentRecord {
        CommitmentRecord {
            creator: [1u8; 32],
            batch_id: 12,
            kind: 3,
            merkle_root: [0xAA; 32],
            memo_hash: [0xBB; 32],
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_camel_case_roundtrip() {
        let value = record().to_json();
        assert_eq!(CommitmentRecord::from_json(&value).unwrap(), record());
    }

    #[test]
    fn test_snake_case_with_byte_arrays() {
        let value = json!({
            "creator": "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi",
            "batch_id": "12",
            "kind": 3,
            "merkle_root": vec![0xAAu8; 32],
            "memo_hash": vec![0xBBu8; 32],
            "created_at": 1_700_000_000i64,
        });
        assert_eq!(CommitmentRecord::from_json(&value).unwrap(), record());
    }

    #[test]
    fn test_unknown_shape_is_malformed() {
        let value = json!({ "root": "00", "id": 1 });
        assert!(matches!(
            CommitmentRecord::from_json(&value),
            Err(RegistryError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_matching_shape_with_bad_digest_is_malformed() {
        let mut value = record().to_json();
        value["merkleRoot"] = json!("abcd");
        let err = CommitmentRecord::from_json(&value).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedRecord(_)));
        assert_eq!(err.kind(), moat_core::ErrorKind::Shape);
    }

    #[test]
    fn test_kind_out_of_range_is_malformed() {
        for bad in [json!(256), json!(1.5), json!("3")] {
            let mut value = record().to_json();
            value["kind"] = bad.clone();
            match CommitmentRecord::from_json(&value) {
                Err(RegistryError::MalformedRecord(msg)) => assert!(msg.contains("kind"), "{bad}: {msg}"),
                other => panic!("{bad}: {other:?}"),
            }
        }
    }
}
