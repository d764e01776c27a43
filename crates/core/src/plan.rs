//! Batch plans: the caller-facing JSON document and its validated form.

use serde::{Deserialize, Serialize};

use crate::codec::{checked_u64, decode_identity};
use crate::error::{MoatError, Result};
use crate::leaf::position_leaf;
use crate::memo::hash_memo;
use crate::merkle::compute_root;
use crate::types::{parse_kind_value, to_hex, Digest, Identity, Memo, Recipient};

/// Integer as it appears on the wire: a JSON number or a decimal string.
///
/// Large batch ids travel as strings because many JSON producers cannot
/// represent integers above 2^53 exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireInt {
    Number(serde_json::Number),
    Text(String),
}

impl WireInt {
    pub fn to_u64(&self, field: &'static str) -> Result<u64> {
        match self {
            WireInt::Number(n) => {
                if let Some(v) = n.as_u64() {
                    return Ok(v);
                }
                let integral = n.is_i64() || n.as_f64().is_some_and(|f| f.fract() == 0.0);
                if integral {
                    Err(MoatError::OutOfRange { field, value: n.to_string() })
                } else {
                    Err(MoatError::InvalidNumber { field, value: n.to_string() })
                }
            }
            WireInt::Text(s) => {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(MoatError::InvalidNumber { field, value: s.clone() });
                }
                match s.parse::<u128>() {
                    Ok(wide) => checked_u64(field, wide),
                    Err(_) => Err(MoatError::OutOfRange { field, value: s.clone() }),
                }
            }
        }
    }
}

impl From<u64> for WireInt {
    fn from(v: u64) -> Self {
        WireInt::Number(v.into())
    }
}

/// Plan document exactly as read from disk or received from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    /// Base58 creator identity
    pub creator: String,
    pub batch_id: WireInt,
    /// Kept raw so a float or string fails as `InvalidKind`, not as a parse error
    #[serde(default = "default_kind")]
    pub kind: serde_json::Value,
    pub recipients: Vec<Recipient>,
    pub memo: Memo,
}

fn default_kind() -> serde_json::Value {
    serde_json::Value::from(0)
}

/// A validated batch, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub creator: Identity,
    pub batch_id: u64,
    pub kind: u8,
    /// Order-significant: each recipient's position is hashed into its leaf
    pub recipients: Vec<Recipient>,
    pub memo: Memo,
}

/// The two digests anchored on-chain, plus the leaves they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommitment {
    pub leaves: Vec<Digest>,
    pub merkle_root: Digest,
    pub memo_hash: Digest,
}

impl BatchCommitment {
    pub fn merkle_root_hex(&self) -> String {
        to_hex(&self.merkle_root)
    }

    pub fn memo_hash_hex(&self) -> String {
        to_hex(&self.memo_hash)
    }
}

impl BatchPlan {
    pub fn new(
        creator: Identity,
        batch_id: u64,
        kind: u8,
        recipients: Vec<Recipient>,
        memo: Memo,
    ) -> Result<Self> {
        if recipients.is_empty() {
            return Err(MoatError::EmptyInput);
        }
        for (index, recipient) in recipients.iter().enumerate() {
            recipient.validate(index)?;
        }
        Ok(Self { creator, batch_id, kind, recipients, memo })
    }

    pub fn from_document(doc: PlanDocument) -> Result<Self> {
        let creator = decode_identity(&doc.creator)?;
        let batch_id = doc.batch_id.to_u64("batchId")?;
        let kind = parse_kind_value(&doc.kind)?;
        Self::new(creator, batch_id, kind, doc.recipients, doc.memo)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let doc: PlanDocument =
            serde_json::from_str(json).map_err(|e| MoatError::Serialization(e.to_string()))?;
        Self::from_document(doc)
    }

    pub fn to_document(&self) -> PlanDocument {
        PlanDocument {
            creator: bs58::encode(self.creator).into_string(),
            batch_id: self.batch_id.into(),
            kind: self.kind.into(),
            recipients: self.recipients.clone(),
            memo: self.memo.clone(),
        }
    }

    /// One digest per recipient, in batch order.
    pub fn leaves(&self) -> Result<Vec<Digest>> {
        self.recipients
            .iter()
            .enumerate()
            .map(|(position, r)| position_leaf(&self.creator, self.batch_id, position, r))
            .collect()
    }

    pub fn commitment(&self) -> Result<BatchCommitment> {
        let leaves = self.leaves()?;
        let merkle_root = compute_root(&leaves)?;
        let memo_hash = hash_memo(&self.memo)?;
        Ok(BatchCommitment { leaves, merkle_root, memo_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::hash_leaf;
    use crate::merkle::hash_pair;

    const CREATOR_B58: &str = "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi";
    const SOL: &str = "solana:devnet:So11111111111111111111111111111111111111112";

    fn scenario_json(batch_id: &str, kind: &str) -> String {
        format!(
            r#"{{
                "creator": "{CREATOR_B58}",
                "batchId": {batch_id},
                "kind": {kind},
                "recipients": [{{"id": "solana:devnet:R1", "amount": "1.25", "asset": "{SOL}"}}],
                "memo": {{"title": "t", "note": "", "createdAt": "2024-01-01T00:00:00.000Z"}}
            }}"#
        )
    }

    #[test]
    fn test_scenario_vectors() {
        let plan = BatchPlan::from_json(&scenario_json("0", "0")).unwrap();
        assert_eq!(plan.creator, [1u8; 32]);
        let c = plan.commitment().unwrap();
        assert_eq!(c.leaves.len(), 1);
        assert_eq!(c.merkle_root, c.leaves[0]);
        assert_eq!(
            c.merkle_root_hex(),
            "f018a091eb77e30a1e46f5cc6aca453281df31f57bf8c10ff6e6485b70282953"
        );
        assert_eq!(
            c.memo_hash_hex(),
            "0515d100282b4704010fbf2af1a6d7e7027f05184923dfa66dabab72ddb16d29"
        );
    }

    #[test]
    fn test_batch_id_as_string() {
        let plan = BatchPlan::from_json(&scenario_json("\"18446744073709551615\"", "0")).unwrap();
        assert_eq!(plan.batch_id, u64::MAX);
    }

    #[test]
    fn test_batch_id_one_past_max_rejected() {
        let err = BatchPlan::from_json(&scenario_json("\"18446744073709551616\"", "0")).unwrap_err();
        assert_eq!(
            err,
            MoatError::OutOfRange { field: "batchId", value: "18446744073709551616".into() }
        );

        let err = BatchPlan::from_json(&scenario_json("18446744073709551616", "0")).unwrap_err();
        assert!(matches!(err, MoatError::OutOfRange { field: "batchId", .. }));

        let err = BatchPlan::from_json(&scenario_json("-1", "0")).unwrap_err();
        assert!(matches!(err, MoatError::OutOfRange { field: "batchId", .. }));
    }

    #[test]
    fn test_batch_id_not_numeric() {
        let err = BatchPlan::from_json(&scenario_json("\"12abc\"", "0")).unwrap_err();
        assert!(matches!(err, MoatError::InvalidNumber { field: "batchId", .. }));
        let err = BatchPlan::from_json(&scenario_json("1.5", "0")).unwrap_err();
        assert!(matches!(err, MoatError::InvalidNumber { field: "batchId", .. }));
    }

    #[test]
    fn test_kind_bounds() {
        assert_eq!(BatchPlan::from_json(&scenario_json("0", "0")).unwrap().kind, 0);
        assert_eq!(BatchPlan::from_json(&scenario_json("0", "255")).unwrap().kind, 255);
        assert_eq!(
            BatchPlan::from_json(&scenario_json("0", "256")).unwrap_err(),
            MoatError::InvalidKind("256".into())
        );
    }

    #[test]
    fn test_non_integer_kind_rejected() {
        for raw in ["1.5", "\"3\"", "9223372036854775808", "-1"] {
            let err = BatchPlan::from_json(&scenario_json("0", raw)).unwrap_err();
            assert!(matches!(err, MoatError::InvalidKind(_)), "kind {raw}: {err:?}");
            assert_eq!(err.kind(), crate::ErrorKind::Validation);
        }
    }

    #[test]
    fn test_missing_kind_defaults_to_zero() {
        let json = scenario_json("0", "0").replace("\"kind\": 0,", "");
        assert_eq!(BatchPlan::from_json(&json).unwrap().kind, 0);
    }

    #[test]
    fn test_padded_batch_id_rejected() {
        let err = BatchPlan::from_json(&scenario_json("\" 5 \"", "0")).unwrap_err();
        assert_eq!(err, MoatError::InvalidNumber { field: "batchId", value: " 5 ".into() });
    }

    #[test]
    fn test_bad_creator() {
        let json = scenario_json("0", "0").replace(CREATOR_B58, "abc");
        assert!(matches!(BatchPlan::from_json(&json), Err(MoatError::InvalidIdentity(_))));
    }

    #[test]
    fn test_empty_recipients() {
        let memo = Memo::new(None, None, "2024-01-01T00:00:00.000Z");
        assert_eq!(
            BatchPlan::new([1u8; 32], 0, 0, vec![], memo),
            Err(MoatError::EmptyInput)
        );
    }

    #[test]
    fn test_reorder_changes_root() {
        let memo = Memo::new(None, None, "2024-01-01T00:00:00.000Z");
        let r1 = Recipient::new("solana:devnet:R1", "1", SOL);
        let r2 = Recipient::new("solana:devnet:R2", "2", SOL);
        let forward =
            BatchPlan::new([1u8; 32], 9, 0, vec![r1.clone(), r2.clone()], memo.clone()).unwrap();
        let reversed = BatchPlan::new([1u8; 32], 9, 0, vec![r2, r1], memo).unwrap();
        assert_ne!(
            forward.commitment().unwrap().merkle_root,
            reversed.commitment().unwrap().merkle_root
        );
    }

    #[test]
    fn test_three_recipient_root() {
        let memo = Memo::new(None, None, "2024-01-01T00:00:00.000Z");
        let rs: Vec<Recipient> = (0..3)
            .map(|i| Recipient::new(format!("solana:devnet:R{i}"), "1", SOL))
            .collect();
        let plan = BatchPlan::new([4u8; 32], 2, 0, rs.clone(), memo).unwrap();

        let l: Vec<Digest> = rs
            .iter()
            .enumerate()
            .map(|(i, r)| hash_leaf(&[4u8; 32], 2, i as u32, r))
            .collect();
        let expected = hash_pair(&hash_pair(&l[0], &l[1]), &hash_pair(&l[2], &l[2]));
        assert_eq!(plan.commitment().unwrap().merkle_root, expected);
    }

    #[test]
    fn test_document_roundtrip_preserves_commitment() {
        let plan = BatchPlan::from_json(&scenario_json("42", "7")).unwrap();
        let json = serde_json::to_string(&plan.to_document()).unwrap();
        let again = BatchPlan::from_json(&json).unwrap();
        assert_eq!(plan, again);
        assert_eq!(plan.commitment().unwrap(), again.commitment().unwrap());
    }
}
