use serde::{Deserialize, Serialize};

use crate::error::{MoatError, Result};

/// 32-byte public identity (ed25519 public key / Solana address)
pub type Identity = [u8; 32];

/// 32-byte SHA-256 digest
pub type Digest = [u8; 32];

/// One payout line item in a batch.
///
/// Fields are hashed byte-exact as UTF-8. Nothing here normalizes
/// whitespace, case or decimal formatting; verifiers must feed the same
/// strings the creator committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// Chain-namespaced address, e.g. `solana:devnet:<base58>`
    #[serde(alias = "id")]
    pub recipient_id: String,
    /// Decimal amount in chain-native units
    pub amount: String,
    /// Chain-namespaced asset reference
    #[serde(alias = "asset")]
    pub asset_id: String,
}

impl Recipient {
    pub fn new(
        recipient_id: impl Into<String>,
        amount: impl Into<String>,
        asset_id: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            amount: amount.into(),
            asset_id: asset_id.into(),
        }
    }

    /// Reject line items with any empty field.
    pub fn validate(&self, index: usize) -> Result<()> {
        let fields = [
            ("recipientId", &self.recipient_id),
            ("amount", &self.amount),
            ("assetId", &self.asset_id),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(MoatError::EmptyField { index, field });
            }
        }
        Ok(())
    }
}

/// Free-text batch metadata, hashed independently of the Merkle tree.
///
/// A missing `title` or `note` hashes exactly like an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Creation timestamp, ISO-8601 recommended
    pub created_at: String,
}

impl Memo {
    pub fn new(title: Option<&str>, note: Option<&str>, created_at: impl Into<String>) -> Self {
        Self {
            title: title.map(str::to_string),
            note: note.map(str::to_string),
            created_at: created_at.into(),
        }
    }
}

/// Validate a caller-supplied classification tag into a single byte.
pub fn parse_kind(value: i64) -> Result<u8> {
    u8::try_from(value).map_err(|_| MoatError::InvalidKind(value.to_string()))
}

/// Same as [`parse_kind`] for a raw JSON value. Floats, strings and
/// integers outside `i64` all fail with `InvalidKind`.
pub fn parse_kind_value(value: &serde_json::Value) -> Result<u8> {
    match value.as_i64() {
        Some(v) => parse_kind(v),
        None => Err(MoatError::InvalidKind(value.to_string())),
    }
}

/// Copy a 32-byte digest out of an arbitrary slice.
pub fn digest_from_slice(field: &'static str, bytes: &[u8]) -> Result<Digest> {
    bytes
        .try_into()
        .map_err(|_| MoatError::InvalidHashLength { field, actual: bytes.len() })
}

/// Parse a 64-character hex digest (an optional `0x` prefix is tolerated).
pub fn digest_from_hex(field: &'static str, s: &str) -> Result<Digest> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed)
        .map_err(|e| MoatError::Serialization(format!("{field}: {e}")))?;
    digest_from_slice(field, &bytes)
}

/// Lowercase hex, no prefix, 64 characters.
pub fn to_hex(digest: &Digest) -> String {
    hex::encode(digest)
}

/// Short hex form for log lines (first 8 bytes).
pub fn short_hex(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(8)])
}
