//! `commit --export` artifact

use moat_core::{BatchCommitment, BatchPlan, PlanDocument};
use moat_executor::ExecutionReceipt;
use moat_registry::CommitReceipt;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    /// Base58 transaction signature
    pub signature: String,
    /// Base58 commitment account address
    pub storage_key: String,
    pub created_at: i64,
}

/// Snapshot of a committed batch, written for the creator's records.
/// Nothing reads it back; the ledger remains the source of truth.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub plan: PlanDocument,
    pub merkle_root: String,
    pub memo_hash: String,
    pub receipt: ReceiptView,
    pub storage_key: String,
    /// "mock" or "live"
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionReceipt>,
}

impl ExportArtifact {
    pub fn new(
        plan: &BatchPlan,
        commitment: &BatchCommitment,
        receipt: &CommitReceipt,
        mock: bool,
        execution: Option<ExecutionReceipt>,
    ) -> Self {
        Self {
            plan: plan.to_document(),
            merkle_root: commitment.merkle_root_hex(),
            memo_hash: commitment.memo_hash_hex(),
            receipt: ReceiptView {
                signature: receipt.signature_b58(),
                storage_key: receipt.storage_key_b58(),
                created_at: receipt.record.created_at,
            },
            storage_key: receipt.storage_key_b58(),
            mode: if mock { "mock" } else { "live" }.to_string(),
            execution,
        }
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
