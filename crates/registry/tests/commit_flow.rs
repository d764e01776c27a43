//! End-to-end commitment flow against the mock ledger:
//! plan JSON -> digests -> commit -> fetch -> verify.

use std::sync::Arc;

use moat_core::{to_hex, BatchPlan, ErrorKind};
use moat_registry::{
    accounts, CommitArgs, CommitmentRecord, MockLedger, RegistryClient, RegistryConfig,
    RegistryError,
};

const PLAN: &str = r#"{
    "creator": "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi",
    "batchId": "0",
    "kind": 2,
    "recipients": [
        {"id": "solana:devnet:R1", "amount": "1.25", "asset": "solana:devnet:So11111111111111111111111111111111111111112"},
        {"recipientId": "solana:devnet:R2", "amount": "3", "assetId": "solana:devnet:So11111111111111111111111111111111111111112"},
        {"recipientId": "solana:devnet:R3", "amount": "0.5", "assetId": "solana:devnet:So11111111111111111111111111111111111111112"}
    ],
    "memo": {"title": "payroll", "createdAt": "2024-01-01T00:00:00.000Z"}
}"#;

fn client_for(plan: &BatchPlan, ledger: Arc<MockLedger>) -> RegistryClient {
    RegistryClient::with_ledger(RegistryConfig::mock(), plan.creator, ledger)
}

#[tokio::test]
async fn test_commit_fetch_verify_round_trip() {
    let plan = BatchPlan::from_json(PLAN).unwrap();
    let commitment = plan.commitment().unwrap();
    assert_eq!(commitment.leaves.len(), 3);

    let ledger = Arc::new(MockLedger::with_fixed_clock(1_704_067_200));
    let client = client_for(&plan, ledger);

    let receipt = client
        .commit(plan.creator, CommitArgs::from_plan(&plan, &commitment))
        .await
        .unwrap();
    assert_eq!(receipt.record.created_at, 1_704_067_200);
    assert_eq!(receipt.record.kind, 2);

    let record = client.fetch(plan.creator, 0).await.unwrap();
    assert_eq!(to_hex(&record.merkle_root), commitment.merkle_root_hex());
    assert_eq!(to_hex(&record.memo_hash), commitment.memo_hash_hex());

    let report = client.verify(&plan).await.unwrap();
    assert!(report.is_valid());
    assert_eq!(report.storage_key, receipt.storage_key);
}

#[tokio::test]
async fn test_reordered_plan_fails_verification() {
    let plan = BatchPlan::from_json(PLAN).unwrap();
    let commitment = plan.commitment().unwrap();
    let client = client_for(&plan, Arc::new(MockLedger::new()));
    client
        .commit(plan.creator, CommitArgs::from_plan(&plan, &commitment))
        .await
        .unwrap();

    let mut reordered = plan.clone();
    reordered.recipients.swap(0, 2);
    let report = client.verify(&reordered).await.unwrap();
    assert!(!report.root_matches());
    assert!(report.memo_matches());
    assert!(!report.is_valid());

    let mut retitled = plan.clone();
    retitled.memo.title = Some("payroll v2".to_string());
    let report = client.verify(&retitled).await.unwrap();
    assert!(report.root_matches());
    assert!(!report.memo_matches());

    let mut rekinded = plan;
    rekinded.kind = 3;
    assert!(!client.verify(&rekinded).await.unwrap().kind_matches());
}

#[tokio::test]
async fn test_second_commit_conflicts_across_clients() {
    let plan = BatchPlan::from_json(PLAN).unwrap();
    let commitment = plan.commitment().unwrap();
    let ledger = Arc::new(MockLedger::new());
    let args = CommitArgs::from_plan(&plan, &commitment);

    client_for(&plan, ledger.clone()).commit(plan.creator, args).await.unwrap();
    let err = client_for(&plan, ledger.clone())
        .commit(plan.creator, args)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_stored_bytes_read_back_as_json_shapes() {
    let plan = BatchPlan::from_json(PLAN).unwrap();
    let commitment = plan.commitment().unwrap();
    let ledger = Arc::new(MockLedger::new());
    let client = client_for(&plan, ledger.clone());
    let receipt = client
        .commit(plan.creator, CommitArgs::from_plan(&plan, &commitment))
        .await
        .unwrap();

    let raw = ledger.get_account(&receipt.storage_key).unwrap();
    assert_eq!(raw.len(), accounts::COMMITMENT_ACCOUNT_LEN);
    let decoded = accounts::decode_commitment_account(&raw).unwrap();
    assert_eq!(decoded, receipt.record);

    let json = decoded.to_json();
    assert_eq!(CommitmentRecord::from_json(&json).unwrap(), decoded);

    let mut corrupted = raw.clone();
    corrupted[0] ^= 0xFF;
    assert!(matches!(
        accounts::decode_commitment_account(&corrupted),
        Err(RegistryError::MalformedRecord(_))
    ));
}
