//! Registry types for on-chain operations

use moat_core::{digest_from_slice, parse_kind, BatchCommitment, BatchPlan, Digest, Identity};

/// Seed prefix for commitment PDAs: `["batch", creator, batch_id_le]`
pub const COMMITMENT_SEED: &[u8] = b"batch";

/// Seed for the singleton directory PDA: `["registry"]`
pub const REGISTRY_SEED: &[u8] = b"registry";

/// Seed prefix for directory entry PDAs: `["entry", registry, id_le]`
pub const ENTRY_SEED: &[u8] = b"entry";

/// Transaction signature (Solana format)
pub type TransactionSignature = [u8; 64];

/// On-chain account address
pub type AccountAddress = [u8; 32];

/// `commit_batch` instruction arguments, validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitArgs {
    pub batch_id: u64,
    /// Caller-defined classification tag
    pub kind: u8,
    pub merkle_root: Digest,
    pub memo_hash: Digest,
}

impl CommitArgs {
    /// Validate raw arguments. Fails with `InvalidHashLength` or
    /// `InvalidKind` before anything touches the ledger.
    pub fn new(
        batch_id: u64,
        merkle_root: &[u8],
        memo_hash: &[u8],
        kind: i64,
    ) -> moat_core::Result<Self> {
        Ok(Self {
            batch_id,
            kind: parse_kind(kind)?,
            merkle_root: digest_from_slice("merkleRoot", merkle_root)?,
            memo_hash: digest_from_slice("memoHash", memo_hash)?,
        })
    }

    pub fn from_plan(plan: &BatchPlan, commitment: &BatchCommitment) -> Self {
        Self {
            batch_id: plan.batch_id,
            kind: plan.kind,
            merkle_root: commitment.merkle_root,
            memo_hash: commitment.memo_hash,
        }
    }
}

/// Immutable commitment stored per `(creator, batch_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitmentRecord {
    pub creator: Identity,
    pub batch_id: u64,
    pub kind: u8,
    pub merkle_root: Digest,
    pub memo_hash: Digest,
    /// Ledger-assigned creation time (unix seconds)
    pub created_at: i64,
}

/// Result of a successful commit.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    pub signature: TransactionSignature,
    /// Address of the commitment account
    pub storage_key: AccountAddress,
    pub record: CommitmentRecord,
}

impl CommitReceipt {
    pub fn signature_b58(&self) -> String {
        bs58::encode(self.signature).into_string()
    }

    pub fn storage_key_b58(&self) -> String {
        bs58::encode(self.storage_key).into_string()
    }
}

/// Directory singleton state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryState {
    pub admin: Identity,
    /// Id the next registered entry receives
    pub next_id: u32,
    pub bump: u8,
}

/// One catalogued target program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Directory account this entry belongs to
    pub registry: AccountAddress,
    pub id: u32,
    pub admin: Identity,
    pub target_program: Identity,
    pub kind: u8,
    pub bump: u8,
}

/// Outcome of recomputing a plan's digests against the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub storage_key: AccountAddress,
    pub computed_root: Digest,
    pub stored_root: Digest,
    pub computed_memo: Digest,
    pub stored_memo: Digest,
    pub expected_kind: u8,
    pub stored_kind: u8,
}

impl VerificationReport {
    pub fn new(
        storage_key: AccountAddress,
        plan: &BatchPlan,
        commitment: &BatchCommitment,
        record: &CommitmentRecord,
    ) -> Self {
        Self {
            storage_key,
            computed_root: commitment.merkle_root,
            stored_root: record.merkle_root,
            computed_memo: commitment.memo_hash,
            stored_memo: record.memo_hash,
            expected_kind: plan.kind,
            stored_kind: record.kind,
        }
    }

    pub fn root_matches(&self) -> bool {
        self.computed_root == self.stored_root
    }

    pub fn memo_matches(&self) -> bool {
        self.computed_memo == self.stored_memo
    }

    pub fn kind_matches(&self) -> bool {
        self.expected_kind == self.stored_kind
    }

    /// The batch verifies iff root, memo and kind all match.
    pub fn is_valid(&self) -> bool {
        self.root_matches() && self.memo_matches() && self.kind_matches()
    }
}
