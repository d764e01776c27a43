//! Registry client for the `moat_registry` program
//!
//! Supports two modes:
//! - **Mock Mode**: For development/testing without Solana. Accounts live in
//!   an in-memory [`MockLedger`] using the same byte layouts as on-chain.
//! - **Live Mode**: Actual Solana RPC calls to the deployed program.
//!
//! Both modes read records back through the same account decoders, so a
//! record that round-trips in mock mode has the layout live mode expects.

use std::sync::Arc;

use tracing::{debug, info, warn};

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction as SolanaTransaction,
};
use solana_sdk_ids::system_program;

use moat_core::{short_hex, BatchPlan, Identity};

use crate::accounts::{
    self, instruction, COMMITMENT_ACCOUNT_LEN, CREATOR_OFFSET,
};
use crate::ledger::{LedgerError, MockLedger};
use crate::{
    AccountAddress, CommitArgs, CommitReceipt, CommitmentRecord, RegistryEntry, RegistryError,
    RegistryState, Result, TransactionSignature, VerificationReport, COMMITMENT_SEED, ENTRY_SEED,
    REGISTRY_SEED,
};

/// Where commitments and directory entries are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMode {
    /// Accounts live in a [`MockLedger`]; nothing leaves the process
    Mock,
    /// Accounts live under a deployed `moat_registry` program
    Live,
}

/// Ledger selection for a [`RegistryClient`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub mode: RegistryMode,
    /// RPC endpoint, ignored by the mock ledger
    pub rpc_url: String,
    /// Owner of every commitment, directory and entry account
    pub program_id: [u8; 32],
    /// Confirmation level a commit waits for: processed, confirmed or finalized
    pub commitment: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            mode: RegistryMode::Mock,
            rpc_url: "https://api.devnet.solana.com".to_string(),
            program_id: Self::DEVNET_PROGRAM_ID,
            commitment: "confirmed".to_string(),
        }
    }
}

impl RegistryConfig {
    /// `moat_registry` deployment on devnet
    /// (7xrqC43sgnJAc1ozxGsXQBv8Jhw1K3GvhoXiT8F6R84i)
    pub const DEVNET_PROGRAM_ID: [u8; 32] = [
        103, 117, 104, 245, 254, 75, 175, 28, 166, 176, 91, 59, 170, 225, 196, 63,
        1, 53, 184, 18, 87, 15, 97, 97, 234, 5, 134, 97, 152, 196, 122, 99,
    ];

    /// In-process ledger, used by tests and offline CLI runs
    pub fn mock() -> Self {
        Self {
            mode: RegistryMode::Mock,
            ..Default::default()
        }
    }

    pub fn devnet(program_id: [u8; 32]) -> Self {
        Self {
            mode: RegistryMode::Live,
            rpc_url: "https://api.devnet.solana.com".to_string(),
            program_id,
            ..Default::default()
        }
    }

    /// Devnet with [`Self::DEVNET_PROGRAM_ID`]
    pub fn devnet_default() -> Self {
        Self::devnet(Self::DEVNET_PROGRAM_ID)
    }

    /// Mainnet-beta; commits wait for finalization
    pub fn mainnet(program_id: [u8; 32]) -> Self {
        Self {
            mode: RegistryMode::Live,
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            program_id,
            commitment: "finalized".to_string(),
        }
    }

    /// Any RPC endpoint, e.g. a local validator
    pub fn custom(rpc_url: impl Into<String>, program_id: [u8; 32]) -> Self {
        Self {
            mode: RegistryMode::Live,
            rpc_url: rpc_url.into(),
            program_id,
            ..Default::default()
        }
    }

    /// Unknown levels fall back to `confirmed`.
    pub fn commitment_config(&self) -> CommitmentConfig {
        match self.commitment.as_str() {
            "finalized" => CommitmentConfig::finalized(),
            "confirmed" => CommitmentConfig::confirmed(),
            "processed" => CommitmentConfig::processed(),
            _ => CommitmentConfig::confirmed(),
        }
    }
}

/// Commits, reads and verifies batch commitments, and maintains the
/// program directory.
///
/// In mock mode every operation runs against the shared [`MockLedger`].
pub struct RegistryClient {
    config: RegistryConfig,
    /// Signs live transactions; absent for mock and read-only clients
    signer_keypair: Option<Keypair>,
    /// Identity checked against `creator` and the directory admin
    signer_pubkey: Identity,
    rpc_client: Option<Arc<RpcClient>>,
    ledger: Arc<MockLedger>,
}

impl RegistryClient {
    /// Client acting as `signer_pubkey` on a fresh mock ledger
    pub fn new(config: RegistryConfig, signer_pubkey: Identity) -> Self {
        Self::with_ledger(config, signer_pubkey, Arc::new(MockLedger::new()))
    }

    /// Create a client that shares `ledger` with other mock clients
    pub fn with_ledger(config: RegistryConfig, signer_pubkey: Identity, ledger: Arc<MockLedger>) -> Self {
        let rpc_client = Self::rpc_for(&config);
        Self {
            config,
            signer_keypair: None,
            signer_pubkey,
            rpc_client,
            ledger,
        }
    }

    /// Client that signs live transactions with `keypair`
    pub fn with_keypair(config: RegistryConfig, keypair: Keypair) -> Self {
        let signer_pubkey = keypair.pubkey().to_bytes();
        let rpc_client = Self::rpc_for(&config);

        Self {
            config,
            signer_keypair: Some(keypair),
            signer_pubkey,
            rpc_client,
            ledger: Arc::new(MockLedger::new()),
        }
    }

    fn rpc_for(config: &RegistryConfig) -> Option<Arc<RpcClient>> {
        if config.mode == RegistryMode::Live {
            Some(Arc::new(RpcClient::new_with_commitment(
                config.rpc_url.clone(),
                config.commitment_config(),
            )))
        } else {
            None
        }
    }

    /// Get the signer's public key bytes
    pub fn signer_pubkey_bytes(&self) -> &Identity {
        &self.signer_pubkey
    }

    /// Check if running in mock mode
    pub fn is_mock(&self) -> bool {
        self.config.mode == RegistryMode::Mock
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Mock ledger backing this client
    pub fn ledger(&self) -> &Arc<MockLedger> {
        &self.ledger
    }

    fn program_id(&self) -> Pubkey {
        Pubkey::new_from_array(self.config.program_id)
    }

    fn rpc(&self) -> Result<&RpcClient> {
        self.rpc_client
            .as_deref()
            .ok_or_else(|| RegistryError::RpcError("RPC client not initialized".to_string()))
    }

    // ==================== Storage Keys ====================

    /// Commitment PDA: ["batch", creator, batch_id_le]
    pub fn commitment_address(&self, creator: &Identity, batch_id: u64) -> (AccountAddress, u8) {
        let (pda, bump) = Pubkey::find_program_address(
            &[COMMITMENT_SEED, creator, &batch_id.to_le_bytes()],
            &self.program_id(),
        );
        (pda.to_bytes(), bump)
    }

    /// Directory singleton PDA: ["registry"]
    pub fn registry_address(&self) -> (AccountAddress, u8) {
        let (pda, bump) = Pubkey::find_program_address(&[REGISTRY_SEED], &self.program_id());
        (pda.to_bytes(), bump)
    }

    /// Directory entry PDA: ["entry", registry, id_le]
    pub fn entry_address(&self, id: u32) -> (AccountAddress, u8) {
        let (registry, _) = self.registry_address();
        let (pda, bump) = Pubkey::find_program_address(
            &[ENTRY_SEED, &registry, &id.to_le_bytes()],
            &self.program_id(),
        );
        (pda.to_bytes(), bump)
    }

    /// Send a transaction to Solana
    async fn send_transaction(&self, instruction: Instruction) -> Result<TransactionSignature> {
        let rpc = self.rpc()?;

        let keypair = self.signer_keypair.as_ref().ok_or_else(|| {
            RegistryError::Unauthorized("live mode requires a signing keypair".to_string())
        })?;

        let blockhash = rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| RegistryError::RpcError(e.to_string()))?;

        let tx = SolanaTransaction::new_signed_with_payer(
            &[instruction],
            Some(&keypair.pubkey()),
            &[keypair],
            blockhash,
        );

        let signature = rpc
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(|e| RegistryError::TransactionFailed(e.to_string()))?;

        info!("Transaction confirmed: {}", signature);

        let mut sig_bytes = [0u8; 64];
        sig_bytes.copy_from_slice(signature.as_ref());
        Ok(sig_bytes)
    }

    /// Raw account data at `address`, `None` if the account does not exist.
    async fn load_account(&self, address: &AccountAddress) -> Result<Option<Vec<u8>>> {
        if self.is_mock() {
            return Ok(self.ledger.get_account(address));
        }

        let rpc = self.rpc()?;
        let pubkey = Pubkey::new_from_array(*address);
        let response = rpc
            .get_account_with_commitment(&pubkey, self.config.commitment_config())
            .await
            .map_err(|e| RegistryError::RpcError(format!("get_account: {}", e)))?;
        Ok(response.value.map(|account| account.data))
    }

    // ==================== Commit ====================

    /// Commit a batch for `creator`.
    ///
    /// The signer must be the creator. Exactly one commit per
    /// `(creator, batch_id)` succeeds; every later attempt fails with
    /// `AlreadyCommitted` and leaves the stored record untouched.
    pub async fn commit(&self, creator: Identity, args: CommitArgs) -> Result<CommitReceipt> {
        info!(
            "Committing batch {} for creator {} (root: {}, kind: {})",
            args.batch_id,
            short_hex(&creator),
            short_hex(&args.merkle_root),
            args.kind,
        );

        if creator != self.signer_pubkey {
            return Err(RegistryError::Unauthorized(format!(
                "signer {} is not creator {}",
                bs58::encode(self.signer_pubkey).into_string(),
                bs58::encode(creator).into_string(),
            )));
        }

        let (storage_key, bump) = self.commitment_address(&creator, args.batch_id);
        let already_committed = || RegistryError::AlreadyCommitted {
            creator: bs58::encode(creator).into_string(),
            batch_id: args.batch_id,
        };

        if self.is_mock() {
            let (record, signature) = self
                .ledger
                .execute(|tx| {
                    let record = CommitmentRecord {
                        creator,
                        batch_id: args.batch_id,
                        kind: args.kind,
                        merkle_root: args.merkle_root,
                        memo_hash: args.memo_hash,
                        created_at: tx.unix_timestamp(),
                    };
                    tx.create_account(storage_key, accounts::encode_commitment_account(&record, bump))?;
                    Ok(record)
                })
                .map_err(|e| match e {
                    LedgerError::AccountInUse(_) => already_committed(),
                    other => RegistryError::TransactionFailed(other.to_string()),
                })?;

            info!(
                "[MOCK] Batch {} committed by {} at {}",
                args.batch_id,
                short_hex(&creator),
                bs58::encode(storage_key).into_string(),
            );
            return Ok(CommitReceipt { signature, storage_key, record });
        }

        // Live mode
        if self.load_account(&storage_key).await?.is_some() {
            return Err(already_committed());
        }

        let instruction = Instruction {
            program_id: self.program_id(),
            accounts: vec![
                AccountMeta::new(Pubkey::new_from_array(creator), true),
                AccountMeta::new(Pubkey::new_from_array(storage_key), false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            data: instruction::commit_batch(&args),
        };

        // A concurrent commit can land between the check and this send; the
        // program's `init` constraint rejects it with "already in use".
        let signature = self
            .send_transaction(instruction)
            .await
            .map_err(|e| map_account_in_use(e, already_committed))?;

        let record = self.fetch(creator, args.batch_id).await?;
        Ok(CommitReceipt { signature, storage_key, record })
    }

    // ==================== Query Methods ====================

    /// Fetch the commitment for `(creator, batch_id)`.
    pub async fn fetch(&self, creator: Identity, batch_id: u64) -> Result<CommitmentRecord> {
        debug!("Fetching batch {} for creator {}", batch_id, short_hex(&creator));

        let (storage_key, _) = self.commitment_address(&creator, batch_id);
        let data = self.load_account(&storage_key).await?.ok_or_else(|| {
            RegistryError::NotFound(format!(
                "batch {} for creator {}",
                batch_id,
                bs58::encode(creator).into_string()
            ))
        })?;
        accounts::decode_commitment_account(&data)
    }

    /// All commitments by `creator`, newest batch id first.
    pub async fn list_by_creator(&self, creator: Identity) -> Result<Vec<CommitmentRecord>> {
        debug!("Listing batches for creator {}", short_hex(&creator));

        let raw: Vec<Vec<u8>> = if self.is_mock() {
            self.ledger
                .scan(CREATOR_OFFSET, &creator, COMMITMENT_ACCOUNT_LEN)
                .into_iter()
                .map(|(_, data)| data)
                .collect()
        } else {
            let rpc = self.rpc()?;
            let config = RpcProgramAccountsConfig {
                filters: Some(vec![
                    RpcFilterType::DataSize(COMMITMENT_ACCOUNT_LEN as u64),
                    RpcFilterType::Memcmp(Memcmp::new_base58_encoded(CREATOR_OFFSET, &creator)),
                ]),
                account_config: RpcAccountInfoConfig {
                    commitment: Some(self.config.commitment_config()),
                    ..Default::default()
                },
                ..Default::default()
            };
            rpc.get_program_accounts_with_config(&self.program_id(), config)
                .await
                .map_err(|e| RegistryError::RpcError(format!("get_program_accounts: {}", e)))?
                .into_iter()
                .map(|(_, account)| account.data)
                .collect()
        };

        let mut records = Vec::with_capacity(raw.len());
        for data in raw {
            match accounts::decode_commitment_account(&data) {
                // The filter matches bytes, not types; skip foreign accounts
                // that merely share the size and prefix.
                Ok(record) if record.creator == creator => records.push(record),
                Ok(_) => {}
                Err(e) => warn!("Skipping undecodable commitment account: {}", e),
            }
        }
        records.sort_by(|a, b| b.batch_id.cmp(&a.batch_id));
        Ok(records)
    }

    /// Recompute the plan's digests and compare them with the stored record.
    pub async fn verify(&self, plan: &BatchPlan) -> Result<VerificationReport> {
        let record = self.fetch(plan.creator, plan.batch_id).await?;
        self.verify_record(plan, &record)
    }

    /// Verify against a record obtained elsewhere (an export, another
    /// client's JSON). No ledger access.
    ///
    /// A record for a different `(creator, batch_id)` is `NotFound`: the
    /// plan's own record was not supplied.
    pub fn verify_record(&self, plan: &BatchPlan, record: &CommitmentRecord) -> Result<VerificationReport> {
        if record.creator != plan.creator || record.batch_id != plan.batch_id {
            return Err(RegistryError::NotFound(format!(
                "record is batch {} by {}, plan is batch {} by {}",
                record.batch_id,
                bs58::encode(record.creator).into_string(),
                plan.batch_id,
                bs58::encode(plan.creator).into_string(),
            )));
        }

        let commitment = plan.commitment()?;
        let (storage_key, _) = self.commitment_address(&plan.creator, plan.batch_id);
        let report = VerificationReport::new(storage_key, plan, &commitment, record);
        debug!(
            "Verified batch {} for {}: root {}, memo {}, kind {}",
            plan.batch_id,
            short_hex(&plan.creator),
            report.root_matches(),
            report.memo_matches(),
            report.kind_matches(),
        );
        Ok(report)
    }

    // ==================== Registry Directory ====================

    /// Create the directory singleton with the signer as admin.
    pub async fn initialize_registry(&self) -> Result<RegistryState> {
        info!("Initializing registry with admin {}", short_hex(&self.signer_pubkey));

        let (registry, bump) = self.registry_address();
        let state = RegistryState {
            admin: self.signer_pubkey,
            next_id: 0,
            bump,
        };

        if self.is_mock() {
            self.ledger
                .execute(|tx| tx.create_account(registry, accounts::encode_registry_state(&state)))
                .map_err(|e| match e {
                    LedgerError::AccountInUse(_) => RegistryError::AlreadyInitialized,
                    other => RegistryError::TransactionFailed(other.to_string()),
                })?;

            info!("[MOCK] Registry initialized at {}", bs58::encode(registry).into_string());
            return Ok(state);
        }

        // Live mode
        if self.load_account(&registry).await?.is_some() {
            return Err(RegistryError::AlreadyInitialized);
        }

        let instruction = Instruction {
            program_id: self.program_id(),
            accounts: vec![
                AccountMeta::new(Pubkey::new_from_array(self.signer_pubkey), true),
                AccountMeta::new(Pubkey::new_from_array(registry), false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            data: instruction::initialize_registry(),
        };

        self.send_transaction(instruction)
            .await
            .map_err(|e| map_account_in_use(e, || RegistryError::AlreadyInitialized))?;

        self.get_registry_state().await
    }

    /// Register `target_program` under the next sequential id (admin only).
    ///
    /// The entry is created and the counter advanced in one transaction.
    pub async fn register_entry(&self, target_program: Identity, kind: u8) -> Result<RegistryEntry> {
        info!(
            "Registering target {} (kind: {})",
            short_hex(&target_program),
            kind,
        );

        let (registry, _) = self.registry_address();

        if self.is_mock() {
            let (entry, _) = self.ledger.execute(|tx| {
                let data = tx.get(&registry).ok_or(RegistryError::NotInitialized)?;
                let mut state = accounts::decode_registry_state(data)?;
                if state.admin != self.signer_pubkey {
                    return Err(RegistryError::Unauthorized(format!(
                        "signer {} is not the registry admin",
                        bs58::encode(self.signer_pubkey).into_string()
                    )));
                }

                let id = state.next_id;
                state.next_id = id.checked_add(1).ok_or(RegistryError::CounterOverflow)?;

                let (address, bump) = self.entry_address(id);
                let entry = RegistryEntry {
                    registry,
                    id,
                    admin: state.admin,
                    target_program,
                    kind,
                    bump,
                };

                tx.create_account(address, accounts::encode_registry_entry(&entry))
                    .map_err(|e| match e {
                        LedgerError::AccountInUse(_) => RegistryError::EntryIdTaken(id),
                        other => RegistryError::TransactionFailed(other.to_string()),
                    })?;
                tx.write_account(registry, accounts::encode_registry_state(&state))
                    .map_err(|e| RegistryError::TransactionFailed(e.to_string()))?;
                Ok(entry)
            })?;

            info!(
                "[MOCK] Registered target {} as entry {}",
                short_hex(&target_program),
                entry.id,
            );
            return Ok(entry);
        }

        // Live mode
        let state = self.get_registry_state().await?;
        if state.admin != self.signer_pubkey {
            return Err(RegistryError::Unauthorized(format!(
                "signer {} is not the registry admin",
                bs58::encode(self.signer_pubkey).into_string()
            )));
        }
        if state.next_id == u32::MAX {
            return Err(RegistryError::CounterOverflow);
        }

        let (entry_address, _) = self.entry_address(state.next_id);
        let instruction = Instruction {
            program_id: self.program_id(),
            accounts: vec![
                AccountMeta::new(Pubkey::new_from_array(self.signer_pubkey), true),
                AccountMeta::new(Pubkey::new_from_array(registry), false),
                AccountMeta::new(Pubkey::new_from_array(entry_address), false),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            data: instruction::register_entry(&target_program, kind),
        };

        // Another admin transaction may have taken this id since the read
        let id = state.next_id;
        self.send_transaction(instruction)
            .await
            .map_err(|e| map_account_in_use(e, || RegistryError::EntryIdTaken(id)))?;
        self.get_registry_entry(id).await
    }

    /// Directory state; `NotInitialized` if the directory was never created.
    pub async fn get_registry_state(&self) -> Result<RegistryState> {
        debug!("Fetching registry state");
        let (registry, _) = self.registry_address();
        let data = self
            .load_account(&registry)
            .await?
            .ok_or(RegistryError::NotInitialized)?;
        accounts::decode_registry_state(&data)
    }

    pub async fn get_registry_entry(&self, id: u32) -> Result<RegistryEntry> {
        debug!("Fetching registry entry {}", id);
        let (address, _) = self.entry_address(id);
        let data = self
            .load_account(&address)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("registry entry {}", id)))?;
        accounts::decode_registry_entry(&data)
    }

    // ==================== Mock Helpers ====================

    /// Move the directory counter (mock mode only, for testing overflow).
    pub fn set_mock_next_entry_id(&self, next_id: u32) -> Result<()> {
        if !self.is_mock() {
            return Err(RegistryError::Unauthorized("mock helper in live mode".to_string()));
        }

        let (registry, _) = self.registry_address();
        self.ledger
            .execute(|tx| {
                let data = tx.get(&registry).ok_or(RegistryError::NotInitialized)?;
                let mut state = accounts::decode_registry_state(data)?;
                state.next_id = next_id;
                tx.write_account(registry, accounts::encode_registry_state(&state))
                    .map_err(|e| RegistryError::TransactionFailed(e.to_string()))
            })
            .map(|_| ())
    }
}

/// The system program refuses to create an account that already holds
/// data. Live writes race on that, so map it to the caller's conflict.
fn map_account_in_use(err: RegistryError, conflict: impl FnOnce() -> RegistryError) -> RegistryError {
    match err {
        RegistryError::TransactionFailed(msg) if msg.contains("already in use") => conflict(),
        other => other,
    }
}
