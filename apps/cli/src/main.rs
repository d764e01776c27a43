//! Moat CLI
//!
//! Command-line interface for hashing, committing and verifying payout batches.

mod export;
mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{debug, info};

use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::signer::keypair::read_keypair_file;

use moat_core::{decode_identity, parse_kind, to_hex, BatchPlan, Identity};
use moat_executor::{executor_from_config, ExecutorConfig, ExecutorMode};
use moat_logging::LogLevel;
use moat_registry::{
    CommitArgs, CommitmentRecord, MockLedger, RegistryClient, RegistryConfig, RegistryMode,
    VerificationReport,
};

use crate::export::ExportArtifact;

/// Moat - verifiable payout batch commitments
#[derive(Parser)]
#[command(name = "moat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ledger to talk to: mock, devnet, mainnet, or an RPC URL
    #[arg(long, global = true, env = "MOAT_CLUSTER", default_value = "mock")]
    cluster: String,

    /// Registry program id (base58); defaults to the devnet deployment
    #[arg(long, global = true)]
    program_id: Option<String>,

    /// Solana keypair file used to sign transactions
    #[arg(long, global = true, env = "MOAT_KEYPAIR")]
    keypair: Option<PathBuf>,

    /// Persist the mock ledger to this file between runs
    #[arg(long, global = true, env = "MOAT_MOCK_LEDGER")]
    mock_ledger: Option<PathBuf>,

    /// Swap executor used by `commit --execute`
    #[arg(long, global = true, value_enum, default_value = "null")]
    executor: ExecutorArg,

    /// Order service base URL for the live executor
    #[arg(long, global = true, env = "MOAT_EXECUTOR_ENDPOINT")]
    executor_endpoint: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExecutorArg {
    Null,
    Live,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the leaves, merkle root and memo digest of a plan
    Hash {
        /// Plan document (JSON)
        plan: PathBuf,
    },

    /// Commit a plan's digests to the registry
    Commit {
        /// Plan document (JSON)
        plan: PathBuf,

        /// Run the configured executor after a successful commit
        #[arg(long)]
        execute: bool,

        /// Write an export artifact to this path
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show one stored commitment
    Fetch {
        /// Creator identity (base58)
        #[arg(long)]
        creator: String,

        #[arg(long)]
        batch_id: u64,
    },

    /// List a creator's commitments, newest batch first
    List {
        /// Creator identity (base58)
        #[arg(long)]
        creator: String,
    },

    /// Recompute a plan's digests and compare with the stored commitment
    Verify {
        /// Plan document (JSON)
        plan: PathBuf,

        /// Compare against this record file instead of the ledger
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Manage the registry directory
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
}

#[derive(Subcommand)]
enum RegistryAction {
    /// Create the directory with the signer as admin
    Init,

    /// Register a target program (admin only)
    Register {
        /// Target program id (base58)
        #[arg(long)]
        target: String,

        #[arg(long, default_value = "0")]
        kind: i64,
    },

    /// Show the directory state, or one entry
    Show {
        #[arg(long)]
        id: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    moat_logging::init(LogLevel::from_verbosity(cli.verbose));

    let config = registry_config(&cli.cluster, cli.program_id.as_deref())?;
    let keypair = cli.keypair.as_deref().map(load_keypair).transpose()?;
    let ledger = match (&cli.mock_ledger, config.mode) {
        (Some(path), RegistryMode::Mock) => Arc::new(store::load(path)?),
        _ => Arc::new(MockLedger::new()),
    };

    match &cli.command {
        Commands::Hash { plan } => {
            hash(plan)?;
        }
        Commands::Commit { plan, execute, export } => {
            let plan = read_plan(plan)?;
            let client = client_for(&config, keypair, plan.creator, ledger.clone());
            commit(&cli, &client, &plan, *execute, export.as_deref()).await?;
        }
        Commands::Fetch { creator, batch_id } => {
            let creator = decode_identity(creator).context("--creator")?;
            let client = client_for(&config, keypair, creator, ledger.clone());
            let record = client.fetch(creator, *batch_id).await?;
            println!("{}", serde_json::to_string_pretty(&record.to_json())?);
        }
        Commands::List { creator } => {
            let creator = decode_identity(creator).context("--creator")?;
            let client = client_for(&config, keypair, creator, ledger.clone());
            let records = client.list_by_creator(creator).await?;
            let json: Vec<_> = records.iter().map(CommitmentRecord::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Verify { plan, record } => {
            let plan = read_plan(plan)?;
            let client = client_for(&config, keypair, plan.creator, ledger.clone());
            let report = match record {
                Some(path) => client.verify_record(&plan, &read_record(path)?)?,
                None => client.verify(&plan).await?,
            };
            print_verification(&plan, &report)?;
        }
        Commands::Registry { action } => {
            let keypair_required = !matches!(action, RegistryAction::Show { .. });
            if keypair_required && keypair.is_none() {
                bail!("registry {} requires --keypair", action_name(action));
            }
            let signer = keypair.as_ref().map(|k| k.pubkey().to_bytes()).unwrap_or_default();
            let client = client_for(&config, keypair, signer, ledger.clone());
            registry(&client, action).await?;
        }
    }

    if let Some(path) = &cli.mock_ledger {
        if config.mode == RegistryMode::Mock {
            store::save(path, &ledger)?;
        }
    }

    Ok(())
}

/// Build the registry config from `--cluster` and `--program-id`.
fn registry_config(cluster: &str, program_id: Option<&str>) -> Result<RegistryConfig> {
    let program_id = match program_id {
        Some(id) => decode_identity(id).context("--program-id")?,
        None => RegistryConfig::DEVNET_PROGRAM_ID,
    };

    let config = match cluster {
        "mock" => RegistryConfig { program_id, ..RegistryConfig::mock() },
        "devnet" => RegistryConfig::devnet(program_id),
        "mainnet" | "mainnet-beta" => RegistryConfig::mainnet(program_id),
        url if url.starts_with("http://") || url.starts_with("https://") => {
            RegistryConfig::custom(url, program_id)
        }
        other => bail!("unknown cluster '{}': expected mock, devnet, mainnet or an RPC URL", other),
    };
    Ok(config)
}

fn executor_config(executor: ExecutorArg, endpoint: Option<&str>) -> ExecutorConfig {
    match executor {
        ExecutorArg::Null => ExecutorConfig::null(),
        ExecutorArg::Live => ExecutorConfig {
            mode: ExecutorMode::Live,
            endpoint: endpoint.map(str::to_string),
            api_key: None,
        },
    }
}

/// Client signing with `keypair` if given, otherwise acting as `fallback_signer`
/// (enough for reads and for mock-mode commits).
fn client_for(
    config: &RegistryConfig,
    keypair: Option<Keypair>,
    fallback_signer: Identity,
    ledger: Arc<MockLedger>,
) -> RegistryClient {
    match keypair {
        Some(keypair) if config.mode == RegistryMode::Live => {
            RegistryClient::with_keypair(config.clone(), keypair)
        }
        Some(keypair) => {
            RegistryClient::with_ledger(config.clone(), keypair.pubkey().to_bytes(), ledger)
        }
        None => {
            debug!("No keypair given; acting as {}", bs58::encode(fallback_signer).into_string());
            RegistryClient::with_ledger(config.clone(), fallback_signer, ledger)
        }
    }
}

fn load_keypair(path: &Path) -> Result<Keypair> {
    let path = expand_path(path);
    read_keypair_file(&path)
        .map_err(|e| anyhow::anyhow!("reading keypair {}: {}", path.display(), e))
}

/// Expand a leading `~/` to the home directory.
fn expand_path(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn read_plan(path: &Path) -> Result<BatchPlan> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading plan {}", path.display()))?;
    BatchPlan::from_json(&text).with_context(|| format!("invalid plan {}", path.display()))
}

fn hash(path: &Path) -> Result<()> {
    let plan = read_plan(path)?;
    let commitment = plan.commitment()?;

    println!("Batch {} ({} recipients)", plan.batch_id, plan.recipients.len());
    for (index, leaf) in commitment.leaves.iter().enumerate() {
        println!("  leaf {:>4}: {}", index, to_hex(leaf));
    }
    println!("Merkle root: {}", commitment.merkle_root_hex());
    println!("Memo hash:   {}", commitment.memo_hash_hex());
    Ok(())
}

async fn commit(
    cli: &Cli,
    client: &RegistryClient,
    plan: &BatchPlan,
    execute: bool,
    export: Option<&Path>,
) -> Result<()> {
    let commitment = plan.commitment()?;
    let args = CommitArgs::from_plan(plan, &commitment);
    let receipt = client.commit(plan.creator, args).await?;

    println!("Committed batch {}", plan.batch_id);
    println!("Storage key: {}", receipt.storage_key_b58());
    println!("Signature:   {}", receipt.signature_b58());
    println!("Merkle root: {}", commitment.merkle_root_hex());
    println!("Memo hash:   {}", commitment.memo_hash_hex());

    let execution = if execute {
        let executor = executor_from_config(&executor_config(
            cli.executor,
            cli.executor_endpoint.as_deref(),
        ))?;
        info!("Executing batch {} with {} executor", plan.batch_id, executor.name());
        let result = executor.execute(plan).await?;
        println!("Execution:   {} ({:?})", result.order_id, result.status);
        Some(result)
    } else {
        None
    };

    if let Some(path) = export {
        let artifact = ExportArtifact::new(plan, &commitment, &receipt, client.is_mock(), execution);
        std::fs::write(path, artifact.to_pretty_json()?)
            .with_context(|| format!("writing export {}", path.display()))?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

/// Commitment record as printed by `moat fetch` or written by another client.
fn read_record(path: &Path) -> Result<CommitmentRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading record {}", path.display()))?;
    parse_record(&text).with_context(|| format!("invalid record {}", path.display()))
}

fn parse_record(text: &str) -> Result<CommitmentRecord> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    Ok(CommitmentRecord::from_json(&value)?)
}

fn print_verification(plan: &BatchPlan, report: &VerificationReport) -> Result<()> {
    let mark = |ok: bool| if ok { "match" } else { "MISMATCH" };
    println!("Storage key: {}", bs58::encode(report.storage_key).into_string());
    println!(
        "Merkle root: {} (stored {}) {}",
        to_hex(&report.computed_root),
        to_hex(&report.stored_root),
        mark(report.root_matches()),
    );
    println!(
        "Memo hash:   {} (stored {}) {}",
        to_hex(&report.computed_memo),
        to_hex(&report.stored_memo),
        mark(report.memo_matches()),
    );
    println!(
        "Kind:        {} (stored {}) {}",
        report.expected_kind,
        report.stored_kind,
        mark(report.kind_matches()),
    );

    if !report.is_valid() {
        bail!("batch {} does not match its commitment", plan.batch_id);
    }
    println!("Batch {} verified", plan.batch_id);
    Ok(())
}

fn action_name(action: &RegistryAction) -> &'static str {
    match action {
        RegistryAction::Init => "init",
        RegistryAction::Register { .. } => "register",
        RegistryAction::Show { .. } => "show",
    }
}

async fn registry(client: &RegistryClient, action: &RegistryAction) -> Result<()> {
    match action {
        RegistryAction::Init => {
            let state = client.initialize_registry().await?;
            let address = bs58::encode(client.registry_address().0).into_string();
            println!("Registry initialized at {}", address);
            println!("Admin: {}", bs58::encode(state.admin).into_string());
        }
        RegistryAction::Register { target, kind } => {
            let target = decode_identity(target).context("--target")?;
            let kind = parse_kind(*kind)?;
            let entry = client.register_entry(target, kind).await?;
            println!(
                "Registered {} as entry {}",
                bs58::encode(entry.target_program).into_string(),
                entry.id,
            );
        }
        RegistryAction::Show { id: Some(id) } => {
            let entry = client.get_registry_entry(*id).await?;
            let view = json!({
                "id": entry.id,
                "registry": bs58::encode(entry.registry).into_string(),
                "admin": bs58::encode(entry.admin).into_string(),
                "targetProgram": bs58::encode(entry.target_program).into_string(),
                "kind": entry.kind,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        RegistryAction::Show { id: None } => {
            let state = client.get_registry_state().await?;
            let view = json!({
                "address": bs58::encode(client.registry_address().0).into_string(),
                "admin": bs58::encode(state.admin).into_string(),
                "nextId": state.next_id,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }
    Ok(())
}
