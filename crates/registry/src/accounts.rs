//! Account data layouts and instruction encoding for `moat_registry`.
//!
//! Anchor accounts are an 8-byte discriminator (`SHA256("account:<Name>")[..8]`)
//! followed by the borsh-encoded fields. Instructions are
//! `SHA256("global:<name>")[..8]` followed by borsh-encoded arguments.
//! These layouts must match `programs/moat-registry`.

use sha2::{Digest, Sha256};

use crate::types::{AccountAddress, CommitArgs, CommitmentRecord, RegistryEntry, RegistryState};
use crate::{RegistryError, Result};

/// Byte offset of `creator` inside a `BatchCommitment` account (after the discriminator).
pub const CREATOR_OFFSET: usize = 8;

/// disc + creator + batch_id + kind + merkle_root + memo_hash + created_at + bump
pub const COMMITMENT_ACCOUNT_LEN: usize = 8 + 32 + 8 + 1 + 32 + 32 + 8 + 1;

/// disc + admin + next_id + bump
pub const REGISTRY_STATE_LEN: usize = 8 + 32 + 4 + 1;

/// disc + registry + id + admin + target_program + kind + bump
pub const REGISTRY_ENTRY_LEN: usize = 8 + 32 + 4 + 32 + 32 + 1 + 1;

/// Anchor discriminator: first 8 bytes of `SHA256("<namespace>:<name>")`.
pub fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let hash = hasher.finalize();
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

pub fn commitment_discriminator() -> [u8; 8] {
    anchor_discriminator("account", "BatchCommitment")
}

pub fn registry_state_discriminator() -> [u8; 8] {
    anchor_discriminator("account", "RegistryState")
}

pub fn registry_entry_discriminator() -> [u8; 8] {
    anchor_discriminator("account", "RegistryEntry")
}

/// Sequential reader over account bytes whose total length was checked upfront.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], expected_disc: [u8; 8], expected_len: usize, what: &str) -> Result<Self> {
        if data.len() < expected_len {
            return Err(RegistryError::MalformedRecord(format!(
                "{what}: expected {expected_len} bytes, got {}",
                data.len()
            )));
        }
        if data[..8] != expected_disc {
            return Err(RegistryError::MalformedRecord(format!("{what}: discriminator mismatch")));
        }
        Ok(Self { data, pos: 8 })
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.array::<1>()[0]
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.array())
    }

    fn i64(&mut self) -> i64 {
        i64::from_le_bytes(self.array())
    }
}

pub fn encode_commitment_account(record: &CommitmentRecord, bump: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(COMMITMENT_ACCOUNT_LEN);
    data.extend_from_slice(&commitment_discriminator());
    data.extend_from_slice(&record.creator);
    data.extend_from_slice(&record.batch_id.to_le_bytes());
    data.push(record.kind);
    data.extend_from_slice(&record.merkle_root);
    data.extend_from_slice(&record.memo_hash);
    data.extend_from_slice(&record.created_at.to_le_bytes());
    data.push(bump);
    data
}

pub fn decode_commitment_account(data: &[u8]) -> Result<CommitmentRecord> {
    let mut r = Reader::new(data, commitment_discriminator(), COMMITMENT_ACCOUNT_LEN, "BatchCommitment")?;
    Ok(CommitmentRecord {
        creator: r.array(),
        batch_id: r.u64(),
        kind: r.u8(),
        merkle_root: r.array(),
        memo_hash: r.array(),
        created_at: r.i64(),
    })
}

pub fn encode_registry_state(state: &RegistryState) -> Vec<u8> {
    let mut data = Vec::with_capacity(REGISTRY_STATE_LEN);
    data.extend_from_slice(&registry_state_discriminator());
    data.extend_from_slice(&state.admin);
    data.extend_from_slice(&state.next_id.to_le_bytes());
    data.push(state.bump);
    data
}

pub fn decode_registry_state(data: &[u8]) -> Result<RegistryState> {
    let mut r = Reader::new(data, registry_state_discriminator(), REGISTRY_STATE_LEN, "RegistryState")?;
    Ok(RegistryState {
        admin: r.array(),
        next_id: r.u32(),
        bump: r.u8(),
    })
}

pub fn encode_registry_entry(entry: &RegistryEntry) -> Vec<u8> {
    let mut data = Vec::with_capacity(REGISTRY_ENTRY_LEN);
    data.extend_from_slice(&registry_entry_discriminator());
    data.extend_from_slice(&entry.registry);
    data.extend_from_slice(&entry.id.to_le_bytes());
    data.extend_from_slice(&entry.admin);
    data.extend_from_slice(&entry.target_program);
    data.push(entry.kind);
    data.push(entry.bump);
    data
}

pub fn decode_registry_entry(data: &[u8]) -> Result<RegistryEntry> {
    let mut r = Reader::new(data, registry_entry_discriminator(), REGISTRY_ENTRY_LEN, "RegistryEntry")?;
    Ok(RegistryEntry {
        registry: r.array(),
        id: r.u32(),
        admin: r.array(),
        target_program: r.array(),
        kind: r.u8(),
        bump: r.u8(),
    })
}

/// Instruction data builders.
pub mod instruction {
    use super::*;

    pub fn commit_batch(args: &CommitArgs) -> Vec<u8> {
        let mut data = anchor_discriminator("global", "commit_batch").to_vec();
        data.extend_from_slice(&args.batch_id.to_le_bytes());
        data.push(args.kind);
        data.extend_from_slice(&args.merkle_root);
        data.extend_from_slice(&args.memo_hash);
        data
    }

    pub fn initialize_registry() -> Vec<u8> {
        anchor_discriminator("global", "initialize_registry").to_vec()
    }

    pub fn register_entry(target_program: &AccountAddress, kind: u8) -> Vec<u8> {
        let mut data = anchor_discriminator("global", "register_entry").to_vec();
        data.extend_from_slice(target_program);
        data.push(kind);
        data
    }
}
