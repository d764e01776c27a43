//! Moat Registry
//!
//! Client for the `moat_registry` Solana program.
//!
//! ## Commitment Flow
//!
//! 1. **Hash**: the caller reduces a batch plan to `(merkle_root, memo_hash)`
//!    with `moat-core`. Hashing errors abort before any network call.
//! 2. **Commit**: the creator signs `commit_batch`, which creates the
//!    `BatchCommitment` account at `PDA(["batch", creator, batch_id_le])`.
//!    The ledger's account creation is atomic, so a second commit for the
//!    same `(creator, batch_id)` fails with `AlreadyCommitted`.
//! 3. **Verify**: anyone recomputes both digests from the original plan and
//!    compares them with the stored record.
//!
//! The registry directory is a separate admin-only catalog of target
//! programs, numbered sequentially from 0.

pub mod accounts;
mod client;
mod ledger;
mod shape;
mod types;

pub use client::{RegistryClient, RegistryConfig, RegistryMode};
pub use ledger::{LedgerError, MockLedger, Transaction};
pub use types::*;

use moat_core::{ErrorKind, MoatError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    Invalid(#[from] MoatError),

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Batch {batch_id} already committed by {creator}")]
    AlreadyCommitted { creator: String, batch_id: u64 },

    #[error("Registry already initialized")]
    AlreadyInitialized,

    #[error("Registry not initialized")]
    NotInitialized,

    #[error("Registry entry counter overflow")]
    CounterOverflow,

    #[error("Registry entry {0} already exists")]
    EntryIdTaken(u32),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(e) => e.kind(),
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::AlreadyCommitted { .. }
            | Self::AlreadyInitialized
            | Self::CounterOverflow
            | Self::EntryIdTaken(_) => ErrorKind::Conflict,
            Self::NotInitialized | Self::NotFound(_) => ErrorKind::NotFound,
            Self::MalformedRecord(_) => ErrorKind::Shape,
            Self::RpcError(_) | Self::TransactionFailed(_) => ErrorKind::TransientInfrastructure,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(RegistryError::from(MoatError::EmptyInput).kind(), ErrorKind::Validation);
        assert_eq!(RegistryError::Unauthorized("x".into()).kind(), ErrorKind::Authorization);
        assert_eq!(
            RegistryError::AlreadyCommitted { creator: "c".into(), batch_id: 1 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(RegistryError::AlreadyInitialized.kind(), ErrorKind::Conflict);
        assert_eq!(RegistryError::EntryIdTaken(4).kind(), ErrorKind::Conflict);
        assert_eq!(RegistryError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(RegistryError::MalformedRecord("x".into()).kind(), ErrorKind::Shape);
        assert_eq!(RegistryError::RpcError("x".into()).kind(), ErrorKind::TransientInfrastructure);
    }
}
