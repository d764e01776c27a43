//! Validation errors raised while encoding and hashing a batch.

use thiserror::Error;

/// Failure category shared by every crate in the workspace.
///
/// Callers branch on the category (retry, surface to the user, treat as a
/// schema mismatch) without matching every concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input. Caller-fixable, never retried.
    Validation,
    /// Wrong signer for a privileged write.
    Authorization,
    /// Duplicate commitment or duplicate initialization.
    Conflict,
    /// Query against an address with no record.
    NotFound,
    /// Stored record matches none of the known representations.
    Shape,
    /// Network or endpoint flakiness. Retryable by the submission layer.
    TransientInfrastructure,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoatError {
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("{field} is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Empty input: at least one leaf is required")]
    EmptyInput,

    #[error("Recipient {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("Invalid {field} length: expected 32 bytes, got {actual}")]
    InvalidHashLength { field: &'static str, actual: usize },

    #[error("Invalid kind {0}: must be an integer in [0, 255]")]
    InvalidKind(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MoatError {
    /// Every core error is a validation failure: hashing aborts before any
    /// ledger access happens.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

pub type Result<T> = std::result::Result<T, MoatError>;
