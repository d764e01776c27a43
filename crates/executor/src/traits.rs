//! Executor seam shared by all adapters

use async_trait::async_trait;
use moat_core::{BatchPlan, ErrorKind, MoatError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionStatus {
    /// Nothing was sent anywhere
    Simulated,
    /// Accepted by the endpoint, not yet settled
    Submitted,
    Filled,
    Failed,
}

/// What an executor reports back for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
    pub order_id: String,
    pub status: ExecutionStatus,
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    InvalidPlan(#[from] MoatError),

    #[error("Executor not configured: {0}")]
    NotConfigured(String),

    #[error("Executor rejected order: {0}")]
    Rejected(String),

    #[error("Executor unavailable: {0}")]
    Transient(String),

    #[error("Invalid executor response: {0}")]
    InvalidResponse(String),
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPlan(e) => e.kind(),
            Self::NotConfigured(_) | Self::Rejected(_) => ErrorKind::Validation,
            Self::Transient(_) => ErrorKind::TransientInfrastructure,
            Self::InvalidResponse(_) => ErrorKind::Shape,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Carries out the payouts of a batch plan.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    /// Short adapter name for logs and export artifacts
    fn name(&self) -> &'static str;

    async fn execute(&self, plan: &BatchPlan) -> Result<ExecutionReceipt>;
}
