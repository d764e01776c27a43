use async_trait::async_trait;
use moat_core::{to_hex, BatchPlan};
use tracing::info;

use crate::{ExecutionReceipt, ExecutionStatus, Result, SwapExecutor};

/// Executor that only simulates. The order id is derived from the batch's
/// merkle root, so the same plan always yields the same receipt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullExecutor;

impl NullExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SwapExecutor for NullExecutor {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn execute(&self, plan: &BatchPlan) -> Result<ExecutionReceipt> {
        let commitment = plan.commitment()?;
        let root_hex = to_hex(&commitment.merkle_root);
        let order_id = format!("null-{}", &root_hex[..16]);

        info!(
            "[MOCK] Simulated execution of batch {} ({} recipients) as {}",
            plan.batch_id,
            plan.recipients.len(),
            order_id,
        );

        Ok(ExecutionReceipt {
            order_id,
            status: ExecutionStatus::Simulated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moat_core::{Memo, Recipient};

    fn plan() -> BatchPlan {
        BatchPlan::new(
            [1u8; 32],
            0,
            0,
            vec![Recipient::new(
                "solana:devnet:R1",
                "1.25",
                "solana:devnet:So11111111111111111111111111111111111111112",
            )],
            Memo::new(Some("t"), Some(""), "2024-01-01T00:00:00.000Z"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_deterministic_order_id() {
        let receipt = NullExecutor::new().execute(&plan()).await.unwrap();
        assert_eq!(receipt.order_id, "null-f018a091eb77e30a");
        assert_eq!(receipt.status, ExecutionStatus::Simulated);

        let again = NullExecutor::new().execute(&plan()).await.unwrap();
        assert_eq!(receipt, again);
    }

    #[tokio::test]
    async fn test_order_id_tracks_root() {
        let mut other = plan();
        other.batch_id = 1;
        let a = NullExecutor::new().execute(&plan()).await.unwrap();
        let b = NullExecutor::new().execute(&other).await.unwrap();
        assert_ne!(a.order_id, b.order_id);
    }
}
