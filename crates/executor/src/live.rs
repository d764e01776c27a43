//! HTTP order submission

use std::time::Duration;

use async_trait::async_trait;
use moat_core::{to_hex, BatchPlan, Memo, Recipient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{ExecutionError, ExecutionReceipt, Result, SwapExecutor};

const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Body POSTed to `<endpoint>/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// Base58 creator identity
    pub creator: String,
    pub batch_id: u64,
    pub kind: u8,
    pub merkle_root: String,
    pub memo_hash: String,
    pub recipients: Vec<Recipient>,
    pub memo: Memo,
}

impl OrderRequest {
    pub fn from_plan(plan: &BatchPlan) -> Result<Self> {
        let commitment = plan.commitment()?;
        Ok(Self {
            creator: bs58::encode(plan.creator).into_string(),
            batch_id: plan.batch_id,
            kind: plan.kind,
            merkle_root: to_hex(&commitment.merkle_root),
            memo_hash: to_hex(&commitment.memo_hash),
            recipients: plan.recipients.clone(),
            memo: plan.memo.clone(),
        })
    }
}

/// Executor backed by an HTTP order service.
pub struct LiveExecutor {
    endpoint: String,
    api_key: Option<String>,
    backoff: Duration,
    http: reqwest::Client,
}

impl LiveExecutor {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            backoff: DEFAULT_BACKOFF,
            http: reqwest::Client::new(),
        }
    }

    /// Override the base retry delay (doubled after each failed attempt).
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn orders_url(&self) -> String {
        format!("{}/orders", self.endpoint)
    }
}

#[async_trait]
impl SwapExecutor for LiveExecutor {
    fn name(&self) -> &'static str {
        "live"
    }

    /// Submit the batch. Retries up to 3 times with exponential backoff on
    /// transport errors and 5xx responses; a 4xx response fails immediately.
    async fn execute(&self, plan: &BatchPlan) -> Result<ExecutionReceipt> {
        let body = OrderRequest::from_plan(plan)?;
        let url = self.orders_url();
        debug!("Submitting batch {} to {}", plan.batch_id, url);

        let mut last_err = ExecutionError::Transient("no attempts made".into());
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = self.backoff * 2u32.pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }

            let mut request = self.http.post(&url).json(&body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_client_error() {
                        let text = resp.text().await.unwrap_or_default();
                        return Err(ExecutionError::Rejected(format!("HTTP {}: {}", status, text)));
                    }
                    if !status.is_success() {
                        warn!("Executor attempt {} failed: HTTP {}", attempt + 1, status);
                        last_err = ExecutionError::Transient(format!("HTTP {}", status));
                        continue;
                    }

                    let receipt = resp
                        .json::<ExecutionReceipt>()
                        .await
                        .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;
                    info!(
                        "Batch {} submitted as order {} ({:?})",
                        plan.batch_id, receipt.order_id, receipt.status,
                    );
                    return Ok(receipt);
                }
                Err(e) => {
                    warn!("Executor attempt {} failed: {}", attempt + 1, e);
                    last_err = ExecutionError::Transient(format!("request error: {}", e));
                }
            }
        }

        Err(last_err)
    }
}
