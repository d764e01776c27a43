//! Moat Executor
//!
//! Adapters that carry out the payouts of a batch after it has been
//! committed. The registry never depends on an executor: committing and
//! verifying work the same whether or not anything is executed.
//!
//! - [`NullExecutor`]: no I/O, deterministic simulated receipt
//! - [`LiveExecutor`]: submits the batch to an HTTP order endpoint
//!
//! The variant is chosen from [`ExecutorConfig`] via [`executor_from_config`].

mod config;
mod live;
mod null;
mod traits;

pub use config::{executor_from_config, ExecutorConfig, ExecutorMode};
pub use live::{LiveExecutor, OrderRequest};
pub use null::NullExecutor;
pub use traits::{ExecutionError, ExecutionReceipt, ExecutionStatus, Result, SwapExecutor};
