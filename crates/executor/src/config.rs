//! Executor selection

use serde::{Deserialize, Serialize};

use crate::{ExecutionError, LiveExecutor, NullExecutor, Result, SwapExecutor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    #[default]
    Null,
    Live,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    pub mode: ExecutorMode,
    /// Base URL of the order service (Live mode only)
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl ExecutorConfig {
    pub fn null() -> Self {
        Self::default()
    }

    pub fn live(endpoint: impl Into<String>) -> Self {
        Self {
            mode: ExecutorMode::Live,
            endpoint: Some(endpoint.into()),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Build the executor named by `config`.
pub fn executor_from_config(config: &ExecutorConfig) -> Result<Box<dyn SwapExecutor>> {
    match (config.mode, &config.endpoint) {
        (ExecutorMode::Live, Some(endpoint)) => Ok(Box::new(LiveExecutor::new(
            endpoint.clone(),
            config.api_key.clone(),
        ))),
        (ExecutorMode::Live, None) => Err(ExecutionError::NotConfigured(
            "live executor requires an endpoint".to_string(),
        )),
        (ExecutorMode::Null, _) => Ok(Box::new(NullExecutor::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_by_config() {
        assert_eq!(executor_from_config(&ExecutorConfig::null()).unwrap().name(), "null");
        assert_eq!(
            executor_from_config(&ExecutorConfig::live("http://x")).unwrap().name(),
            "live"
        );

        let missing = ExecutorConfig { mode: ExecutorMode::Live, endpoint: None, api_key: None };
        assert!(matches!(
            executor_from_config(&missing),
            Err(ExecutionError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_config_json() {
        let config: ExecutorConfig =
            serde_json::from_str(r#"{"mode":"live","endpoint":"http://x","apiKey":"k"}"#).unwrap();
        assert_eq!(config, ExecutorConfig::live("http://x").with_api_key("k"));
    }
}
