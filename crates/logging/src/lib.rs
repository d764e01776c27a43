//! Moat Logging
//!
//! Shared `tracing-subscriber` setup for Moat binaries.
//!
//! Output goes to stderr so that command output on stdout (digests, JSON
//! records) stays machine-readable. The chosen level applies to the Moat
//! crates only; RPC and HTTP dependencies stay at `warn` unless `RUST_LOG`
//! says otherwise.
//!
//! ```no_run
//! use moat_logging::{init, LogLevel};
//!
//! // `-v` count from the command line
//! init(LogLevel::from_verbosity(1));
//! ```

use tracing_subscriber::EnvFilter;

/// Crates whose level follows the command-line verbosity
const MOAT_TARGETS: &[&str] = &["moat", "moat_core", "moat_registry", "moat_executor"];

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Create a log level from a verbosity count
    ///
    /// - `0` → `Info`
    /// - `1` → `Debug`
    /// - `2+` → `Trace`
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(level: LogLevel) -> String {
    let mut directive = String::from("warn");
    for target in MOAT_TARGETS {
        directive.push_str(&format!(",{}={}", target, level.as_str()));
    }
    directive
}

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)))
}

/// Initialize logging with the specified level
///
/// # Panics
///
/// Panics if a global subscriber is already set. Use `try_init` to handle
/// that case.
pub fn init(level: LogLevel) {
    try_init(level).expect("Failed to initialize logging");
}

/// Try to initialize logging, returning an error if already initialized
pub fn try_init(level: LogLevel) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| e.to_string())
}

/// Initialize logging for tests (captured by the test harness)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(default_directive(LogLevel::Debug)))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(2), LogLevel::Trace);
        assert_eq!(LogLevel::from_verbosity(10), LogLevel::Trace);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_default_directive_scopes_moat_crates() {
        let directive = default_directive(LogLevel::Debug);
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("moat_registry=debug"));
        assert!(directive.contains("moat=debug"));
        assert!(!directive.contains("solana"));
    }

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
        assert!(try_init(LogLevel::Info).is_err());
    }
}
