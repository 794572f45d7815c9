use crate::{FixtureError, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable enabling debug logging when set to `1` or `true`
pub const DEBUG_ENV: &str = "TUNFIXTURE_DEBUG";

/// Logging configuration, applied once at process start
///
/// # Examples
///
/// ```
/// use tunfixture::LogConfig;
///
/// let config = LogConfig::default();
/// assert!(!config.debug);
/// assert_eq!(config.directive(), "tunfixture=info");
///
/// let config = LogConfig::debug();
/// assert_eq!(config.directive(), "tunfixture=debug");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Log this crate at debug level instead of info
    pub debug: bool,
    /// Explicit filter directive, overriding `debug` (e.g. `"tunfixture=trace,rustls=debug"`)
    pub filter: Option<String>,
}

impl LogConfig {
    pub fn debug() -> Self {
        Self {
            debug: true,
            filter: None,
        }
    }

    /// Reads [`DEBUG_ENV`] and `RUST_LOG`
    pub fn from_env() -> Self {
        let debug = std::env::var(DEBUG_ENV)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let filter = std::env::var(EnvFilter::DEFAULT_ENV)
            .ok()
            .filter(|v| !v.is_empty());
        Self { debug, filter }
    }

    /// The filter directive this configuration installs
    pub fn directive(&self) -> String {
        match &self.filter {
            Some(filter) => filter.clone(),
            None if self.debug => "tunfixture=debug".to_string(),
            None => "tunfixture=info".to_string(),
        }
    }

    pub fn env_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(self.directive())
            .map_err(|e| FixtureError::Config(format!("invalid log filter: {e}")))
    }

    /// Installs the global subscriber. Fails if one is already installed.
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(self.env_filter()?)
            .try_init()
            .map_err(|e| FixtureError::Config(format!("failed to install logger: {e}")))
    }
}
