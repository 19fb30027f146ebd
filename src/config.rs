//! Configuration for the Verdent trial client.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `verdent.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `VERDENT_API_HOST` - Base URL of the API host
//! - `VERDENT_AGENT_HOST` - Base URL of the agent host (account info)
//! - `VERDENT_LOGIN_HOST` - Base URL of the login host (PKCE callback)
//! - `VERDENT_TIMEOUT_SECS` - Default request timeout in seconds
//! - `VERDENT_DEBUG` - Trace every request/response pair
//! - `VERDENT_PROXY` - Proxy URL (`http://`, `https://` or `socks5://`)
//! - `VERDENT_LOGGING_ENABLED` - Enable log output
//! - `VERDENT_LOG_LEVEL` - Log level (trace, debug, info, warn, error)

use config::Config;
use reqwest::Url;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::client::proxy::ProxyRoutes;
use crate::errors::{TrialError, TrialResult};

pub const DEFAULT_API_HOST: &str = "https://api.verdent.ai";
pub const DEFAULT_AGENT_HOST: &str = "https://agent.verdent.ai";
pub const DEFAULT_LOGIN_HOST: &str = "https://login.verdent.ai";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Global configuration singleton.
static CONFIG: OnceLock<TrialConfig> = OnceLock::new();

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    /// Endpoints and request behaviour
    pub api: ApiConfig,
    /// Outbound proxy
    pub proxy: ProxyConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Endpoint and request configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub api_host: String,
    pub agent_host: String,
    pub login_host: String,
    /// Default per-request timeout in seconds
    pub timeout_secs: u64,
    /// Trace request/response pairs
    pub debug: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            agent_host: DEFAULT_AGENT_HOST.to_string(),
            login_host: DEFAULT_LOGIN_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
        }
    }
}

/// Proxy configuration. No URL means direct connection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub url: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
        }
    }
}

fn config_err(e: config::ConfigError) -> TrialError {
    TrialError::Config(e.to_string())
}

impl TrialConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `verdent.toml` file (optional)
    /// 3. Environment variables
    pub fn load() -> TrialResult<Self> {
        let builder = Config::builder()
            .set_default("api.api_host", DEFAULT_API_HOST)
            .map_err(config_err)?
            .set_default("api.agent_host", DEFAULT_AGENT_HOST)
            .map_err(config_err)?
            .set_default("api.login_host", DEFAULT_LOGIN_HOST)
            .map_err(config_err)?
            .set_default("api.timeout_secs", DEFAULT_TIMEOUT_SECS)
            .map_err(config_err)?
            .set_default("api.debug", false)
            .map_err(config_err)?
            .set_default("logging.enabled", true)
            .map_err(config_err)?
            .set_default("logging.level", "info")
            .map_err(config_err)?
            // Load from verdent.toml (optional)
            .add_source(config::File::with_name("verdent").required(false))
            // Override with environment variables
            .set_override_option("api.api_host", env::var("VERDENT_API_HOST").ok())
            .map_err(config_err)?
            .set_override_option("api.agent_host", env::var("VERDENT_AGENT_HOST").ok())
            .map_err(config_err)?
            .set_override_option("api.login_host", env::var("VERDENT_LOGIN_HOST").ok())
            .map_err(config_err)?
            .set_override_option(
                "api.timeout_secs",
                env::var("VERDENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_err)?
            .set_override_option(
                "api.debug",
                env::var("VERDENT_DEBUG")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option(
                "proxy.url",
                env::var("VERDENT_PROXY")
                    .ok()
                    .filter(|v| !v.trim().is_empty()),
            )
            .map_err(config_err)?
            .set_override_option(
                "logging.enabled",
                env::var("VERDENT_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_err)?
            .set_override_option("logging.level", env::var("VERDENT_LOG_LEVEL").ok())
            .map_err(config_err)?;

        let settings = builder
            .build()
            .map_err(|e| TrialError::Config(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| TrialError::Config(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> TrialResult<()> {
        for (key, value) in [
            ("api.api_host", &self.api.api_host),
            ("api.agent_host", &self.api.agent_host),
            ("api.login_host", &self.api.login_host),
        ] {
            validate_host(key, value)?;
        }

        if self.api.timeout_secs == 0 {
            return Err(TrialError::Config(
                "api.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.proxy.url {
            ProxyRoutes::parse(url)?;
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(TrialError::Config(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

impl TrialConfig {
    /// Whether request tracing is on, from config/env or the `--debug` flag.
    pub fn debug_enabled(&self, debug_flag: bool) -> bool {
        debug_flag || self.api.debug
    }

    /// Logging settings, with the level raised to `debug` whenever request
    /// tracing is on.
    pub fn effective_logging(&self, debug_flag: bool) -> LoggingConfig {
        let mut logging = self.logging.clone();
        if self.debug_enabled(debug_flag) {
            logging.enabled = true;
            logging.level = "debug".to_string();
        }
        logging
    }
}

fn validate_host(key: &str, value: &str) -> TrialResult<()> {
    let url = Url::parse(value)
        .map_err(|e| TrialError::Config(format!("{key} is not a valid URL '{value}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(TrialError::Config(format!(
            "{key} must use http or https, got '{other}'"
        ))),
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> TrialResult<&'static TrialConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = TrialConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is valid.
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrialConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.proxy.url.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = TrialConfig::default();
        config.api.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(TrialError::Config(_))));
    }

    #[test]
    fn non_http_host_is_rejected() {
        let mut config = TrialConfig::default();
        config.api.agent_host = "ftp://agent.example".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_proxy_is_rejected() {
        let mut config = TrialConfig::default();
        config.proxy.url = Some("gopher://127.0.0.1:70".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn configured_debug_raises_log_level() {
        let mut config = TrialConfig::default();
        config.api.debug = true;
        config.logging.enabled = false;

        let logging = config.effective_logging(false);
        assert!(logging.enabled);
        assert_eq!(logging.level, "debug");
        assert!(config.debug_enabled(false));
    }

    #[test]
    fn debug_flag_raises_log_level() {
        let config = TrialConfig::default();
        assert_eq!(config.effective_logging(true).level, "debug");
        assert!(config.debug_enabled(true));
    }

    #[test]
    fn log_level_untouched_without_debug() {
        let mut config = TrialConfig::default();
        config.logging.level = "warn".to_string();
        assert_eq!(config.effective_logging(false).level, "warn");
        assert!(!config.debug_enabled(false));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let mut config = TrialConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
