//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::{MessageFormat, SessionConfig};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:2222/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Session and token persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_token_max_age")]
    pub token_max_age_secs: u64,

    #[serde(default = "default_verify_timeout")]
    pub verify_timeout_secs: u64,

    #[serde(default)]
    pub message_format: MessageFormat,

    #[serde(default)]
    pub revalidate_on_chain_change: bool,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("vigichain-admin").to_string_lossy().to_string())
        .unwrap_or_else(|| "./vigichain_data".to_string())
}

fn default_token_max_age() -> u64 {
    86_400 // 24 hours
}

fn default_verify_timeout() -> u64 {
    30
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            token_max_age_secs: default_token_max_age(),
            verify_timeout_secs: default_verify_timeout(),
            message_format: MessageFormat::default(),
            revalidate_on_chain_change: false,
        }
    }
}

impl SessionSettings {
    /// Path of the persisted session cookie
    pub fn cookie_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("session.cookie")
    }

    /// Runtime settings for the session manager
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            token_max_age: Duration::from_secs(self.token_max_age_secs),
            verify_timeout: Duration::from_secs(self.verify_timeout_secs),
            revalidate_on_chain_change: self.revalidate_on_chain_change,
        }
    }
}

/// Wallet provider configuration
///
/// A private key selects the in-process wallet; otherwise the JSON-RPC
/// endpoint is used. Neither set means no wallet is available.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub rpc_url: Option<String>,

    pub private_key: Option<String>,

    #[serde(default = "default_chain_id")]
    pub chain_id: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_chain_id() -> String {
    "0x1".to_string()
}

fn default_poll_interval() -> u64 {
    2000
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            private_key: None,
            chain_id: default_chain_id(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("vigichain-admin").join("config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // API overrides
        if let Some(url) = lookup("VIGICHAIN_API_URL") {
            self.api.base_url = url;
        }
        if let Some(timeout) = lookup("VIGICHAIN_API_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.api.request_timeout_secs = t;
            }
        }

        // Session overrides
        if let Some(data_dir) = lookup("VIGICHAIN_DATA_DIR") {
            self.session.data_dir = data_dir;
        }
        if let Some(format) = lookup("VIGICHAIN_MESSAGE_FORMAT") {
            match format.parse() {
                Ok(f) => self.session.message_format = f,
                Err(e) => tracing::warn!("Ignoring VIGICHAIN_MESSAGE_FORMAT: {}", e),
            }
        }

        // Wallet overrides
        if let Some(rpc_url) = lookup("VIGICHAIN_RPC_URL") {
            self.wallet.rpc_url = Some(rpc_url);
        }
        if let Some(key) = lookup("VIGICHAIN_PRIVATE_KEY") {
            self.wallet.private_key = Some(key);
        }
        if let Some(chain_id) = lookup("VIGICHAIN_CHAIN_ID") {
            self.wallet.chain_id = chain_id;
        }

        // Logging overrides
        if let Some(level) = lookup("VIGICHAIN_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("VIGICHAIN_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# VigiChain Admin Configuration
#
# Environment variables override these settings:
# - VIGICHAIN_API_URL
# - VIGICHAIN_API_TIMEOUT
# - VIGICHAIN_DATA_DIR
# - VIGICHAIN_MESSAGE_FORMAT
# - VIGICHAIN_RPC_URL
# - VIGICHAIN_PRIVATE_KEY
# - VIGICHAIN_CHAIN_ID
# - VIGICHAIN_LOG_LEVEL
# - VIGICHAIN_LOG_FORMAT

[api]
# Backend base URL (all resource paths are appended, e.g. /v1/wallets)
base_url = "http://localhost:2222/api"

# Request timeout in seconds
request_timeout_secs = 30

[session]
# Directory holding the session cookie (default: platform data dir)
# data_dir = "/var/lib/vigichain-admin"

# Lifetime of the persisted token (seconds)
token_max_age_secs = 86400

# Upper bound on the signature verification call (seconds)
verify_timeout_secs = 30

# Signed login message: "timestamp" or "nonce"
message_format = "timestamp"

# Re-verify the identity when the wallet switches chains
revalidate_on_chain_change = false

[wallet]
# JSON-RPC endpoint of a signing wallet
# rpc_url = "http://127.0.0.1:8545"

# Hex private key for the in-process wallet (prefer VIGICHAIN_PRIVATE_KEY)
# private_key = ""

# Chain reported by the in-process wallet
chain_id = "0x1"

# How often the JSON-RPC wallet is polled for account/chain changes (ms)
poll_interval_ms = 2000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:2222/api");
        assert_eq!(config.session.token_max_age_secs, 86_400);
        assert_eq!(config.session.verify_timeout_secs, 30);
        assert_eq!(config.session.message_format, MessageFormat::Timestamp);
        assert!(config.wallet.private_key.is_none());
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.wallet.chain_id, "0x1");
        assert_eq!(config.logging.format, "pretty");
        assert!(!config.session.revalidate_on_chain_change);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::parse(
            r#"
[session]
message_format = "nonce"
verify_timeout_secs = 5
"#,
        )
        .unwrap();

        assert_eq!(config.session.message_format, MessageFormat::Nonce);
        assert_eq!(config.session.session_config().verify_timeout, Duration::from_secs(5));
        assert_eq!(config.api.base_url, default_base_url());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VIGICHAIN_API_URL", "https://admin.example.org/api"),
            ("VIGICHAIN_DATA_DIR", "/tmp/vigi"),
            ("VIGICHAIN_MESSAGE_FORMAT", "bogus"),
            ("VIGICHAIN_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://admin.example.org/api");
        assert_eq!(config.session.cookie_path(), PathBuf::from("/tmp/vigi/session.cookie"));
        // invalid values leave the default untouched
        assert_eq!(config.session.message_format, MessageFormat::Timestamp);
        assert_eq!(config.logging.format, "json");
    }
}
