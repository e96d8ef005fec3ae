//! # Settlement Configuration
//!
//! TOML-backed configuration for the settlement engine and server.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Explicit path passed to SettleConfig::load(path)                   │
//! │                                                                         │
//! │  2. Default config file location                                       │
//! │     ~/.config/bazaar/settle.toml (Linux)                               │
//! │     ~/Library/Application Support/com.bazaar.shop/settle.toml (macOS)  │
//! │                                                                         │
//! │  3. Default values (lowest priority)                                   │
//! │     50-minute refresh, 10s provider timeout, port 8080                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # settle.toml
//! [provider]
//! url = "https://rates.example.com/v1/latest"
//! api_key = "prv_live_..."
//! refresh_interval_secs = 3000   # 50 minutes
//! request_timeout_secs = 10
//!
//! [gateway]
//! signing_secret = "whsec_..."
//!
//! [server]
//! port = 8080
//! bind_addr = "0.0.0.0"
//!
//! [database]
//! path = "./bazaar.db"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SettleError, SettleResult};

// =============================================================================
// Provider Settings
// =============================================================================

/// External exchange-rate provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Endpoint returning `{ "rates": { "<code>": <number>, ... } }`.
    #[serde(default)]
    pub url: String,

    /// API key sent with each request.
    #[serde(default)]
    pub api_key: String,

    /// Seconds between synchronization runs.
    /// Default: 3000 (50 minutes).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Hard timeout on the provider HTTP call (seconds). A fetch that
    /// exceeds this fails the run explicitly instead of hanging the
    /// schedule.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_refresh_interval() -> u64 {
    3000
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            url: String::new(),
            api_key: String::new(),
            refresh_interval_secs: default_refresh_interval(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Gateway Settings
// =============================================================================

/// Payment gateway webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Shared secret for HMAC-SHA256 webhook signatures.
    #[serde(default)]
    pub signing_secret: String,
}

// =============================================================================
// Server Settings
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address (default: 0.0.0.0 for all interfaces).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            port: default_port(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl ServerSettings {
    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Database location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "./bazaar.db".to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
        }
    }
}

// =============================================================================
// Main Settlement Configuration
// =============================================================================

/// Complete settlement configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettleConfig {
    /// Exchange-rate provider settings.
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Payment gateway settings.
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl SettleConfig {
    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults (which fail [`validate`] until
    /// the provider URL and gateway secret are supplied).
    ///
    /// [`validate`]: SettleConfig::validate
    pub fn load(path: impl AsRef<Path>) -> SettleResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(SettleConfig::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| SettleError::ConfigLoadFailed(e.to_string()))?;

        let config: SettleConfig =
            toml::from_str(&raw).map_err(|e| SettleError::ConfigLoadFailed(e.to_string()))?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Loads configuration from the platform default location.
    pub fn load_default() -> SettleResult<Self> {
        Self::load(Self::default_path()?)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> SettleResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettleError::ConfigSaveFailed(e.to_string()))?;
        }

        let raw =
            toml::to_string_pretty(self).map_err(|e| SettleError::ConfigSaveFailed(e.to_string()))?;

        std::fs::write(path, raw).map_err(|e| SettleError::ConfigSaveFailed(e.to_string()))?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Platform default config file path.
    pub fn default_path() -> SettleResult<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "bazaar", "shop")
            .ok_or_else(|| SettleError::ConfigLoadFailed("No home directory".to_string()))?;

        Ok(dirs.config_dir().join("settle.toml"))
    }

    /// Validates the configuration for running the full engine.
    ///
    /// ## Checks
    /// - Provider URL present and http(s)
    /// - Gateway signing secret present
    /// - Non-zero refresh interval and request timeout
    pub fn validate(&self) -> SettleResult<()> {
        if self.provider.url.is_empty() {
            return Err(SettleError::InvalidConfig(
                "provider.url is required".to_string(),
            ));
        }

        if !self.provider.url.starts_with("http://") && !self.provider.url.starts_with("https://")
        {
            return Err(SettleError::InvalidConfig(format!(
                "provider.url must be http(s), got: {}",
                self.provider.url
            )));
        }

        if self.gateway.signing_secret.is_empty() {
            return Err(SettleError::InvalidConfig(
                "gateway.signing_secret is required".to_string(),
            ));
        }

        if self.provider.refresh_interval_secs == 0 {
            return Err(SettleError::InvalidConfig(
                "provider.refresh_interval_secs must be non-zero".to_string(),
            ));
        }

        if self.provider.request_timeout_secs == 0 {
            return Err(SettleError::InvalidConfig(
                "provider.request_timeout_secs must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Refresh interval as a Duration.
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.provider.refresh_interval_secs)
    }

    /// Provider request timeout as a Duration.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.provider.request_timeout_secs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SettleConfig {
        let mut config = SettleConfig::default();
        config.provider.url = "https://rates.example.com/v1/latest".to_string();
        config.provider.api_key = "key".to_string();
        config.gateway.signing_secret = "whsec_test".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = SettleConfig::default();
        assert_eq!(config.provider.refresh_interval_secs, 3000);
        assert_eq!(config.provider.request_timeout_secs, 10);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_validate_requires_provider_url_and_secret() {
        let config = SettleConfig::default();
        assert!(config.validate().is_err());

        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = valid_config();
        config.provider.url = "ftp://rates.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = valid_config();
        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: SettleConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.provider.url, config.provider.url);
        assert_eq!(parsed.gateway.signing_secret, "whsec_test");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: SettleConfig = toml::from_str(
            r#"
            [provider]
            url = "https://rates.example.com"
            api_key = "k"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.provider.refresh_interval_secs, 3000);
        assert_eq!(parsed.server.port, 8080);
    }
}
