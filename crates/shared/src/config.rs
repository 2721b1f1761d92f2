//! Configuration management for the osu! API workspace.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Rate limiting settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// OAuth application credentials
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// URL scheme (https in production, http for local mocks)
    pub scheme: String,

    /// Default host requests are sent to
    pub host: String,

    /// Port requests are sent to
    pub port: u16,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Transport timeout in seconds
    pub timeout_secs: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum admissions per interval
    pub limit: usize,

    /// Interval length in milliseconds
    pub interval_ms: u64,
}

/// OAuth application credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// OAuth application ID
    pub client_id: String,

    /// OAuth application secret
    pub client_secret: String,

    /// Redirect URI registered for the authorization code grant
    #[serde(default)]
    pub redirect_uri: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            host: "osu.ppy.sh".to_string(),
            port: 443,
            user_agent: None,
            timeout_secs: 30,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 50,
            interval_ms: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            rate_limit: RateLimitConfig::default(),
            credentials: CredentialsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Reject settings that would stall every request
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.limit == 0 {
            bail!("rate_limit.limit must be greater than zero");
        }
        if self.rate_limit.interval_ms == 0 {
            bail!("rate_limit.interval_ms must be greater than zero");
        }
        if self.api.host.is_empty() {
            bail!("api.host must not be empty");
        }
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.host, "osu.ppy.sh");
        assert_eq!(config.api.port, 443);
        assert_eq!(config.rate_limit.limit, 50);
        assert_eq!(config.rate_limit.interval_ms, 10_000);
        assert!(config.credentials.client_id.is_empty());
    }

    #[test]
    fn test_save_and_load_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.credentials.client_id = "1234".to_string();
        original_config.save(&config_path)?;

        assert!(config_path.exists());

        let loaded_config = Config::from_file(&config_path)?;
        assert_eq!(loaded_config.api.host, original_config.api.host);
        assert_eq!(loaded_config.credentials.client_id, "1234");

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.api.scheme, "https");
    }

    #[test]
    fn test_missing_credentials_section_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[api]
scheme = "http"
host = "localhost"
port = 8080
timeout_secs = 5

[rate_limit]
limit = 10
interval_ms = 1000

[logging]
log_dir = "logs"
default_level = "debug"
console = true
file = false
json_format = false
"#,
        )?;

        let config = Config::from_file(&config_path)?;
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.user_agent, None);
        assert!(config.credentials.client_secret.is_empty());
        Ok(())
    }

    #[test]
    fn test_credentials_only_config_uses_section_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[credentials]
client_id = "1234"
client_secret = "hunter2"
"#,
        )?;

        let config = Config::from_file(&config_path)?;
        assert_eq!(config.credentials.client_id, "1234");
        assert_eq!(config.api.host, "osu.ppy.sh");
        assert_eq!(config.rate_limit.limit, 50);
        assert_eq!(config.logging.default_level, LoggingConfig::default().default_level);
        Ok(())
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.rate_limit.interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rate_limit.limit = 0;
        assert!(config.validate().is_err());
    }
}
