//! Server configuration.
//!
//! Loaded from a TOML file; every field has a default so the binary runs
//! with no file at all. The path comes from `--config`, then the
//! `FEDBRIEF_CONFIG` environment variable, then `fedbrief.toml` in the
//! working directory.
//!
//! ## Example Configuration
//!
//! ```toml
//! bind_addr = "127.0.0.1:8000"
//! database_path = "federal_register.db"
//!
//! [backend]
//! model = "llama3.1:8b"
//! base_url = "http://localhost:11434/v1"
//! request_timeout_seconds = 120
//! temperature = 0.2
//!
//! [ingestion]
//! window_days = 60
//! document_type = "PRESDOCU"
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use fedbrief_common::client::Config;

use crate::error::{Result, ServerError};

/// Server configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Path to the SQLite document cache.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Chat backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Federal Register ingestion settings.
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

/// Chat backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Optional bearer token. Local backends need none.
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Per-request timeout. The turn makes exactly one backend call and
    /// never retries, so this bounds the whole wait.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Optional sampling temperature.
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// Federal Register ingestion settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Trailing window of publication dates to fetch, in days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Federal Register API document type filter.
    #[serde(default = "default_document_type")]
    pub document_type: String,

    /// Documents endpoint of the Federal Register API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_path: default_database_path(),
            backend: BackendConfig::default(),
            ingestion: IngestionConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            request_timeout_seconds: default_request_timeout(),
            temperature: None,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            document_type: default_document_type(),
            api_base_url: default_api_base_url(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("federal_register.db")
}

fn default_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

const fn default_request_timeout() -> u64 {
    120
}

const fn default_window_days() -> u32 {
    60
}

fn default_document_type() -> String {
    "PRESDOCU".to_string()
}

fn default_api_base_url() -> String {
    "https://www.federalregister.gov/api/v1/documents.json".to_string()
}

impl ServerConfig {
    /// Loads configuration, falling back to defaults when no file exists.
    ///
    /// Path resolution: `explicit` argument, then the `FEDBRIEF_CONFIG`
    /// environment variable, then `fedbrief.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed, or
    /// if the loaded values fail validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.map_or_else(
            || {
                std::env::var_os("FEDBRIEF_CONFIG")
                    .map_or_else(|| PathBuf::from("fedbrief.toml"), PathBuf::from)
            },
            Path::to_path_buf,
        );

        let config = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                ServerError::Config(format!("Failed to read config file {}: {e}", path.display()))
            })?;
            toml::from_str(&contents)?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address does not parse, the ingestion
    /// window is zero, or the backend settings are invalid.
    pub fn validate(&self) -> Result<()> {
        self.bind_address()?;
        if self.ingestion.window_days == 0 {
            return Err(ServerError::Config(
                "ingestion.window_days must be at least 1".to_string(),
            ));
        }
        self.backend_config()
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        Ok(())
    }

    /// The parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if `bind_addr` is not a valid socket address.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|e| ServerError::Config(format!("Invalid bind_addr '{}': {e}", self.bind_addr)))
    }

    /// Builds the backend client configuration.
    #[must_use]
    pub fn backend_config(&self) -> Config {
        let mut config = Config::new(&self.backend.model)
            .with_base_url(&self.backend.base_url)
            .with_timeout(self.backend.request_timeout_seconds);
        if let Some(key) = &self.backend.api_key {
            config = config.with_api_key(key.expose_secret());
        }
        if let Some(temperature) = self.backend.temperature {
            config = config.with_temperature(temperature);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(config.database_path, PathBuf::from("federal_register.db"));
        assert_eq!(config.backend.request_timeout_seconds, 120);
        assert_eq!(config.ingestion.window_days, 60);
        assert_eq!(config.ingestion.document_type, "PRESDOCU");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
bind_addr = "0.0.0.0:9000"

[backend]
model = "qwen2:7b-instruct"
temperature = 0.2

[ingestion]
window_days = 14
        "#;

        let config: ServerConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.backend.model, "qwen2:7b-instruct");
        assert_eq!(config.backend.base_url, "http://localhost:11434/v1");
        assert_eq!(config.ingestion.window_days, 14);
    }

    #[test]
    fn test_invalid_bind_addr_rejected() {
        let toml = r#"bind_addr = "not-an-address""#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_window_rejected() {
        let toml = r#"
[ingestion]
window_days = 0
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_config_carries_key_and_temperature() {
        let toml = r#"
[backend]
model = "gpt-4o-mini"
base_url = "https://api.openai.com/v1"
api_key = "sk-test"
temperature = 0.7
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        let backend = config.backend_config();

        assert_eq!(backend.model, "gpt-4o-mini");
        assert_eq!(backend.base_url, "https://api.openai.com/v1");
        assert!(backend.api_key.is_some());
        assert_eq!(backend.temperature, Some(0.7));
        assert_eq!(backend.timeout_seconds, Some(120));
    }

    #[test]
    fn test_out_of_range_temperature_rejected() {
        let toml = r#"
[backend]
temperature = 3.5
        "#;
        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }
}
