// File: src/config.rs
// Purpose: Configuration parsing from reqbind.toml

use crate::catalog::{CatalogError, Catalogs, DEFAULT_LOCALE};
use crate::request_context::SourceBuckets;
use crate::validation::ValidationSession;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub cors: CorsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// Defaults applied to every validation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Catalog locale (default: "en")
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Report every error instead of the first one (default: false)
    #[serde(default = "default_false")]
    pub bundle_errors: bool,
}

/// Cross-origin settings for the HTTP layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_true")]
    pub allow_credentials: bool,
}

// Default values
fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:8000".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            bundle_errors: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allow_credentials: true,
        }
    }
}

impl ValidationConfig {
    /// Start a session for one request using these defaults
    pub fn session(
        &self,
        catalogs: &Catalogs,
        buckets: SourceBuckets,
    ) -> Result<ValidationSession, CatalogError> {
        Ok(ValidationSession::for_locale(catalogs, &self.locale, buckets)?
            .bundle_errors(self.bundle_errors))
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./reqbind.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("reqbind.toml")
    }
}
