use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Token;
use crate::error::WoodlensError;

/// Configuration file structure for woodlens.
///
/// Holds the Woodpecker connection settings and cache tuning so they don't
/// have to be passed on every invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Woodpecker server connection
    #[serde(default)]
    pub server: ServerConfig,

    /// Report cache tuning
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Woodpecker server base URL, with or without the trailing `/api`
    pub url: Option<String>,

    /// Woodpecker personal access token
    pub token: Option<String>,

    /// Upper bound for a single API request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    /// How long a rendered report for a finished pipeline stays valid
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    2 * 60 * 60
}

/// Resolved connection settings handed to the HTTP client.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub server_url: String,
    pub auth_token: Option<Token>,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./woodlens.toml, ./woodlens.json, ./woodlens.yaml, ./woodlens.yml
    /// 3. `<config dir>/woodlens/woodlens.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "woodlens.toml",
            "woodlens.json",
            "woodlens.yaml",
            "woodlens.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            return Self::load_from_path(&path);
        }

        Ok(Self::default())
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("woodlens").join("woodlens.toml"))
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Merge command line overrides into the file values.
    pub fn server_settings(
        &self,
        server_url: Option<&str>,
        token: Option<&str>,
    ) -> crate::error::Result<ServerSettings> {
        let server_url = server_url
            .map(ToString::to_string)
            .or_else(|| self.server.url.clone())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                WoodlensError::Config(
                    "No Woodpecker server configured (use --server or WOODPECKER_SERVER)".into(),
                )
            })?;

        let auth_token = token
            .map(Token::from)
            .or_else(|| self.server.token.as_deref().map(Token::from));

        Ok(ServerSettings {
            server_url,
            auth_token,
            request_timeout: Duration::from_secs(self.server.request_timeout_secs),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
