use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Where monthly CUB/SC index values come from.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CubSource {
    #[default]
    Table,
    Http,
}

impl std::fmt::Display for CubSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CubSource::Table => write!(f, "table"),
            CubSource::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    pub crm: CrmConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default = "default_correction_config")]
    pub correction: CorrectionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CrmConfig {
    /// Base URL of the CRM service that owns leads, e.g. "http://crm:3000/api".
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookConfig {
    /// Sender ids allowed to issue commands. Empty allows everyone.
    #[serde(default)]
    pub allowed_senders: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorrectionConfig {
    #[serde(default)]
    pub source: CubSource,
    /// CUB index API base URL; required when source = "http".
    #[serde(default)]
    pub base_url: String,
    /// Pinned index values; used when source = "table".
    #[serde(default)]
    pub values: Vec<CubEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CubEntry {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind_addr: default_bind_addr(),
    }
}

fn default_correction_config() -> CorrectionConfig {
    CorrectionConfig {
        source: CubSource::default(),
        base_url: String::new(),
        values: Vec::new(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if config.correction.source == CubSource::Http && config.correction.base_url.is_empty() {
            anyhow::bail!("correction.base_url is required when correction.source = \"http\"");
        }

        Ok(config)
    }
}
