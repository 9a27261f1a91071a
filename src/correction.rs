use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{CorrectionConfig, CubEntry, CubSource};

/// Source of monthly CUB/SC index values.
#[async_trait]
pub trait CubProvider: Send + Sync {
    /// The published index value for a month, or None when not published.
    async fn monthly_value(&self, year: i32, month: u32) -> Result<Option<f64>>;
}

/// Index values pinned in the config file. Works offline.
pub struct TableCubProvider {
    values: HashMap<(i32, u32), f64>,
}

impl TableCubProvider {
    pub fn new(entries: &[CubEntry]) -> Self {
        let values = entries
            .iter()
            .map(|e| ((e.year, e.month), e.value))
            .collect();
        Self { values }
    }
}

#[async_trait]
impl CubProvider for TableCubProvider {
    async fn monthly_value(&self, year: i32, month: u32) -> Result<Option<f64>> {
        Ok(self.values.get(&(year, month)).copied())
    }
}

/// Fetches index values from a CUB index API.
pub struct HttpCubProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CubValue {
    value: f64,
}

impl HttpCubProvider {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CubProvider for HttpCubProvider {
    async fn monthly_value(&self, year: i32, month: u32) -> Result<Option<f64>> {
        let url = format!("{}/{}/{}", self.base_url, year, month);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach the CUB index API")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("CUB index API error ({})", status);
        }

        let body: CubValue = response
            .json()
            .await
            .context("Failed to parse CUB index value")?;
        Ok(Some(body.value))
    }
}

/// Result of one monetary correction.
#[derive(Debug, Clone, Serialize)]
pub struct Correction {
    pub original: f64,
    pub corrected: f64,
    pub factor: f64,
}

/// Ratio-based monetary correction over the CUB/SC index, with an in-memory
/// cache so each month is fetched at most once per process.
pub struct CorrectionCalculator {
    provider: Box<dyn CubProvider>,
    cache: Mutex<HashMap<(i32, u32), f64>>,
}

impl CorrectionCalculator {
    pub fn new(provider: Box<dyn CubProvider>) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CorrectionConfig) -> Self {
        let provider: Box<dyn CubProvider> = match config.source {
            CubSource::Table => Box::new(TableCubProvider::new(&config.values)),
            CubSource::Http => Box::new(HttpCubProvider::new(&config.base_url)),
        };
        Self::new(provider)
    }

    /// Correct a contract amount from its origin index month to a target
    /// month. Errors when a month is invalid or has no published value.
    pub async fn correct(&self, amount: f64, from: (i32, u32), to: (i32, u32)) -> Result<Correction> {
        let origin = self.index_value(from.0, from.1).await?;
        let target = self.index_value(to.0, to.1).await?;
        anyhow::ensure!(
            origin > 0.0,
            "CUB value for {:02}/{} is not positive",
            from.1,
            from.0
        );

        let factor = target / origin;
        let corrected = (amount * factor * 100.0).round() / 100.0;

        Ok(Correction {
            original: amount,
            corrected,
            factor,
        })
    }

    async fn index_value(&self, year: i32, month: u32) -> Result<f64> {
        anyhow::ensure!((1..=12).contains(&month), "invalid month: {}", month);

        {
            let cache = self.cache.lock().await;
            if let Some(value) = cache.get(&(year, month)) {
                return Ok(*value);
            }
        }

        let value = self
            .provider
            .monthly_value(year, month)
            .await?
            .with_context(|| format!("no CUB value published for {:02}/{}", month, year))?;

        self.cache.lock().await.insert((year, month), value);
        debug!("Cached CUB {:02}/{} = {}", month, year, value);
        Ok(value)
    }
}
