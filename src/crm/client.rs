use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::{CrmAction, LeadSummary};
use crate::config::CrmConfig;
use crate::import::ImportedLead;

/// Envelope posted to the CRM service. The fresh id lets the CRM side drop
/// replayed deliveries without trusting gateway retry semantics.
#[derive(Debug, Serialize)]
struct ActionEnvelope<'a> {
    id: Uuid,
    action: &'a CrmAction,
}

/// HTTP client for the external CRM service that owns lead persistence.
#[derive(Clone)]
pub struct CrmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CrmClient {
    pub fn new(config: &CrmConfig) -> Self {
        // 30s total / 5s connect: a hung CRM call must not wedge the webhook
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// Forward an interpreted action to the CRM service.
    pub async fn submit_action(&self, action: &CrmAction) -> Result<()> {
        let url = format!("{}/actions", self.base_url);
        let envelope = ActionEnvelope {
            id: Uuid::new_v4(),
            action,
        };

        debug!("Submitting action {} for lead {}", envelope.id, action.lead_id);

        let response = self
            .authorized(self.client.post(&url))
            .json(&envelope)
            .send()
            .await
            .context("Failed to reach the CRM service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("CRM service rejected the action ({}): {}", status, body);
        }

        Ok(())
    }

    /// Fetch a lead summary; None when the CRM does not know the id.
    pub async fn fetch_lead(&self, lead_id: &str) -> Result<Option<LeadSummary>> {
        let url = format!("{}/leads/{}", self.base_url, lead_id);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .context("Failed to reach the CRM service")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("CRM lead lookup failed ({}): {}", status, body);
        }

        let lead = response
            .json()
            .await
            .context("Failed to parse lead summary")?;
        Ok(Some(lead))
    }

    /// Create a lead assembled by the import flow.
    pub async fn create_lead(&self, lead: &ImportedLead) -> Result<()> {
        let url = format!("{}/leads", self.base_url);

        let response = self
            .authorized(self.client.post(&url))
            .json(lead)
            .send()
            .await
            .context("Failed to reach the CRM service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("CRM service rejected the lead ({}): {}", status, body);
        }

        Ok(())
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            builder
        } else {
            builder.header("Authorization", format!("Bearer {}", self.api_key))
        }
    }
}
