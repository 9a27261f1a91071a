mod config;
mod correction;
mod crm;
mod dispatcher;
mod import;
mod interpreter;
mod platform;
mod server;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::correction::CorrectionCalculator;
use crate::crm::client::CrmClient;
use crate::dispatcher::Dispatcher;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,zapcrm=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  CRM service: {}", config.crm.base_url);
    info!("  CUB source: {}", config.correction.source);
    info!("  Allowed senders: {:?}", config.webhook.allowed_senders);

    let crm = CrmClient::new(&config.crm);
    let correction = CorrectionCalculator::from_config(&config.correction);
    let dispatcher = Dispatcher::new(crm.clone());

    let state = Arc::new(AppState::new(
        dispatcher,
        correction,
        crm,
        config.webhook.allowed_senders.clone(),
    ));

    // Run the webhook service
    info!("Webhook service is starting...");
    server::run(state, &config.server.bind_addr).await?;

    Ok(())
}
