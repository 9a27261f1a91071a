use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::correction::{Correction, CorrectionCalculator};
use crate::crm::client::CrmClient;
use crate::dispatcher::Dispatcher;
use crate::import::{self, ColumnMap};
use crate::platform::IncomingMessage;

const SEEN_CAPACITY: usize = 1024;

/// Bounded set of recently seen gateway message ids. Gateways redeliver on
/// timeout, and a redelivered command must not mutate the CRM twice.
struct SeenMessages {
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl SeenMessages {
    fn new() -> Self {
        Self {
            order: VecDeque::new(),
            ids: HashSet::new(),
        }
    }

    /// Record an id; returns false when it was already present.
    fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        if self.order.len() == SEEN_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.ids.insert(id.to_string());
        true
    }
}

/// Shared application state
pub struct AppState {
    dispatcher: Dispatcher,
    correction: CorrectionCalculator,
    crm: CrmClient,
    allowed_senders: Vec<String>,
    seen: Mutex<SeenMessages>,
}

impl AppState {
    pub fn new(
        dispatcher: Dispatcher,
        correction: CorrectionCalculator,
        crm: CrmClient,
        allowed_senders: Vec<String>,
    ) -> Self {
        Self {
            dispatcher,
            correction,
            crm,
            allowed_senders,
            seen: Mutex::new(SeenMessages::new()),
        }
    }
}

/// Inbound chat event posted by the messaging gateway.
#[derive(Debug, Deserialize)]
pub struct InboundEvent {
    #[serde(default)]
    pub message_id: Option<String>,
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct WebhookReply {
    reply: Option<String>,
}

/// Run the HTTP server until it fails or the process is stopped.
pub async fn run(state: Arc<AppState>, bind_addr: &str) -> Result<()> {
    let app = Router::new()
        .route("/health", get(health))
        .route("/webhook", post(handle_webhook))
        .route("/correction", post(handle_correction))
        .route("/import/mapping", post(handle_import_mapping))
        .route("/import", post(handle_import))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    Json(event): Json<InboundEvent>,
) -> Json<WebhookReply> {
    if let Some(id) = &event.message_id {
        if !state.seen.lock().await.insert(id) {
            info!("Dropping replayed webhook delivery {}", id);
            return Json(WebhookReply { reply: None });
        }
    }

    if !state.allowed_senders.is_empty() && !state.allowed_senders.contains(&event.sender) {
        warn!("Ignoring message from unlisted sender {}", event.sender);
        return Json(WebhookReply { reply: None });
    }

    // The only clock read on the message path; everything downstream gets
    // this timestamp injected.
    let received_at = event.timestamp.unwrap_or_else(Utc::now);

    let incoming = IncomingMessage {
        sender: event.sender,
        text: event.text,
        lead_id: event.lead_id,
        received_at,
    };

    match state.dispatcher.process_message(&incoming).await {
        Ok(reply) => Json(WebhookReply { reply }),
        Err(e) => {
            // A webhook must never bounce; failures degrade to silence.
            error!("Error processing message: {:#}", e);
            Json(WebhookReply { reply: None })
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CorrectionRequest {
    pub amount: f64,
    pub from_year: i32,
    pub from_month: u32,
    pub to_year: i32,
    pub to_month: u32,
}

async fn handle_correction(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CorrectionRequest>,
) -> Result<Json<Correction>, (StatusCode, String)> {
    state
        .correction
        .correct(
            request.amount,
            (request.from_year, request.from_month),
            (request.to_year, request.to_month),
        )
        .await
        .map(Json)
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, format!("{:#}", e)))
}

#[derive(Debug, Deserialize)]
pub struct ImportMappingRequest {
    pub headers: Vec<String>,
}

async fn handle_import_mapping(Json(request): Json<ImportMappingRequest>) -> Json<ColumnMap> {
    Json(import::map_columns(&request.headers))
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unmapped_columns: Vec<String>,
}

async fn handle_import(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> Json<ImportReport> {
    let map = import::map_columns(&request.headers);
    let leads = import::rows_to_leads(&map, &request.rows);
    let skipped = request.rows.len() - leads.len();

    let mut imported = 0;
    let mut failed = 0;
    for lead in &leads {
        match state.crm.create_lead(lead).await {
            Ok(()) => imported += 1,
            Err(e) => {
                error!("Failed to create imported lead: {:#}", e);
                failed += 1;
            }
        }
    }

    info!(
        "Imported {} leads ({} skipped, {} failed)",
        imported, skipped, failed
    );

    Json(ImportReport {
        imported,
        skipped,
        failed,
        unmapped_columns: map.unmapped,
    })
}
