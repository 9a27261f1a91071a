use chrono::{DateTime, Utc};

/// A chat message received from the messaging gateway, reduced to the fields
/// the dispatcher needs.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Opaque author identifier (gateway contact id), never empty.
    pub sender: String,
    /// Raw message text.
    pub text: String,
    /// Lead already linked to the chat by the gateway, if any.
    pub lead_id: Option<String>,
    /// Receipt timestamp; the interpreter's injected clock.
    pub received_at: DateTime<Utc>,
}
