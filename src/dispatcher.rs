use anyhow::Result;
use tracing::{debug, info};

use crate::crm::client::CrmClient;
use crate::interpreter::{leadref, render, CommandKind, Interpreter};
use crate::platform::IncomingMessage;

/// Routes inbound messages: query commands are answered directly, action
/// commands go through the interpreter and on to the CRM service.
pub struct Dispatcher {
    interpreter: Interpreter,
    crm: CrmClient,
}

impl Dispatcher {
    pub fn new(crm: CrmClient) -> Self {
        Self {
            interpreter: Interpreter::new(),
            crm,
        }
    }

    /// Process one inbound message. Returns the reply to send back over the
    /// chat channel, or None when the message warrants no response.
    pub async fn process_message(&self, incoming: &IncomingMessage) -> Result<Option<String>> {
        match self.interpreter.lookup(&incoming.text) {
            Some((spec, _)) if spec.kind == CommandKind::Help => {
                return Ok(Some(render::render_help()));
            }
            Some((spec, _)) if spec.kind == CommandKind::Status => {
                return self.lead_status(incoming).await;
            }
            _ => {}
        }

        let action = match self.interpreter.interpret(
            &incoming.text,
            &incoming.sender,
            incoming.lead_id.as_deref(),
            incoming.received_at,
        ) {
            Some(action) => action,
            None => {
                // Unrecognized chat text is dropped on purpose; the channel
                // is not a strict command console.
                debug!("No command recognized in message from {}", incoming.sender);
                return Ok(None);
            }
        };

        self.crm.submit_action(&action).await?;
        info!(
            "Submitted action for lead {} by {}",
            action.lead_id, action.author_id
        );

        // Name lookup is cosmetic; the ack falls back to the lead id.
        let lead_name = self
            .crm
            .fetch_lead(&action.lead_id)
            .await
            .ok()
            .flatten()
            .map(|lead| lead.name);

        Ok(Some(render::render_acknowledgment(
            &action,
            lead_name.as_deref(),
        )))
    }

    async fn lead_status(&self, incoming: &IncomingMessage) -> Result<Option<String>> {
        let lead_id = match incoming
            .lead_id
            .clone()
            .or_else(|| leadref::extract(&incoming.text))
        {
            Some(id) => id,
            None => return Ok(None),
        };

        let reply = match self.crm.fetch_lead(&lead_id).await? {
            Some(lead) => {
                let owner = lead.owner.as_deref().unwrap_or("sem responsável");
                format!("📋 {} está na etapa *{}* ({})", lead.name, lead.stage, owner)
            }
            None => format!("Lead {} não encontrado.", lead_id),
        };

        Ok(Some(reply))
    }
}
