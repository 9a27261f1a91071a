pub mod client;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::fold;

/// Pipeline stages — the closed set of kanban columns the CRM tracks.
/// Stage-change commands always target one of these; free-form stage names
/// do not exist on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lead,
    Interessado,
    Negociacao,
    Proposta,
    Fechado,
    Perdido,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Lead => "lead",
            Stage::Interessado => "interessado",
            Stage::Negociacao => "negociacao",
            Stage::Proposta => "proposta",
            Stage::Fechado => "fechado",
            Stage::Perdido => "perdido",
        }
    }

    /// Lenient parse for imported spreadsheet cells ("Negociação" works).
    pub fn parse(text: &str) -> Option<Stage> {
        match fold(text).trim() {
            "lead" | "novo" => Some(Stage::Lead),
            "interessado" => Some(Stage::Interessado),
            "negociacao" | "em negociacao" => Some(Stage::Negociacao),
            "proposta" => Some(Stage::Proposta),
            "fechado" | "ganho" => Some(Stage::Fechado),
            "perdido" => Some(Stage::Perdido),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Note categories, each with a fixed emoji used in acknowledgments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
    Money,
    Financing,
    Urgency,
    Communication,
    Sentiment,
    Property,
    General,
}

impl NoteCategory {
    pub fn emoji(&self) -> &'static str {
        match self {
            NoteCategory::Money => "💰",
            NoteCategory::Financing => "🏦",
            NoteCategory::Urgency => "⚡",
            NoteCategory::Communication => "📞",
            NoteCategory::Sentiment => "😊",
            NoteCategory::Property => "🏠",
            NoteCategory::General => "📝",
        }
    }
}

/// A typed CRM mutation produced from one chat command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmAction {
    pub lead_id: String,
    pub author_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionKind {
    Note {
        text: String,
        category: NoteCategory,
    },
    StageChange {
        stage: Stage,
        reason: String,
    },
    ScheduleTask {
        description: String,
        due: DateTime<Utc>,
    },
    ReassignOwner {
        owner: String,
    },
}

/// Read model returned by the CRM service for /status queries.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadSummary {
    pub id: String,
    pub name: String,
    pub stage: Stage,
    #[serde(default)]
    pub owner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stage_parse_is_accent_and_case_insensitive() {
        assert_eq!(Stage::parse("Negociação"), Some(Stage::Negociacao));
        assert_eq!(Stage::parse("FECHADO"), Some(Stage::Fechado));
        assert_eq!(Stage::parse("novo"), Some(Stage::Lead));
        assert_eq!(Stage::parse("qualificado"), None);
    }

    #[test]
    fn action_serializes_with_action_tag() {
        let action = CrmAction {
            lead_id: "5".to_string(),
            author_id: "ana".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
            kind: ActionKind::StageChange {
                stage: Stage::Fechado,
                reason: "motivo x".to_string(),
            },
        };

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "stage_change");
        assert_eq!(json["stage"], "fechado");
        assert_eq!(json["reason"], "motivo x");
        assert_eq!(json["lead_id"], "5");
    }
}
