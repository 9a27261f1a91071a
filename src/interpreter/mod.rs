pub mod datetime;
pub mod emoji;
pub mod leadref;
pub mod render;

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

use crate::crm::{ActionKind, CrmAction, Stage};

/// What a recognized command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Note,
    StageChange(Stage),
    ScheduleTask,
    ReassignOwner,
    Status,
    Help,
}

/// One entry of the fixed command vocabulary. Operators memorize these
/// prefixes, so the set is a user-facing contract.
#[derive(Debug)]
pub struct CommandSpec {
    pub prefix: &'static str,
    pub kind: CommandKind,
    pub summary: &'static str,
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        prefix: "/nota",
        kind: CommandKind::Note,
        summary: "<texto> registra uma nota no histórico",
    },
    CommandSpec {
        prefix: "/obs",
        kind: CommandKind::Note,
        summary: "<texto> registra uma observação",
    },
    CommandSpec {
        prefix: "/lead",
        kind: CommandKind::StageChange(Stage::Lead),
        summary: "move para a etapa lead",
    },
    CommandSpec {
        prefix: "/interessado",
        kind: CommandKind::StageChange(Stage::Interessado),
        summary: "move para a etapa interessado",
    },
    CommandSpec {
        prefix: "/negociacao",
        kind: CommandKind::StageChange(Stage::Negociacao),
        summary: "move para a etapa negociação",
    },
    CommandSpec {
        prefix: "/proposta",
        kind: CommandKind::StageChange(Stage::Proposta),
        summary: "move para a etapa proposta",
    },
    CommandSpec {
        prefix: "/fechado",
        kind: CommandKind::StageChange(Stage::Fechado),
        summary: "marca o negócio como ganho",
    },
    CommandSpec {
        prefix: "/perdido",
        kind: CommandKind::StageChange(Stage::Perdido),
        summary: "marca o negócio como descartado",
    },
    CommandSpec {
        prefix: "/agendar",
        kind: CommandKind::ScheduleTask,
        summary: "<descrição> [data] cria uma tarefa",
    },
    CommandSpec {
        prefix: "/responsavel",
        kind: CommandKind::ReassignOwner,
        summary: "<nome> transfere o lead",
    },
    CommandSpec {
        prefix: "/status",
        kind: CommandKind::Status,
        summary: "consulta a situação do lead",
    },
    CommandSpec {
        prefix: "/help",
        kind: CommandKind::Help,
        summary: "mostra esta referência",
    },
];

fn re_command() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^/([A-Za-z]+)\s*(.*)$").unwrap())
}

/// Stateless chat-command interpreter over the fixed command table.
/// Each message is interpreted independently; the table is built once and
/// never mutated.
pub struct Interpreter {
    by_word: HashMap<&'static str, &'static CommandSpec>,
}

impl Interpreter {
    pub fn new() -> Self {
        let mut by_word = HashMap::new();
        for spec in COMMANDS {
            let word = spec.prefix.trim_start_matches('/');
            let replaced = by_word.insert(word, spec);
            assert!(replaced.is_none(), "duplicate command prefix: {}", spec.prefix);
        }
        Self { by_word }
    }

    /// Match the leading command word, if any, returning its spec and the
    /// rest of the message.
    pub fn lookup<'a>(&self, text: &'a str) -> Option<(&'static CommandSpec, &'a str)> {
        let caps = re_command().captures(text.trim_start())?;
        let word = caps.get(1)?.as_str().to_ascii_lowercase();
        let spec = *self.by_word.get(word.as_str())?;
        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        Some((spec, rest))
    }

    /// Interpret one inbound chat message into at most one CRM action.
    ///
    /// Returns None when the message carries no recognized command or no
    /// resolvable lead id; chat text is adversarial, so nothing here is an
    /// error. `now` is supplied by the caller so interpretation stays
    /// deterministic.
    pub fn interpret(
        &self,
        text: &str,
        sender: &str,
        explicit_lead_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<CrmAction> {
        let (spec, rest) = self.lookup(text)?;

        // An explicitly linked lead wins over references in the text.
        let lead_id = match explicit_lead_id {
            Some(id) => id.to_string(),
            None => leadref::extract(text)?,
        };

        let payload = leadref::strip(rest);

        let kind = match spec.kind {
            // Query and help commands never produce a CRM mutation.
            CommandKind::Status | CommandKind::Help => return None,
            CommandKind::Note => ActionKind::Note {
                category: emoji::classify_note(&payload),
                text: payload,
            },
            CommandKind::StageChange(stage) => ActionKind::StageChange {
                stage,
                reason: payload,
            },
            CommandKind::ScheduleTask => {
                let due = datetime::extract_due(&payload, now)
                    .unwrap_or_else(|| now + Duration::days(1));
                ActionKind::ScheduleTask {
                    description: payload,
                    due,
                }
            }
            CommandKind::ReassignOwner => ActionKind::ReassignOwner { owner: payload },
        };

        Some(CrmAction {
            lead_id,
            author_id: sender.to_string(),
            timestamp: now,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::NoteCategory;
    use chrono::TimeZone;

    fn interpreter() -> Interpreter {
        Interpreter::new()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn every_action_prefix_with_lead_reference_produces_an_action() {
        let interpreter = interpreter();
        for prefix in [
            "/nota", "/obs", "/lead", "/interessado", "/negociacao", "/proposta", "/fechado",
            "/perdido", "/agendar", "/responsavel",
        ] {
            let message = format!("{} algum texto #LEAD42", prefix);
            let action = interpreter
                .interpret(&message, "ana", None, now())
                .unwrap_or_else(|| panic!("{} should produce an action", prefix));
            assert_eq!(action.lead_id, "42");
            assert_eq!(action.author_id, "ana");
            assert_eq!(action.timestamp, now());
        }
    }

    #[test]
    fn non_command_text_is_ignored() {
        assert_eq!(interpreter().interpret("not a command", "ana", None, now()), None);
        assert_eq!(interpreter().interpret("/inexistente #LEAD1", "ana", None, now()), None);
    }

    #[test]
    fn command_without_resolvable_lead_is_ignored() {
        assert_eq!(
            interpreter().interpret("/nota sem lead id aqui", "ana", None, now()),
            None
        );
    }

    #[test]
    fn explicit_lead_id_wins_over_text_reference() {
        let action = interpreter()
            .interpret("/nota #LEAD99 texto", "ana", Some("7"), now())
            .unwrap();
        assert_eq!(action.lead_id, "7");
    }

    #[test]
    fn interpretation_is_deterministic() {
        let a = interpreter().interpret("/agendar visita amanhã às 10h #LEAD3", "ana", None, now());
        let b = interpreter().interpret("/agendar visita amanhã às 10h #LEAD3", "ana", None, now());
        assert_eq!(a, b);
        assert!(a.is_some());
    }

    #[test]
    fn financing_note_selects_the_financing_category() {
        let action = interpreter()
            .interpret("/nota cliente tem financiamento aprovado", "ana", Some("1"), now())
            .unwrap();
        match action.kind {
            ActionKind::Note { category, .. } => assert_eq!(category, NoteCategory::Financing),
            other => panic!("expected a note, got {:?}", other),
        }
    }

    #[test]
    fn lead_token_is_stripped_from_note_text() {
        let action = interpreter()
            .interpret("/nota pagou #LEAD5 a entrada", "ana", None, now())
            .unwrap();
        match action.kind {
            ActionKind::Note { text, .. } => assert_eq!(text, "pagou a entrada"),
            other => panic!("expected a note, got {:?}", other),
        }
    }

    #[test]
    fn schedule_without_date_defaults_to_one_day_ahead() {
        let action = interpreter()
            .interpret("/agendar visita", "ana", Some("1"), now())
            .unwrap();
        match action.kind {
            ActionKind::ScheduleTask { due, .. } => assert_eq!(due, now() + Duration::days(1)),
            other => panic!("expected a task, got {:?}", other),
        }
    }

    #[test]
    fn schedule_with_parseable_date_uses_it() {
        let action = interpreter()
            .interpret("/agendar visita 15/03/2026 14:30 #LEAD2", "ana", None, now())
            .unwrap();
        match action.kind {
            ActionKind::ScheduleTask { due, description } => {
                assert_eq!(due, Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap());
                assert_eq!(description, "visita 15/03/2026 14:30");
            }
            other => panic!("expected a task, got {:?}", other),
        }
    }

    #[test]
    fn stage_reason_defaults_to_empty() {
        let action = interpreter()
            .interpret("/perdido #LEAD3", "ana", None, now())
            .unwrap();
        assert_eq!(
            action.kind,
            ActionKind::StageChange {
                stage: Stage::Perdido,
                reason: String::new(),
            }
        );
    }

    #[test]
    fn stage_change_round_trips_through_the_acknowledgment() {
        let action = interpreter()
            .interpret("/fechado #LEAD5 motivo x", "ana", None, now())
            .unwrap();
        let ack = render::render_acknowledgment(&action, None);
        assert!(ack.contains("fechado"));
        assert!(ack.contains("motivo x"));
    }

    #[test]
    fn status_and_help_produce_no_action() {
        assert_eq!(interpreter().interpret("/status #LEAD4", "ana", None, now()), None);
        assert_eq!(interpreter().interpret("/help", "ana", Some("4"), now()), None);
    }

    #[test]
    fn command_word_is_case_insensitive() {
        let action = interpreter()
            .interpret("/NOTA tudo certo #LEAD8", "ana", None, now())
            .unwrap();
        assert_eq!(action.lead_id, "8");
    }

    #[test]
    fn reassign_owner_takes_the_rest_as_name() {
        let action = interpreter()
            .interpret("/responsavel Maria Silva #LEAD6", "ana", None, now())
            .unwrap();
        assert_eq!(
            action.kind,
            ActionKind::ReassignOwner {
                owner: "Maria Silva".to_string(),
            }
        );
    }
}
