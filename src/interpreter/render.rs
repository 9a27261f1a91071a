use crate::crm::{ActionKind, CrmAction};

use super::COMMANDS;

/// Operator-facing confirmation for an executed action.
/// Falls back to the lead id when no display name is known.
pub fn render_acknowledgment(action: &CrmAction, lead_name: Option<&str>) -> String {
    let who = match lead_name {
        Some(name) => name.to_string(),
        None => format!("o lead #{}", action.lead_id),
    };

    match &action.kind {
        ActionKind::Note { text, category } => {
            format!("{} Nota registrada para {}: {}", category.emoji(), who, text)
        }
        ActionKind::StageChange { stage, reason } => {
            if reason.is_empty() {
                format!("✅ {} movido para a etapa *{}*.", who, stage)
            } else {
                format!("✅ {} movido para a etapa *{}*. Motivo: {}", who, stage, reason)
            }
        }
        ActionKind::ScheduleTask { description, due } => {
            format!(
                "📅 Tarefa agendada para {}: {} ({})",
                who,
                description,
                due.format("%d/%m/%Y %H:%M")
            )
        }
        ActionKind::ReassignOwner { owner } => {
            format!("👤 {} agora é responsabilidade de {}.", who, owner)
        }
    }
}

/// Static command reference sent in reply to /help.
pub fn render_help() -> String {
    let mut help = String::from("Comandos disponíveis:\n\n");
    for spec in COMMANDS {
        help.push_str(&format!("{} {}\n", spec.prefix, spec.summary));
    }
    help.push_str("\nReferencie o lead com #LEAD<id>, @lead<id> ou lead:<id>.");
    help
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::{NoteCategory, Stage};
    use chrono::{TimeZone, Utc};

    fn action(kind: ActionKind) -> CrmAction {
        CrmAction {
            lead_id: "5".to_string(),
            author_id: "ana".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
            kind,
        }
    }

    #[test]
    fn stage_ack_carries_stage_and_reason() {
        let ack = render_acknowledgment(
            &action(ActionKind::StageChange {
                stage: Stage::Fechado,
                reason: "motivo x".to_string(),
            }),
            None,
        );
        assert!(ack.contains("fechado"));
        assert!(ack.contains("motivo x"));
        assert!(ack.contains("#5"));
    }

    #[test]
    fn stage_ack_without_reason_has_no_motive_line() {
        let ack = render_acknowledgment(
            &action(ActionKind::StageChange {
                stage: Stage::Perdido,
                reason: String::new(),
            }),
            Some("Carlos Souza"),
        );
        assert!(ack.contains("perdido"));
        assert!(ack.contains("Carlos Souza"));
        assert!(!ack.contains("Motivo"));
    }

    #[test]
    fn note_ack_leads_with_the_category_emoji() {
        let ack = render_acknowledgment(
            &action(ActionKind::Note {
                text: "banco aprovou".to_string(),
                category: NoteCategory::Financing,
            }),
            None,
        );
        assert!(ack.starts_with(NoteCategory::Financing.emoji()));
        assert!(ack.contains("banco aprovou"));
    }

    #[test]
    fn schedule_ack_formats_the_due_time() {
        let ack = render_acknowledgment(
            &action(ActionKind::ScheduleTask {
                description: "visita".to_string(),
                due: Utc.with_ymd_and_hms(2026, 3, 15, 14, 30, 0).unwrap(),
            }),
            None,
        );
        assert!(ack.contains("visita"));
        assert!(ack.contains("15/03/2026 14:30"));
    }

    #[test]
    fn help_lists_every_prefix_exactly_once() {
        let help = render_help();
        for spec in COMMANDS {
            assert_eq!(
                help.matches(spec.prefix).count(),
                1,
                "prefix {} should appear exactly once",
                spec.prefix
            );
        }
    }
}
