use std::sync::OnceLock;

use regex::Regex;

// Compile-once lead reference patterns via OnceLock.
fn re_hash() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)#lead(\d+)").unwrap())
}

fn re_at() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)@lead(\d+)").unwrap())
}

fn re_colon() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\blead:(\d+)").unwrap())
}

/// Extract a lead id referenced in free text.
/// `#LEAD<digits>` wins over `@lead<digits>`, which wins over `lead:<digits>`.
pub fn extract(text: &str) -> Option<String> {
    for re in [re_hash(), re_at(), re_colon()] {
        if let Some(caps) = re.captures(text) {
            return Some(caps[1].to_string());
        }
    }
    None
}

/// Remove lead reference tokens and collapse the remaining whitespace.
/// The token addresses the action; it is not note or reason content.
pub fn strip(text: &str) -> String {
    let mut cleaned = text.to_string();
    for re in [re_hash(), re_at(), re_colon()] {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_each_reference_syntax() {
        assert_eq!(extract("cliente #LEAD42 ligou"), Some("42".to_string()));
        assert_eq!(extract("cliente @lead7 ligou"), Some("7".to_string()));
        assert_eq!(extract("ver lead:33 depois"), Some("33".to_string()));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(extract("#lead9"), Some("9".to_string()));
        assert_eq!(extract("@LEAD12"), Some("12".to_string()));
        assert_eq!(extract("LEAD:3"), Some("3".to_string()));
    }

    #[test]
    fn hash_syntax_wins_over_the_others() {
        assert_eq!(
            extract("texto @lead2 e lead:3 e #LEAD1"),
            Some("1".to_string())
        );
        assert_eq!(extract("texto lead:3 e @lead2"), Some("2".to_string()));
    }

    #[test]
    fn no_reference_yields_none() {
        assert_eq!(extract("mensagem sem referencia nenhuma"), None);
    }

    #[test]
    fn strip_removes_tokens_and_collapses_whitespace() {
        assert_eq!(strip("pagou #LEAD5 a entrada"), "pagou a entrada");
        assert_eq!(strip("@lead9 retornar amanhã"), "retornar amanhã");
        assert_eq!(strip("sem token"), "sem token");
    }
}
