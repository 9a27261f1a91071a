use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use regex::Regex;

use crate::util::fold;

// Patterns run against folded text (lowercase, accents stripped), so
// "Sábado às 10:00" arrives here as "sabado as 10:00".
fn re_date_time() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?\s+(\d{1,2}):(\d{2})\b").unwrap()
    })
}

fn re_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{2,4}))?\b").unwrap())
}

fn re_weekday() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(segunda|terca|quarta|quinta|sexta|sabado|domingo)(?:-feira)?\s+(?:as\s+)?(\d{1,2}):(\d{2})\b",
        )
        .unwrap()
    })
}

fn re_relative() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(hoje|amanha)\s+(?:as\s+)?(\d{1,2})(?::(\d{2}))?\s*h?\b").unwrap()
    })
}

/// Best-effort extraction of a due date/time from task text.
///
/// Tried in order: `DD/MM[/YY[YY]] HH:MM`, `DD/MM[/YY[YY]]` (start of day),
/// weekday name + `HH:MM`, `hoje`/`amanhã` + hour. Calendar-invalid matches
/// fall through to the next pattern. Returns None when nothing parseable is
/// present; the caller applies the schedule default.
pub fn extract_due(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let folded = fold(text);
    explicit_date_time(&folded, now)
        .or_else(|| explicit_date(&folded, now))
        .or_else(|| weekday_time(&folded, now))
        .or_else(|| relative_day(&folded, now))
}

fn explicit_date_time(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = re_date_time().captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = parse_year(caps.get(3), now);
    let hour = caps[4].parse().ok()?;
    let minute = caps[5].parse().ok()?;
    at(year, month, day, hour, minute)
}

fn explicit_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = re_date().captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = parse_year(caps.get(3), now);
    at(year, month, day, 0, 0)
}

fn weekday_time(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = re_weekday().captures(text)?;
    let target: i64 = match &caps[1] {
        "segunda" => 0,
        "terca" => 1,
        "quarta" => 2,
        "quinta" => 3,
        "sexta" => 4,
        "sabado" => 5,
        "domingo" => 6,
        _ => return None,
    };
    let hour = caps[2].parse().ok()?;
    let minute = caps[3].parse().ok()?;

    // Next strictly-future occurrence; the same weekday means a week ahead.
    let today = i64::from(now.weekday().num_days_from_monday());
    let mut ahead = (target - today).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }

    let date = now.date_naive() + Duration::days(ahead);
    date.and_hms_opt(hour, minute, 0).map(|dt| dt.and_utc())
}

fn relative_day(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = re_relative().captures(text)?;
    let date = match &caps[1] {
        "hoje" => now.date_naive(),
        "amanha" => now.date_naive() + Duration::days(1),
        _ => return None,
    };
    let hour = caps[2].parse().ok()?;
    let minute = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    date.and_hms_opt(hour, minute, 0).map(|dt| dt.and_utc())
}

fn parse_year(m: Option<regex::Match>, now: DateTime<Utc>) -> i32 {
    match m {
        Some(m) => {
            let year: i32 = m.as_str().parse().unwrap_or(now.year());
            if m.as_str().len() == 2 {
                2000 + year
            } else {
                year
            }
        }
        None => now.year(),
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, 0)
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // Tuesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn expect(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn full_date_and_time() {
        assert_eq!(
            extract_due("visita 15/03/2026 14:30", now()),
            Some(expect(2026, 3, 15, 14, 30))
        );
    }

    #[test]
    fn two_digit_year_is_2000_based() {
        assert_eq!(
            extract_due("reuniao 05/04/27 09:00", now()),
            Some(expect(2027, 4, 5, 9, 0))
        );
    }

    #[test]
    fn date_without_time_is_start_of_day() {
        assert_eq!(
            extract_due("visita 15/03", now()),
            Some(expect(2026, 3, 15, 0, 0))
        );
    }

    #[test]
    fn weekday_resolves_to_next_occurrence() {
        // From Tuesday 2026-03-10, sexta is 2026-03-13.
        assert_eq!(
            extract_due("ligar sexta 15:00", now()),
            Some(expect(2026, 3, 13, 15, 0))
        );
    }

    #[test]
    fn same_weekday_means_a_week_ahead() {
        assert_eq!(
            extract_due("terça 09:00", now()),
            Some(expect(2026, 3, 17, 9, 0))
        );
    }

    #[test]
    fn accented_weekday_matches() {
        assert_eq!(
            extract_due("visita Sábado às 10:00", now()),
            Some(expect(2026, 3, 14, 10, 0))
        );
    }

    #[test]
    fn tomorrow_with_hour() {
        assert_eq!(
            extract_due("ligar amanhã às 14h", now()),
            Some(expect(2026, 3, 11, 14, 0))
        );
    }

    #[test]
    fn today_with_hour_and_minutes() {
        assert_eq!(
            extract_due("retornar hoje 18:45", now()),
            Some(expect(2026, 3, 10, 18, 45))
        );
    }

    #[test]
    fn nothing_parseable_yields_none() {
        assert_eq!(extract_due("visita ao apartamento", now()), None);
        assert_eq!(extract_due("amanhã sem hora", now()), None);
    }

    #[test]
    fn invalid_calendar_values_fall_through() {
        assert_eq!(extract_due("ver 99/99 10:00", now()), None);
        assert_eq!(extract_due("ver 31/02", now()), None);
    }
}
