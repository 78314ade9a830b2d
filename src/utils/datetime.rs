use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Hour of day at which seeded reminders fire.
const REMINDER_HOUR: u32 = 9;

/// Parses a calendar date in either `15.07.2025` or `2025-07-15` form.
///
/// Returns `None` for anything else; callers decide whether that skips a row
/// or aborts an input step.
pub fn normalize_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, "%d.%m.%Y")
        .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%m-%d"))
        .ok()
}

/// Initial reminder for a freshly created task: seven days before the due
/// date, at 09:00. A value already in the past is left as-is and simply fires
/// in the next scheduled pass.
pub fn initial_reminder(end_date: NaiveDate) -> NaiveDateTime {
    let nine_am = NaiveTime::from_hms_opt(REMINDER_HOUR, 0, 0).unwrap_or_default();
    (end_date - Duration::days(7)).and_time(nine_am)
}

/// Parses the admin's reminder choice: `1`, `3` or `7` (days from now), or an
/// explicit `YYYY-MM-DD HH:MM` timestamp.
pub fn parse_reminder_choice(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    match input.trim() {
        "1" => Ok(now + Duration::days(1)),
        "3" => Ok(now + Duration::days(3)),
        "7" => Ok(now + Duration::days(7)),
        other => NaiveDateTime::parse_from_str(other, "%Y-%m-%d %H:%M")
            .map_err(|_| anyhow!("Use 1/3/7 or a date like 2025-07-20 14:30")),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_date_dotted() {
        assert_eq!(normalize_date("15.07.2025"), Some(date(2025, 7, 15)));
        assert_eq!(normalize_date("1.7.2025"), Some(date(2025, 7, 1)));
    }

    #[test]
    fn test_normalize_date_iso() {
        assert_eq!(normalize_date("2025-07-15"), Some(date(2025, 7, 15)));
        assert_eq!(normalize_date("  2025-07-15  "), Some(date(2025, 7, 15)));
    }

    #[test]
    fn test_normalize_date_rejects_other_formats() {
        assert_eq!(normalize_date("15/07/2025"), None);
        assert_eq!(normalize_date("July 15, 2025"), None);
        assert_eq!(normalize_date("2025-13-01"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn test_normalized_forms_agree() {
        assert_eq!(
            format_date(normalize_date("15.07.2025").unwrap()),
            "2025-07-15"
        );
        assert_eq!(
            format_date(normalize_date("2025-07-15").unwrap()),
            "2025-07-15"
        );
    }

    #[test]
    fn test_initial_reminder_week_before_at_nine() {
        let reminder = initial_reminder(date(2025, 7, 15));
        assert_eq!(format_datetime(reminder), "2025-07-08 09:00:00");
    }

    #[test]
    fn test_parse_reminder_choice_presets() {
        let now = date(2025, 7, 1).and_hms_opt(12, 30, 0).unwrap();
        assert_eq!(
            parse_reminder_choice("1", now).unwrap(),
            date(2025, 7, 2).and_hms_opt(12, 30, 0).unwrap()
        );
        assert_eq!(
            parse_reminder_choice("7", now).unwrap(),
            date(2025, 7, 8).and_hms_opt(12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_reminder_choice_explicit() {
        let now = date(2025, 7, 1).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(
            parse_reminder_choice("2025-07-20 14:30", now).unwrap(),
            date(2025, 7, 20).and_hms_opt(14, 30, 0).unwrap()
        );
        assert!(parse_reminder_choice("tomorrow", now).is_err());
        assert!(parse_reminder_choice("2", now).is_err());
    }
}
