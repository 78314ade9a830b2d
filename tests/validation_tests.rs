#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use practice_tracker_bot::utils::datetime::{format_date, initial_reminder, normalize_date};
use practice_tracker_bot::utils::validation::{parse_choice_index, validate_full_name};

#[test]
fn test_both_accepted_date_formats_normalize_identically() {
    let dotted = normalize_date("15.07.2025").unwrap();
    let iso = normalize_date("2025-07-15").unwrap();

    assert_eq!(dotted, iso);
    assert_eq!(format_date(dotted), "2025-07-15");
}

#[test]
fn test_slash_dates_are_rejected() {
    assert_eq!(normalize_date("15/07/2025"), None);
    assert_eq!(normalize_date("2025/07/15"), None);
}

#[test]
fn test_initial_reminder_is_seven_days_before_at_nine() {
    let due = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
    let reminder = initial_reminder(due);

    assert_eq!(
        reminder,
        NaiveDate::from_ymd_opt(2025, 7, 8).unwrap().and_hms_opt(9, 0, 0).unwrap()
    );
}

#[test]
fn test_full_name_needs_at_least_two_words() {
    assert!(validate_full_name("Jane Doe").is_ok());
    assert!(validate_full_name("Jane").is_err());
    assert!(validate_full_name("").is_err());
}

#[test]
fn test_choice_index_bounds() {
    assert_eq!(parse_choice_index("2", 5).unwrap(), 1);
    assert!(parse_choice_index("6", 5).is_err());
    assert!(parse_choice_index("-1", 5).is_err());
    assert!(parse_choice_index("first", 5).is_err());
}
