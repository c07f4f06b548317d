// src/utils/date.rs

//! Flexible date parsing for CRM payloads.
//!
//! Imoview responses mix Brazilian (`10/05/2024 14:30`) and ISO
//! (`2024-05-10`) conventions, with and without a time component. Parsing
//! picks the candidate format list from the value itself and never fails
//! hard: anything unrecognized becomes `None`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Formats tried for values that carry a time component.
const DATETIME_FORMATS: [&str; 4] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Formats tried for date-only values.
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Parse a date string of unknown format into a [`NaiveDateTime`].
///
/// Values longer than a bare date that contain a time separator are tried
/// against the datetime formats; everything else is tried as a date only
/// and normalized to midnight.
///
/// # Examples
/// ```
/// use chrono::{NaiveDate, Timelike};
/// use dealsync::utils::date::parse_flexible;
///
/// let parsed = parse_flexible("10/05/2024 14:30").unwrap();
/// assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
/// assert_eq!(parsed.hour(), 14);
///
/// let midnight = parse_flexible("2024-05-10").unwrap();
/// assert_eq!(midnight.hour(), 0);
///
/// assert!(parse_flexible("next tuesday").is_none());
/// ```
pub fn parse_flexible(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.len() > 10 && (value.contains(':') || value.contains(' ')) {
        parse_with_time(value)
    } else {
        parse_date_only(value)
    }
}

fn parse_with_time(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn parse_date_only(value: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(|date| date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn test_parse_brazilian_datetime_with_seconds() {
        let parsed = parse_flexible("10/05/2024 14:30:45").unwrap();
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2024, 5, 10)
                .unwrap()
                .and_hms_opt(14, 30, 45)
                .unwrap()
        );
    }

    #[test]
    fn test_parse_brazilian_datetime_without_seconds() {
        let parsed = parse_flexible("10/05/2024 14:30").unwrap();
        assert_eq!(parsed.second(), 0);
        assert_eq!(parsed.hour(), 14);
    }

    #[test]
    fn test_parse_iso_datetime() {
        let parsed = parse_flexible("2024-05-10 14:30:45").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());

        let no_seconds = parse_flexible("2024-05-10 14:30").unwrap();
        assert_eq!(no_seconds.hour(), 14);
        assert_eq!(no_seconds.second(), 0);
    }

    #[test]
    fn test_parse_date_only_normalizes_to_midnight() {
        let brazilian = parse_flexible("10/05/2024").unwrap();
        let iso = parse_flexible("2024-05-10").unwrap();
        assert_eq!(brazilian, iso);
        assert_eq!(brazilian.hour(), 0);
        assert_eq!(brazilian.minute(), 0);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(parse_flexible("  10/05/2024  ").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_flexible(""), None);
        assert_eq!(parse_flexible("   "), None);
        assert_eq!(parse_flexible("not a date"), None);
        assert_eq!(parse_flexible("32/13/2024"), None);
    }

    #[test]
    fn test_american_format_misreads_as_day_first() {
        // 05/10/2024 parses day-first: October 5th, not May 10th.
        let parsed = parse_flexible("05/10/2024").unwrap();
        assert_eq!(
            parsed.date(),
            NaiveDate::from_ymd_opt(2024, 10, 5).unwrap()
        );
    }
}
