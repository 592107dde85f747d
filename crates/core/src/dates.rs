//! Lenient parsing of the date column.
//!
//! The sheet is edited by people, so the same column can hold ISO dates, US
//! slash dates, spelled-out months, pasted timestamps, or the raw serial
//! number Sheets returns for date-formatted cells. Anything that does not
//! parse becomes `None` rather than an error.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Day zero of the Sheets/Excel serial date system.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Serial numbers outside this range are treated as plain numbers, not dates.
const SERIAL_RANGE: std::ops::RangeInclusive<i64> = 10_000..=99_999;

/// Formats with a spelled-out month, tried in order.
const NAMED_MONTH_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
];

fn ordinal_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex"))
}

/// Parse a date cell, returning `None` for blanks and unrecognised text.
pub fn parse_sheet_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = parse_serial(value) {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    if let Some(date) = parse_numeric(value) {
        return Some(date);
    }

    let cleaned = ordinal_suffix().replace_all(value, "$1");
    NAMED_MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
}

fn parse_serial(value: &str) -> Option<NaiveDate> {
    let whole = value.split('.').next()?;
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let days: i64 = whole.parse().ok()?;
    if !SERIAL_RANGE.contains(&days) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(chrono::Duration::days(days))
}

/// `YYYY-MM-DD`, `YYYY/MM/DD`, `M/D/YYYY`, `M/D/YY` (and `-` variants of the
/// US forms).
fn parse_numeric(value: &str) -> Option<NaiveDate> {
    let sep = if value.contains('/') { '/' } else { '-' };
    let parts: Vec<&str> = value.split(sep).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    if !parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let fmt = match (parts[0].len(), parts[2].len()) {
        (4, _) => format!("%Y{sep}%m{sep}%d"),
        (_, 4) => format!("%m{sep}%d{sep}%Y"),
        (_, 2) => format!("%m{sep}%d{sep}%y"),
        _ => return None,
    };
    NaiveDate::parse_from_str(value, &fmt).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn iso_and_slash_forms() {
        assert_eq!(parse_sheet_date("2025-03-01"), ymd(2025, 3, 1));
        assert_eq!(parse_sheet_date("2025/03/01"), ymd(2025, 3, 1));
        assert_eq!(parse_sheet_date("3/1/2025"), ymd(2025, 3, 1));
        assert_eq!(parse_sheet_date("03/01/25"), ymd(2025, 3, 1));
        assert_eq!(parse_sheet_date(" 12-31-2024 "), ymd(2024, 12, 31));
    }

    #[test]
    fn spelled_out_months() {
        assert_eq!(parse_sheet_date("March 1, 2025"), ymd(2025, 3, 1));
        assert_eq!(parse_sheet_date("Mar 1, 2025"), ymd(2025, 3, 1));
        assert_eq!(parse_sheet_date("1 March 2025"), ymd(2025, 3, 1));
        assert_eq!(parse_sheet_date("March 1st, 2025"), ymd(2025, 3, 1));
    }

    #[test]
    fn timestamps_keep_the_date_part() {
        assert_eq!(parse_sheet_date("2025-03-01T09:30:00Z"), ymd(2025, 3, 1));
        assert_eq!(parse_sheet_date("2025-03-01 09:30:00"), ymd(2025, 3, 1));
    }

    #[test]
    fn sheets_serial_numbers() {
        assert_eq!(parse_sheet_date("45658"), ymd(2025, 1, 1));
        assert_eq!(parse_sheet_date("45658.5"), ymd(2025, 1, 1));
        // Too small to be a plausible serial date.
        assert_eq!(parse_sheet_date("42"), None);
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_sheet_date(""), None);
        assert_eq!(parse_sheet_date("TBD"), None);
        assert_eq!(parse_sheet_date("next week"), None);
        assert_eq!(parse_sheet_date("13/45/2025"), None);
    }
}
