//! Shared utilities for cell parsing and percentage arithmetic.
//!
//! These helpers are used by ingestion, the resolver and every analyzer so
//! that a cell is read the same way everywhere.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in monetary formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Tokens accepted as boolean cells (compared case-insensitively).
pub const BOOLEAN_TOKENS: [&str; 6] = ["true", "false", "1", "0", "yes", "no"];

/// Calendar-date patterns, tried in order. US month-first wins over day-first.
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// ISO date-time patterns without offset.
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// # Example
///
/// ```rust,ignore
/// use claims_engine::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !NUMERIC_FORMAT_CHARS.contains(c))
        .collect()
}

/// Strict numeric parse: surrounding whitespace only, result must be finite.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Lenient numeric parse for monetary cells ("$1,234.50", "1 200 €").
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Check whether a string is one of the accepted boolean tokens.
pub fn is_boolean_token(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    BOOLEAN_TOKENS.contains(&lower.as_str())
}

/// Parse a calendar date from the accepted textual patterns.
///
/// ISO dates and date-times (with or without an offset) are accepted along
/// with `MM/DD/YYYY`, `DD/MM/YYYY` and `YYYY/MM/DD`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

// =============================================================================
// Arithmetic Utilities
// =============================================================================

/// `part / whole × 100`, or 0 when `whole` is zero.
#[inline]
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole * 100.0 }
}

/// `part / whole`, or 0 when `whole` is zero.
#[inline]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Truncate a string to `max_len` characters, appending "..." when cut.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_numeric_string() {
        assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
        assert_eq!(clean_numeric_string("  42%  "), "42");
        assert_eq!(clean_numeric_string("€100"), "100");
    }

    #[test]
    fn test_parse_number_is_strict() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("$12"), None);
        assert_eq!(parse_number("1,000"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_parse_numeric_string_tolerates_currency() {
        assert_eq!(parse_numeric_string("$1,234.50"), Some(1234.5));
        assert_eq!(parse_numeric_string("-75"), Some(-75.0));
        assert_eq!(parse_numeric_string("n/a"), None);
        assert_eq!(parse_numeric_string("$"), None);
    }

    #[test]
    fn test_is_boolean_token() {
        assert!(is_boolean_token("TRUE"));
        assert!(is_boolean_token(" no "));
        assert!(is_boolean_token("0"));
        assert!(!is_boolean_token("y"));
        assert!(!is_boolean_token("maybe"));
    }

    #[test]
    fn test_parse_date_patterns() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_date("2024-03-15"), expected);
        assert_eq!(parse_date("03/15/2024"), expected);
        assert_eq!(parse_date("15/03/2024"), expected);
        assert_eq!(parse_date("2024/03/15"), expected);
        assert_eq!(parse_date("2024-03-15T10:30:00"), expected);
        assert_eq!(parse_date("2024-03-15T10:30:00Z"), expected);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_parse_date_ambiguous_prefers_month_first() {
        assert_eq!(parse_date("02/03/2024"), NaiveDate::from_ymd_opt(2024, 2, 3));
    }

    #[test]
    fn test_percentage_zero_whole() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 4.0), 25.0);
        assert_eq!(ratio(0, 0), 0.0);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a much longer label", 10), "a much ...");
    }
}
