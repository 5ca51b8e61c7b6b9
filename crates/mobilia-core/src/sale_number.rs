//! # Sale Number Math
//!
//! Pure helpers for the human-readable sale identifier.
//!
//! ## Format
//! `YYYYMMDD####` - the calendar-day prefix followed by a 4-digit
//! zero-padded daily sequence starting at 0001.
//!
//! ## Example
//! `202608250001`, `202608250002`, ... then `202608260001` the next day.
//!
//! ## Concurrency
//! These helpers only do the arithmetic. The engine composes the next
//! number *inside* the sale transaction, relies on the UNIQUE constraint on
//! the `sale_number` column to detect two callers computing the same
//! sequence, and retries the whole transaction with a fresh number on a
//! collision.

use chrono::NaiveDate;

/// Width of the daily sequence suffix.
const SEQ_WIDTH: usize = 4;

/// Builds the date prefix (`YYYYMMDD`) for a calendar day.
pub fn date_prefix(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Composes a full sale number from a prefix and a sequence value.
pub fn compose(prefix: &str, seq: u32) -> String {
    format!("{}{:0width$}", prefix, seq, width = SEQ_WIDTH)
}

/// Parses the trailing sequence of a sale number with the given prefix.
///
/// Returns `None` when the number does not carry that prefix or the suffix
/// is not a 4-digit integer.
pub fn parse_sequence(sale_number: &str, prefix: &str) -> Option<u32> {
    let suffix = sale_number.strip_prefix(prefix)?;
    if suffix.len() != SEQ_WIDTH {
        return None;
    }
    suffix.parse().ok()
}

/// Derives the next sale number for a day.
///
/// `latest` is the highest persisted number with this prefix (lexicographic
/// descending works because the suffix is fixed-width). No prior sale today
/// means the sequence starts at 0001.
pub fn next_in_sequence(latest: Option<&str>, prefix: &str) -> String {
    let next = latest
        .and_then(|n| parse_sequence(n, prefix))
        .map(|seq| seq + 1)
        .unwrap_or(1);
    compose(prefix, next)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 25).unwrap()
    }

    #[test]
    fn test_prefix_format() {
        assert_eq!(date_prefix(day()), "20260825");
        assert_eq!(
            date_prefix(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            "20260105"
        );
    }

    #[test]
    fn test_first_sale_of_the_day() {
        assert_eq!(next_in_sequence(None, "20260825"), "202608250001");
    }

    #[test]
    fn test_sequence_increments() {
        assert_eq!(
            next_in_sequence(Some("202608250007"), "20260825"),
            "202608250008"
        );
    }

    #[test]
    fn test_sequence_resets_across_days() {
        // Yesterday's latest does not carry today's prefix
        assert_eq!(
            next_in_sequence(Some("202608240042"), "20260825"),
            "202608250001"
        );
    }

    #[test]
    fn test_parse_rejects_foreign_numbers() {
        assert_eq!(parse_sequence("202608250012", "20260825"), Some(12));
        assert_eq!(parse_sequence("202608240012", "20260825"), None);
        assert_eq!(parse_sequence("20260825001", "20260825"), None);
        assert_eq!(parse_sequence("20260825abcd", "20260825"), None);
    }

    #[test]
    fn test_fixed_width_keeps_lexicographic_order() {
        let a = compose("20260825", 9);
        let b = compose("20260825", 10);
        assert!(a < b);
        assert_eq!(a.len(), b.len());
    }
}
