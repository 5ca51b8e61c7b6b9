//! # Flash-Sale Window Math
//!
//! Validation and window arithmetic for time-boxed discounts.
//!
//! ## The Single-Active Invariant
//! At most one product may carry a flash window overlapping any instant.
//! This module only supplies the overlap predicate; enforcement happens in
//! the scheduler, inside the same transaction that writes the new window
//! (any other product whose window overlaps is deactivated first).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

/// Clock-skew tolerance: a start this far in the past is still accepted.
pub const PAST_START_TOLERANCE: Duration = Duration::seconds(60);

// =============================================================================
// Flash-Sale Window
// =============================================================================

/// A validated flash-sale window with its derived price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashSaleWindow {
    pub discount_percent: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl FlashSaleWindow {
    /// Validates and builds a window.
    ///
    /// Rules, checked in order:
    /// - `0 < discount_percent < 100`
    /// - `duration_hours > 0`
    /// - `starts_at` no more than [`PAST_START_TOLERANCE`] before `now`
    /// - `ends_at = starts_at + duration_hours`, strictly after `starts_at`
    ///   (always true given a positive duration, re-checked defensively)
    pub fn build(
        discount_percent: i64,
        starts_at: DateTime<Utc>,
        duration_hours: i64,
        now: DateTime<Utc>,
    ) -> Result<FlashSaleWindow, ValidationError> {
        if discount_percent <= 0 || discount_percent >= 100 {
            return Err(ValidationError::OutOfRange {
                field: "discountPercent".to_string(),
                min: 1,
                max: 99,
            });
        }
        if duration_hours <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "durationHours".to_string(),
            });
        }
        if starts_at < now - PAST_START_TOLERANCE {
            return Err(ValidationError::InvalidWindow {
                reason: "start time is in the past".to_string(),
            });
        }
        let ends_at = starts_at + Duration::hours(duration_hours);
        if ends_at <= starts_at {
            return Err(ValidationError::InvalidWindow {
                reason: "end time must be after start time".to_string(),
            });
        }
        Ok(FlashSaleWindow {
            discount_percent,
            starts_at,
            ends_at,
        })
    }

    /// The discounted price for a product at this window's percent.
    ///
    /// `flash_price = price − round(price × percent / 100)`, floored at 0.
    pub fn flash_price(&self, price: Money) -> Money {
        price.discounted_by_percent(self.discount_percent)
    }

    /// Whether this window overlaps the half-open interval
    /// `[starts_at, ends_at)` of another window.
    pub fn overlaps(&self, other_start: DateTime<Utc>, other_end: DateTime<Utc>) -> bool {
        self.starts_at < other_end && other_start < self.ends_at
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_valid_window() {
        let start = now() + Duration::minutes(5);
        let w = FlashSaleWindow::build(30, start, 24, now()).unwrap();
        assert_eq!(w.ends_at, start + Duration::hours(24));
        assert_eq!(w.flash_price(Money::from_cents(10_000)).cents(), 7_000);
    }

    #[test]
    fn test_discount_bounds_exclusive() {
        let start = now();
        assert!(FlashSaleWindow::build(0, start, 1, now()).is_err());
        assert!(FlashSaleWindow::build(100, start, 1, now()).is_err());
        assert!(FlashSaleWindow::build(-5, start, 1, now()).is_err());
        assert!(FlashSaleWindow::build(1, start, 1, now()).is_ok());
        assert!(FlashSaleWindow::build(99, start, 1, now()).is_ok());
    }

    #[test]
    fn test_duration_must_be_positive() {
        assert!(matches!(
            FlashSaleWindow::build(30, now(), 0, now()),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_clock_skew_tolerance() {
        let t = now();
        // 30 seconds in the past: inside tolerance
        assert!(FlashSaleWindow::build(30, t - Duration::seconds(30), 1, t).is_ok());
        // 2 minutes in the past: rejected
        assert!(matches!(
            FlashSaleWindow::build(30, t - Duration::minutes(2), 1, t),
            Err(ValidationError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_overlap_predicate() {
        let start = now();
        let w = FlashSaleWindow::build(30, start, 24, now()).unwrap();

        // Fully inside
        assert!(w.overlaps(start + Duration::hours(1), start + Duration::hours(2)));
        // Straddles the start
        assert!(w.overlaps(start - Duration::hours(1), start + Duration::hours(1)));
        // Touching end-to-start is not an overlap (half-open)
        assert!(!w.overlaps(w.ends_at, w.ends_at + Duration::hours(1)));
        assert!(!w.overlaps(start - Duration::hours(2), start));
        // Entirely elsewhere
        assert!(!w.overlaps(w.ends_at + Duration::hours(1), w.ends_at + Duration::hours(2)));
    }

    #[test]
    fn test_flash_price_never_negative() {
        let w = FlashSaleWindow::build(99, now(), 1, now()).unwrap();
        assert!(w.flash_price(Money::from_cents(1)).cents() >= 0);
    }
}
