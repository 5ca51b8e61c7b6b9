//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    A R$ 100.00 table is 10_000 cents. A 30% flash discount is exactly  │
//! │    3_000 cents, rounded once, explicitly.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mobilia_core::money::Money;
//!
//! let price = Money::from_cents(10_000); // R$ 100.00
//! let flash = price.discounted_by_percent(30);
//! assert_eq!(flash.cents(), 7_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for refunds and adjustments
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use mobilia_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Applies a whole-percent discount and returns the *discounted price*.
    ///
    /// ## Rounding
    /// The discount amount is `round(price × percent / 100)` with half-up
    /// rounding, computed once. The result is floored at zero so a discount
    /// can never produce a negative price.
    ///
    /// ## Example
    /// ```rust
    /// use mobilia_core::money::Money;
    ///
    /// // R$ 100.00 at 30% off → R$ 70.00
    /// assert_eq!(Money::from_cents(10_000).discounted_by_percent(30).cents(), 7_000);
    /// // Odd amounts round the discount, not the remainder: 9.99 at 33% off
    /// // discount = round(999 × 33 / 100) = round(329.67) = 330 → 6.69
    /// assert_eq!(Money::from_cents(999).discounted_by_percent(33).cents(), 669);
    /// ```
    pub fn discounted_by_percent(&self, percent: i64) -> Money {
        // Widen before multiplying: price × percent can exceed i64.
        let discount = ((self.0 as i128 * percent as i128 + 50) / 100) as i64;
        Money((self.0 - discount).max(0))
    }

    /// Line total for a quantity of this unit price.
    #[inline]
    pub const fn times(&self, quantity: i64) -> Money {
        Money(self.0 * quantity)
    }

    /// Per-line profit: `(unit_price − cost) × quantity`.
    ///
    /// Returns `None` when the cost is unknown; the snapshot stays NULL and
    /// no profit is derived for the line.
    pub fn line_profit(unit_price: Money, cost: Option<Money>, quantity: i64) -> Option<Money> {
        cost.map(|c| Money((unit_price.0 - c.0) * quantity))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Arithmetic Operators
// =============================================================================

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, rhs: i64) -> Money {
        Money(self.0 * rhs)
    }
}

// =============================================================================
// Display
// =============================================================================

impl fmt::Display for Money {
    /// Formats as a decimal amount, e.g. `1099` cents → `10.99`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!((a + b).cents(), 1250);
        assert_eq!((a - b).cents(), 750);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_discount_law_exact() {
        // price × (1 − pct/100), the flash-sale price law
        assert_eq!(
            Money::from_cents(10_000).discounted_by_percent(30).cents(),
            7_000
        );
        assert_eq!(
            Money::from_cents(10_000).discounted_by_percent(1).cents(),
            9_900
        );
        assert_eq!(
            Money::from_cents(10_000).discounted_by_percent(99).cents(),
            100
        );
    }

    #[test]
    fn test_discount_rounds_half_up() {
        // 999 × 33% = 329.67 → discount 330
        assert_eq!(Money::from_cents(999).discounted_by_percent(33).cents(), 669);
        // 101 × 50% = 50.5 → discount 51
        assert_eq!(Money::from_cents(101).discounted_by_percent(50).cents(), 50);
    }

    #[test]
    fn test_discount_widens_before_multiplying() {
        // Large enough that price × percent overflows i64 without widening
        let price = Money::from_cents(i64::MAX / 4);
        let half = price.discounted_by_percent(50);
        assert!((half.cents() - price.cents() / 2).abs() <= 1);
    }

    #[test]
    fn test_discount_never_negative() {
        for pct in 1..100 {
            let price = Money::from_cents(1);
            assert!(price.discounted_by_percent(pct).cents() >= 0);
        }
    }

    #[test]
    fn test_line_profit_requires_cost() {
        let unit = Money::from_cents(10_000);
        let cost = Money::from_cents(6_000);

        // (100.00 − 60.00) × 2 = 80.00
        assert_eq!(
            Money::line_profit(unit, Some(cost), 2),
            Some(Money::from_cents(8_000))
        );
        assert_eq!(Money::line_profit(unit, None, 2), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }
}
