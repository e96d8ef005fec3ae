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
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Every amount is an i64 count of the currency's smallest              │
//! │    denomination (cents, pence, ...). Conversion between currencies      │
//! │    happens in i128 with one documented rounding step.                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::money::Money;
//!
//! // Create from minor units (the only way)
//! let price = Money::from_minor(1099);
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::from_minor(500);
//!
//! // Currency conversion against a scaled rate (92 = 0.92 per base unit)
//! let eur = price.convert_with_rate(92);
//! assert_eq!(eur.minor(), 1011);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::RATE_SCALE;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in a currency's smallest unit (e.g. cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Currency-agnostic**: the currency code travels next to the amount
///   (see [`crate::types::Order`]), never inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Converts this base-currency amount into a target currency using a
    /// scaled exchange rate.
    ///
    /// ## Rate Semantics
    /// `rate` is units of target currency per unit of base currency,
    /// scaled by [`RATE_SCALE`] (100). The identity rate is therefore 100.
    ///
    /// ## Rounding Rule
    /// The quotient `amount × rate / 100` is rounded **half away from
    /// zero**, computed in i128 so intermediate products cannot overflow.
    /// This is the single rounding step for all currency conversion in the
    /// system; it is applied uniformly so resolution is bit-for-bit
    /// deterministic for a given (amount, rate) pair.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let base = Money::from_minor(500);
    /// assert_eq!(base.convert_with_rate(100).minor(), 500); // identity
    /// assert_eq!(base.convert_with_rate(92).minor(), 460);  // 0.92/base
    /// assert_eq!(Money::from_minor(333).convert_with_rate(50).minor(), 167);
    /// ```
    pub fn convert_with_rate(&self, rate: i64) -> Money {
        let product = self.0 as i128 * rate as i128;
        let half = RATE_SCALE as i128 / 2;
        let rounded = if product >= 0 {
            (product + half) / RATE_SCALE as i128
        } else {
            (product - half) / RATE_SCALE as i128
        };
        Money(rounded as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Saturating addition, for totals over untrusted item counts.
    #[inline]
    pub const fn saturating_add(&self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows the raw minor-unit count.
///
/// Currency-aware formatting belongs to presentation layers; this crate
/// does not know which currency an amount is denominated in.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        let result: Money = a * 3;
        assert_eq!(result.minor(), 3000);
    }

    #[test]
    fn test_convert_identity_rate() {
        // Rate 100 is the identity at scale 100
        let amount = Money::from_minor(500);
        assert_eq!(amount.convert_with_rate(100).minor(), 500);
    }

    #[test]
    fn test_convert_rounds_half_away_from_zero() {
        // 333 × 50 / 100 = 166.5 → 167
        assert_eq!(Money::from_minor(333).convert_with_rate(50).minor(), 167);
        // 333 × 49 / 100 = 163.17 → 163
        assert_eq!(Money::from_minor(333).convert_with_rate(49).minor(), 163);
        // Negative amounts round away from zero symmetrically
        assert_eq!(Money::from_minor(-333).convert_with_rate(50).minor(), -167);
    }

    #[test]
    fn test_convert_zero_rate_is_zero_not_panic() {
        // A zero rate is a valid (if odd) rate; the scale divisor is the
        // constant 100, so there is never a division by a rate value.
        assert_eq!(Money::from_minor(500).convert_with_rate(0).minor(), 0);
    }

    #[test]
    fn test_convert_large_amount_no_overflow() {
        // i64::MAX-adjacent amounts survive the i128 intermediate
        let large = Money::from_minor(i64::MAX / 200);
        let converted = large.convert_with_rate(150);
        assert!(converted.minor() > 0);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_minor(299);
        assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_negative());
        assert!(Money::from_minor(-100).is_negative());
    }
}
