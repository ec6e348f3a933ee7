//! # Decimal Module
//!
//! Rounding rules for weights and money.
//!
//! ## Why Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    9.00 × 0.916 = 8.244000000000000128  ❌ drifts                       │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal::Decimal                                    │
//! │    9.00 × 0.916 = 8.24400  (exact, base 10)                             │
//! │    Every weight, purity, rate and amount stays a Decimal end to end.   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Mode: Half-Up
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ROUND HALF UP (away from zero)                                     │
//! │                                                                     │
//! │    8.244 → 8.24     8.245 → 8.25     8.246 → 8.25                   │
//! │                                                                     │
//! │  Bankers rounding would give 8.245 → 8.24. That is off by a cent   │
//! │  on the final payable amount, so it is never used here.            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//! use svs_core::decimal::round_half_up;
//!
//! let v = Decimal::from_str("8.245").unwrap();
//! assert_eq!(round_half_up(v).to_string(), "8.25");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{AMOUNT_DECIMAL_PLACES, TOTAL_WEIGHT_DECIMAL_PLACES, WEIGHT_DECIMAL_PLACES};

/// The one rounding strategy used across the crate.
pub const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Rounds half-up to `dp` places and pins the scale to exactly `dp`.
///
/// Pinning the scale means `9` and `9.000` both come out as `9.00`, so
/// serialized values always carry the same number of places.
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, ROUNDING);
    rounded.rescale(dp);
    rounded
}

/// Rounds a currency amount half-up to 2 decimal places.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
/// use svs_core::decimal::round_half_up;
///
/// assert_eq!(round_half_up(Decimal::from_str("8.244").unwrap()).to_string(), "8.24");
/// assert_eq!(round_half_up(Decimal::from_str("9").unwrap()).to_string(), "9.00");
/// ```
#[inline]
pub fn round_half_up(value: Decimal) -> Decimal {
    round_to(value, AMOUNT_DECIMAL_PLACES)
}

/// Rounds a per-item weight in grams half-up to 2 decimal places.
#[inline]
pub fn round_weight(value: Decimal) -> Decimal {
    round_to(value, WEIGHT_DECIMAL_PLACES)
}

/// Rounds an aggregate weight half-up to 3 decimal places.
///
/// Application totals are kept to the milligram.
#[inline]
pub fn round_weight_3dp(value: Decimal) -> Decimal {
    round_to(value, TOTAL_WEIGHT_DECIMAL_PLACES)
}

/// Returns `value × pct / 100` without rounding.
///
/// `None` when the product overflows.
pub fn percent_of(value: Decimal, pct: Decimal) -> Option<Decimal> {
    value.checked_mul(pct.checked_div(Decimal::ONE_HUNDRED)?)
}

/// Returns true when `value` lies in `[0, 100]`.
#[inline]
pub fn is_percentage(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED
}

/// Parses a decimal from its canonical string form.
///
/// Thin wrapper so storage code does not import `FromStr` everywhere.
pub fn parse(s: &str) -> Result<Decimal, rust_decimal::Error> {
    s.trim().parse::<Decimal>()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_up_midpoint() {
        assert_eq!(round_half_up(dec!(8.245)), dec!(8.25));
        assert_eq!(round_half_up(dec!(8.244)), dec!(8.24));
        assert_eq!(round_half_up(dec!(0.005)), dec!(0.01));
        assert_eq!(round_half_up(dec!(2.675)), dec!(2.68));
    }

    #[test]
    fn test_round_half_up_is_not_bankers() {
        // Bankers rounding would send both of these to the even neighbour.
        assert_eq!(round_half_up(dec!(0.125)), dec!(0.13));
        assert_eq!(round_half_up(dec!(0.135)), dec!(0.14));
        assert_ne!(
            round_half_up(dec!(0.125)),
            dec!(0.125).round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
        );
    }

    #[test]
    fn test_scale_is_pinned() {
        assert_eq!(round_half_up(dec!(9)).to_string(), "9.00");
        assert_eq!(round_half_up(dec!(9.000)).to_string(), "9.00");
        assert_eq!(round_half_up(dec!(49440.0000)).to_string(), "49440.00");
        assert_eq!(round_weight_3dp(dec!(12.5)).to_string(), "12.500");
    }

    #[test]
    fn test_round_weight_3dp() {
        assert_eq!(round_weight_3dp(dec!(10.1235)), dec!(10.124));
        assert_eq!(round_weight_3dp(dec!(10.1234)), dec!(10.123));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec!(49440.00), dec!(2)), Some(dec!(988.80)));
        assert_eq!(percent_of(dec!(100), dec!(0)), Some(Decimal::ZERO));
        assert_eq!(percent_of(Decimal::MAX, dec!(200)), None);
    }

    #[test]
    fn test_is_percentage() {
        assert!(is_percentage(dec!(0)));
        assert!(is_percentage(dec!(91.6)));
        assert!(is_percentage(dec!(100)));
        assert!(!is_percentage(dec!(100.01)));
        assert!(!is_percentage(dec!(-0.01)));
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse(" 91.60 ").unwrap(), dec!(91.6));
        assert!(parse("abc").is_err());
    }
}
