//! # Estimation Module
//!
//! The gold valuation formula: raw weights and rates in, payable amounts out.
//!
//! ## Computation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  gross_weight ─┐                                                        │
//! │                ├─► net_gold_weight = round(gross - stone)               │
//! │  stone_weight ─┘            │                                           │
//! │                             ▼                                           │
//! │  purity % ────────► pure_gold_weight = round(net × purity/100)          │
//! │                             │                                           │
//! │                             ▼                                           │
//! │  rate / gm ───────► gross_amount = round(pure × rate)                   │
//! │                             │                                           │
//! │                             ▼                                           │
//! │  deduction % ─────► net_amount = round(gross - gross × deduction/100)   │
//! │                                                                         │
//! │  round() = half-up, 2 dp, applied after EVERY step                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounding after each step (not only at the end) is part of the contract:
//! stored estimations were produced this way and must reproduce exactly.
//!
//! ## Example
//! ```rust
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//! use svs_core::estimation::estimate;
//!
//! let d = |s: &str| Decimal::from_str(s).unwrap();
//! let result = estimate(d("10.000"), d("1.000"), d("91.6"), d("6000.00"), d("2")).unwrap();
//!
//! assert_eq!(result.net_gold_weight, d("9.00"));
//! assert_eq!(result.pure_gold_weight, d("8.24"));
//! assert_eq!(result.gross_amount, d("49440.00"));
//! assert_eq!(result.net_amount, d("48451.20"));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::decimal::{percent_of, round_half_up, round_weight};
use crate::error::{CoreError, CoreResult};

// =============================================================================
// Estimation Result
// =============================================================================

/// Outcome of one valuation.
///
/// Built fresh on every call and never mutated. `deductions` is the
/// percentage the caller passed in, echoed back, not a money amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EstimationResult {
    /// Grams: gross minus stone.
    #[ts(as = "String")]
    pub net_gold_weight: Decimal,

    /// Grams of pure gold.
    #[serde(rename = "pure_weight")]
    #[ts(as = "String")]
    pub pure_gold_weight: Decimal,

    /// Deduction percentage as supplied.
    #[ts(as = "String")]
    pub deductions: Decimal,

    /// Pure weight priced at the market rate.
    #[ts(as = "String")]
    pub gross_amount: Decimal,

    /// Gross amount less the percentage deduction.
    #[ts(as = "String")]
    pub net_amount: Decimal,
}

// =============================================================================
// Valuation
// =============================================================================

/// Values a gold item.
///
/// ## Arguments
/// * `gross_weight_gms` - Total item weight in grams
/// * `stone_weight_gms` - Weight of embedded stones in grams
/// * `purity_percentage` - Pure gold share of the net weight (91.6 = 22K)
/// * `gold_rate_per_gm` - Market rate for one gram of pure gold
/// * `deduction_percentage` - Wastage/making charges as a percentage
///
/// ## Errors
/// * `CoreError::InvalidInput` - stone weight exceeds gross weight, or an
///   intermediate product overflows the decimal range
///
/// Purity, rate and deduction ranges are NOT checked here. Use
/// [`crate::validation::validate_estimation_input`] before calling.
///
/// ## User Workflow
/// ```text
/// Appraiser weighs a bangle: gross 10.000g, stones 1.000g
///      │
///      ▼
/// Touchstone test: 91.6% pure. Today's rate: 6000.00 / g. Wastage 2%
///      │
///      ▼
/// estimate(...) ← THIS FUNCTION
///      │
///      ▼
/// net 9.00g → pure 8.24g → gross 49440.00 → payable 48451.20
/// ```
pub fn estimate(
    gross_weight_gms: Decimal,
    stone_weight_gms: Decimal,
    purity_percentage: Decimal,
    gold_rate_per_gm: Decimal,
    deduction_percentage: Decimal,
) -> CoreResult<EstimationResult> {
    if stone_weight_gms > gross_weight_gms {
        return Err(CoreError::invalid_input(format!(
            "stone weight {} exceeds gross weight {}",
            stone_weight_gms, gross_weight_gms
        )));
    }

    let net_gold_weight = round_weight(
        gross_weight_gms
            .checked_sub(stone_weight_gms)
            .ok_or_else(|| overflow("net gold weight"))?,
    );

    let pure_gold_weight = round_weight(
        percent_of(net_gold_weight, purity_percentage)
            .ok_or_else(|| overflow("pure gold weight"))?,
    );

    let gross_amount = round_half_up(
        pure_gold_weight
            .checked_mul(gold_rate_per_gm)
            .ok_or_else(|| overflow("gross amount"))?,
    );

    let deduction_amount =
        percent_of(gross_amount, deduction_percentage).ok_or_else(|| overflow("deduction"))?;
    let net_amount = round_half_up(
        gross_amount
            .checked_sub(deduction_amount)
            .ok_or_else(|| overflow("net amount"))?,
    );

    Ok(EstimationResult {
        net_gold_weight,
        pure_gold_weight,
        deductions: deduction_percentage,
        gross_amount,
        net_amount,
    })
}

fn overflow(quantity: &str) -> CoreError {
    CoreError::invalid_input(format!("{} is out of range", quantity))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_worked_example() {
        let r = estimate(dec!(10.000), dec!(1.000), dec!(91.6), dec!(6000.00), dec!(2)).unwrap();

        assert_eq!(r.net_gold_weight, dec!(9.00));
        // 9.00 × 0.916 = 8.244 → 8.24
        assert_eq!(r.pure_gold_weight, dec!(8.24));
        assert_eq!(r.gross_amount, dec!(49440.00));
        // 49440.00 − 988.80
        assert_eq!(r.net_amount, dec!(48451.20));
        assert_eq!(r.deductions, dec!(2));
    }

    #[test]
    fn test_rounds_at_each_step() {
        // Unrounded chain: 9 × 0.916 × 6000 = 49464.00
        // Rounding the pure weight first gives 8.24 × 6000 = 49440.00
        let r = estimate(dec!(10), dec!(1), dec!(91.6), dec!(6000), dec!(0)).unwrap();
        assert_eq!(r.gross_amount, dec!(49440.00));
        assert_ne!(r.gross_amount, dec!(49464.00));
    }

    #[test]
    fn test_half_up_on_pure_weight() {
        // 16.49 × 0.50 = 8.245 → 8.25 (bankers would give 8.24)
        let r = estimate(dec!(16.49), dec!(0), dec!(50), dec!(1), dec!(0)).unwrap();
        assert_eq!(r.pure_gold_weight, dec!(8.25));
        assert_eq!(r.gross_amount, dec!(8.25));
    }

    #[test]
    fn test_equal_weights_is_zero_not_error() {
        let r = estimate(dec!(5.5), dec!(5.5), dec!(91.6), dec!(6000), dec!(3)).unwrap();
        assert_eq!(r.net_gold_weight, Decimal::ZERO);
        assert_eq!(r.pure_gold_weight, Decimal::ZERO);
        assert_eq!(r.gross_amount, Decimal::ZERO);
        assert_eq!(r.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_stone_heavier_than_gross_rejected() {
        let err = estimate(dec!(4.00), dec!(5.00), dec!(91.6), dec!(6000), dec!(2)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
        assert!(err.to_string().contains("exceeds gross weight"));
    }

    #[test]
    fn test_zero_and_full_deduction() {
        let r = estimate(dec!(12.345), dec!(0.5), dec!(75), dec!(5432.10), dec!(0)).unwrap();
        assert_eq!(r.net_amount, r.gross_amount);

        let r = estimate(dec!(12.345), dec!(0.5), dec!(75), dec!(5432.10), dec!(100)).unwrap();
        assert_eq!(r.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_overflow_is_invalid_input() {
        // ~7.9e25 g × 1e6 / g cannot be represented in 96 bits
        let huge = dec!(79228162514264337593543950);
        let err = estimate(huge, dec!(0), dec!(100), dec!(1000000), dec!(0)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
    }

    #[test]
    fn test_serialized_field_names() {
        let r = estimate(dec!(10.000), dec!(1.000), dec!(91.6), dec!(6000.00), dec!(2)).unwrap();
        let json = serde_json::to_value(r).unwrap();

        assert_eq!(json["net_gold_weight"], "9.00");
        assert_eq!(json["pure_weight"], "8.24");
        assert_eq!(json["deductions"], "2");
        assert_eq!(json["gross_amount"], "49440.00");
        assert_eq!(json["net_amount"], "48451.20");
        assert!(json.get("pure_gold_weight").is_none());
    }

    #[test]
    fn test_same_inputs_same_result() {
        let a = estimate(dec!(23.457), dec!(2.118), dec!(87.5), dec!(6123.45), dec!(3.5)).unwrap();
        let b = estimate(dec!(23.457), dec!(2.118), dec!(87.5), dec!(6123.45), dec!(3.5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_amounts_never_decrease_with_rate() {
        let mut previous_gross = Decimal::ZERO;
        let mut previous_net = Decimal::ZERO;
        for rate in (0..=40).map(|step| Decimal::from(step * 250)) {
            let r = estimate(dec!(18.765), dec!(1.2), dec!(91.6), rate, dec!(4)).unwrap();
            assert!(r.gross_amount >= previous_gross, "rate {} gave gross {}", rate, r.gross_amount);
            assert!(r.net_amount >= previous_net, "rate {} gave net {}", rate, r.net_amount);
            previous_gross = r.gross_amount;
            previous_net = r.net_amount;
        }
    }

    #[test]
    fn test_stone_versus_gross_grid() {
        let weights = [dec!(0), dec!(0.01), dec!(1), dec!(4.995), dec!(5), dec!(12.5)];
        for gross in weights {
            for stone in weights {
                let result = estimate(gross, stone, dec!(91.6), dec!(6000), dec!(2));
                if stone > gross {
                    assert!(
                        matches!(result, Err(CoreError::InvalidInput { .. })),
                        "stone {} gross {}",
                        stone,
                        gross
                    );
                } else {
                    let r = result.unwrap();
                    assert!(r.net_gold_weight >= Decimal::ZERO);
                    assert!(r.net_amount <= r.gross_amount);
                }
            }
        }
    }

    #[test]
    fn test_outputs_carry_two_decimal_places() {
        let r = estimate(dec!(7), dec!(0), dec!(100), dec!(5000), dec!(0)).unwrap();
        assert_eq!(r.net_gold_weight.scale(), 2);
        assert_eq!(r.pure_gold_weight.scale(), 2);
        assert_eq!(r.gross_amount.scale(), 2);
        assert_eq!(r.net_amount.scale(), 2);
        assert_eq!(r.net_amount.to_string(), "35000.00");
    }
}
