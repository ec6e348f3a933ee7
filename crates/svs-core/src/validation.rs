//! # Validation Module
//!
//! Input validation utilities for SVS Gold.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler                                                 │
//! │  ├── Type validation (deserialization into request structs)            │
//! │  └── THIS MODULE: field rules (ranges, formats, required)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Valuation core                                               │
//! │  └── estimate() rejects stone > gross, nothing else                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The valuation core trusts its caller on purity, rate and deduction
//! ranges. [`validate_estimation_input`] is where those ranges are enforced.
//!
//! ## Usage
//! ```rust,no_run
//! use rust_decimal::Decimal;
//! use svs_core::validation::{validate_mobile, validate_percentage};
//!
//! validate_mobile("9876543210").unwrap();
//! validate_percentage("deduction_percentage", Decimal::from(2)).unwrap();
//! ```

use rust_decimal::Decimal;

use crate::decimal::is_percentage;
use crate::error::ValidationError;
use crate::MAX_ORNAMENTS_PER_REQUEST;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field (names, item names, bank names).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a person name (first/last name, pledger, holder).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_required(field, name, 100)
}

/// Validates a mobile number.
///
/// ## Rules
/// - Required
/// - Optional leading `+`, then 10 to 15 digits
///
/// ## Example
/// ```rust
/// use svs_core::validation::validate_mobile;
///
/// assert!(validate_mobile("9876543210").is_ok());
/// assert!(validate_mobile("+919876543210").is_ok());
/// assert!(validate_mobile("98765").is_err());
/// ```
pub fn validate_mobile(mobile: &str) -> ValidationResult<()> {
    let mobile = mobile.trim();

    if mobile.is_empty() {
        return Err(ValidationError::Required {
            field: "mobile".to_string(),
        });
    }

    let digits = mobile.strip_prefix('+').unwrap_or(mobile);
    if !digits.chars().all(|c| c.is_ascii_digit()) || !(10..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "mobile".to_string(),
            reason: "must be 10 to 15 digits, optionally prefixed with +".to_string(),
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part
/// - Domain contains a dot that is neither first nor last
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing @"))?;

    if local.is_empty() || domain.contains('@') || local.chars().any(char::is_whitespace) {
        return Err(invalid("malformed local part"));
    }

    let dot_ok = domain
        .find('.')
        .map(|i| i > 0 && !domain.ends_with('.'))
        .unwrap_or(false);
    if !dot_ok || domain.chars().any(char::is_whitespace) {
        return Err(invalid("malformed domain"));
    }

    Ok(())
}

/// Validates an account lookup: at least one of mobile/email.
///
/// ## Example
/// ```rust
/// use svs_core::validation::validate_account_lookup;
///
/// assert!(validate_account_lookup(Some("9876543210"), None).is_ok());
/// assert!(validate_account_lookup(None, None).is_err());
/// ```
pub fn validate_account_lookup(mobile: Option<&str>, email: Option<&str>) -> ValidationResult<()> {
    let present = |v: Option<&str>| v.map(|s| !s.trim().is_empty()).unwrap_or(false);

    if !present(mobile) && !present(email) {
        return Err(ValidationError::OneOfRequired {
            fields: vec!["mobile".to_string(), "email".to_string()],
        });
    }

    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use svs_core::validation::validate_uuid;
///
/// assert!(validate_uuid("invoice_item_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("invoice_item_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity (pieces).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a value that must be strictly positive (gross weight, rate).
pub fn validate_positive(field: &str, value: Decimal) -> ValidationResult<()> {
    if value <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a value that may be zero but not negative (stone weight,
/// money amounts).
pub fn validate_non_negative(field: &str, value: Decimal) -> ValidationResult<()> {
    if value < Decimal::ZERO {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a percentage in `[0, 100]`.
pub fn validate_percentage(field: &str, value: Decimal) -> ValidationResult<()> {
    if !is_percentage(value) {
        return Err(out_of_range(field, "0", "100"));
    }

    Ok(())
}

/// Validates a purity percentage in `(0, 100]`.
///
/// Zero purity is rejected: an item with no gold is not valued.
pub fn validate_purity(field: &str, value: Decimal) -> ValidationResult<()> {
    if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(out_of_range(field, "0 (exclusive)", "100"));
    }

    Ok(())
}

/// Validates the inputs of one estimation item before valuation.
///
/// ## Rules
/// - gross weight > 0
/// - stone weight >= 0
/// - purity in (0, 100]
/// - gold rate > 0
/// - deduction in [0, 100]
///
/// Stone > gross is NOT checked here: the valuation core owns that rule.
///
/// ## User Workflow
/// ```text
/// Appraiser submits item form
///      │
///      ▼
/// validate_estimation_input(...) ← THIS FUNCTION
///      │
///      ├── purity 0? → "purity_percentage must be between 0 (exclusive) and 100"
///      │
///      └── OK → estimate(...)
/// ```
pub fn validate_estimation_input(
    gross_weight_gms: Decimal,
    stone_weight_gms: Decimal,
    purity_percentage: Decimal,
    gold_rate_per_gm: Decimal,
    deduction_percentage: Decimal,
) -> ValidationResult<()> {
    validate_positive("gross_weight_gms", gross_weight_gms)?;
    validate_non_negative("stone_weight_gms", stone_weight_gms)?;
    validate_purity("purity_percentage", purity_percentage)?;
    validate_positive("gold_rate_per_gm", gold_rate_per_gm)?;
    validate_percentage("deduction_percentage", deduction_percentage)?;
    Ok(())
}

/// Validates one ornament line.
pub fn validate_ornament(
    item_name: &str,
    quantity: i64,
    purity_percentage: Option<Decimal>,
    approx_weight_gms: Option<Decimal>,
) -> ValidationResult<()> {
    validate_required("item_name", item_name, 200)?;
    validate_quantity(quantity)?;

    if let Some(purity) = purity_percentage {
        validate_purity("purity_percentage", purity)?;
    }
    if let Some(weight) = approx_weight_gms {
        validate_non_negative("approx_weight_gms", weight)?;
    }

    Ok(())
}

/// Validates the number of ornaments submitted in one request.
pub fn validate_ornament_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "ornaments".to_string(),
        });
    }

    if count > MAX_ORNAMENTS_PER_REQUEST {
        return Err(out_of_range(
            "ornaments",
            "1",
            &MAX_ORNAMENTS_PER_REQUEST.to_string(),
        ));
    }

    Ok(())
}

fn out_of_range(field: &str, min: &str, max: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_mobile() {
        assert!(validate_mobile("9876543210").is_ok());
        assert!(validate_mobile("+919876543210").is_ok());

        assert!(validate_mobile("").is_err());
        assert!(validate_mobile("98765").is_err());
        assert!(validate_mobile("98765-43210").is_err());
        assert!(validate_mobile(&"9".repeat(16)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("pavan@example.com").is_ok());

        assert!(validate_email("pavan.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("pavan@example").is_err());
        assert!(validate_email("pavan@.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_account_lookup() {
        assert!(validate_account_lookup(Some("9876543210"), None).is_ok());
        assert!(validate_account_lookup(None, Some("pavan@example.com")).is_ok());

        assert!(matches!(
            validate_account_lookup(None, None),
            Err(ValidationError::OneOfRequired { .. })
        ));
        assert!(validate_account_lookup(Some("  "), Some("")).is_err());
        assert!(validate_account_lookup(None, Some("broken")).is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_name("first_name", "Pavan").is_ok());
        assert!(validate_name("first_name", "   ").is_err());
        assert!(validate_name("first_name", &"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_estimation_input() {
        assert!(validate_estimation_input(dec!(10), dec!(1), dec!(91.6), dec!(6000), dec!(2)).is_ok());
        assert!(validate_estimation_input(dec!(10), dec!(0), dec!(100), dec!(1), dec!(0)).is_ok());
        assert!(validate_estimation_input(dec!(10), dec!(0), dec!(100), dec!(1), dec!(100)).is_ok());

        assert!(validate_estimation_input(dec!(0), dec!(0), dec!(91.6), dec!(6000), dec!(2)).is_err());
        assert!(validate_estimation_input(dec!(10), dec!(-1), dec!(91.6), dec!(6000), dec!(2)).is_err());
        assert!(validate_estimation_input(dec!(10), dec!(1), dec!(0), dec!(6000), dec!(2)).is_err());
        assert!(validate_estimation_input(dec!(10), dec!(1), dec!(100.1), dec!(6000), dec!(2)).is_err());
        assert!(validate_estimation_input(dec!(10), dec!(1), dec!(91.6), dec!(0), dec!(2)).is_err());
        assert!(validate_estimation_input(dec!(10), dec!(1), dec!(91.6), dec!(6000), dec!(101)).is_err());
    }

    #[test]
    fn test_stone_over_gross_left_to_core() {
        // Ranges are fine; the core rejects the combination.
        assert!(validate_estimation_input(dec!(1), dec!(2), dec!(91.6), dec!(6000), dec!(2)).is_ok());
    }

    #[test]
    fn test_validate_ornament() {
        assert!(validate_ornament("Bangle", 2, Some(dec!(91.6)), Some(dec!(24.5))).is_ok());
        assert!(validate_ornament("Chain", 1, None, None).is_ok());

        assert!(validate_ornament("", 1, None, None).is_err());
        assert!(validate_ornament("Ring", 0, None, None).is_err());
        assert!(validate_ornament("Ring", 1, Some(dec!(0)), None).is_err());
        assert!(validate_ornament("Ring", 1, None, Some(dec!(-0.1))).is_err());
    }

    #[test]
    fn test_validate_ornament_count() {
        assert!(validate_ornament_count(1).is_ok());
        assert!(validate_ornament_count(MAX_ORNAMENTS_PER_REQUEST).is_ok());
        assert!(validate_ornament_count(0).is_err());
        assert!(validate_ornament_count(MAX_ORNAMENTS_PER_REQUEST + 1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }
}
