//! # Repository Module
//!
//! Database repository implementations for the SVS Gold ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Transport handler                                                     │
//! │       │                                                                 │
//! │       │  db.estimations().add_item(req)                                │
//! │       ▼                                                                 │
//! │  EstimationRepository                                                  │
//! │  ├── resolve account by mobile                                         │
//! │  ├── find latest active application                                    │
//! │  ├── reuse or open the estimation                                      │
//! │  ├── estimate() ← svs-core                                             │
//! │  └── insert item + recompute total     (one transaction)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Customer Lookup
//! Every workflow except account creation identifies the customer by
//! mobile number. An unknown mobile is `DbError::NotFound`.
//!
//! ## Decimal Storage
//! Decimals are written as canonical TEXT and parsed back on read, so a
//! stored `49440.00` comes back with its scale intact.
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`] - Accounts, addresses, bank accounts, documents
//! - [`ApplicationRepository`] - Applications, pledge details, ornaments
//! - [`EstimationRepository`] - Estimations and valued items
//! - [`PaymentRepository`] - Invoices, invoice items, deductions, settlements

pub mod account;
pub mod application;
pub mod estimation;
pub mod payment;

pub use account::{AccountLookup, AccountRepository};
pub use application::{ApplicationRepository, OrnamentSummary};
pub use estimation::{EstimationReceipt, EstimationRepository};
pub use payment::{PaymentRepository, SettlementReceipt};

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use svs_core::decimal;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// Shared Helpers
// =============================================================================

/// Generates a new primary key.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Resolves an account id from its mobile number.
///
/// Surrounding whitespace is ignored, matching how `create` stores it.
pub(crate) async fn account_id_by_mobile(
    conn: &mut SqliteConnection,
    mobile: &str,
) -> DbResult<String> {
    let mobile = mobile.trim();
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM accounts WHERE mobile = ?1")
        .bind(mobile)
        .fetch_optional(&mut *conn)
        .await?;

    id.ok_or_else(|| DbError::not_found("Account", mobile))
}

/// Reads a NOT NULL decimal column.
pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> DbResult<Decimal> {
    let raw: String = row.try_get(column)?;
    parse_decimal(column, &raw)
}

/// Reads a nullable decimal column.
pub(crate) fn optional_decimal_column(row: &SqliteRow, column: &str) -> DbResult<Option<Decimal>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| parse_decimal(column, &value)).transpose()
}

fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    decimal::parse(raw).map_err(|e| DbError::InvalidColumn {
        column: column.to_string(),
        reason: format!("'{}' is not a decimal: {}", raw, e),
    })
}

/// Storage form of a decimal.
pub(crate) fn decimal_text(value: Decimal) -> String {
    value.to_string()
}

/// Storage form of an optional decimal.
pub(crate) fn optional_decimal_text(value: Option<Decimal>) -> Option<String> {
    value.map(decimal_text)
}

/// Sums a decimal column over rows, exactly.
///
/// SQLite's SUM would go through floating point on TEXT values.
pub(crate) fn sum_decimals(rows: &[SqliteRow], column: &str) -> DbResult<Decimal> {
    rows.iter().try_fold(Decimal::ZERO, |total, row| {
        let value = decimal_column(row, column)?;
        total
            .checked_add(value)
            .ok_or_else(|| DbError::Internal(format!("{} total overflowed", column)))
    })
}

/// Generates a business key: `PREFIX-XXXXXX` from fresh random hex.
pub(crate) fn generate_code(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}", prefix, &hex[..6])
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        let code = generate_code("CUST");
        assert_eq!(code.len(), "CUST-".len() + 6);
        assert!(code.starts_with("CUST-"));
        assert!(code[5..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_code("CUST"), generate_code("CUST"));
    }

    #[test]
    fn test_decimal_text_keeps_scale() {
        let value: Decimal = "49440.00".parse().unwrap();
        assert_eq!(decimal_text(value), "49440.00");
        assert_eq!(optional_decimal_text(None), None);
    }
}
