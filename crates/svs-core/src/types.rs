//! # Domain Types
//!
//! Record types for the gold lending/buying back office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Account ──┬── Address / BankAccount / AccountDocument                 │
//! │            │                                                            │
//! │            └── Application ──┬── PledgeDetails (PLEDGE_RELEASE only)   │
//! │                              ├── Ornament*                              │
//! │                              └── Estimation ── EstimationItem*          │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                              PaymentInvoice ──┬── InvoiceItem*          │
//! │                                               │     └── PaymentDeduction*│
//! │                                               └── PaymentSettlement*    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (account_code, application_no, invoice_no) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Enum Helpers
// =============================================================================

/// Implements `as_str`, `Display` and `FromStr` over the SCREAMING_SNAKE_CASE
/// names used in the database and on the wire.
macro_rules! string_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored/wire representation.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $name::ALL.iter().map(|v| v.as_str().to_string()).collect(),
                    }),
                }
            }
        }
    };
}

// =============================================================================
// Account
// =============================================================================

/// Kind of party an account represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Walk-in seller or borrower.
    Customer,
    /// Bank or NBFC holding a pledge.
    Financier,
    /// Referral agent.
    Agent,
}

string_enum!(AccountType, "account_type", {
    Customer => "CUSTOMER",
    Financier => "FINANCIER",
    Agent => "AGENT",
});

/// A customer (or counterparty) account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Account {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier, e.g. `CUST-4F2A91`.
    pub account_code: String,

    pub account_type: AccountType,
    pub first_name: String,
    pub last_name: String,

    /// Primary lookup key for every workflow.
    pub mobile: String,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub pan_no: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub address_text: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Display name: first and last name joined by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A postal address attached to an account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Address {
    pub id: String,
    pub account_id: String,
    /// Free-form label: HOME, OFFICE, PERMANENT, ...
    pub address_type: String,
    pub address_line: String,
    pub street: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A bank account payouts can be sent to.
///
/// At most one bank account per account has `is_primary = true`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BankAccount {
    pub id: String,
    pub account_id: String,
    pub bank_name: String,
    pub branch: Option<String>,
    pub account_number: String,
    pub ifsc_code: String,
    pub account_holder_name: String,
    pub account_holder_type: Option<String>,
    pub is_primary: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Metadata for an uploaded KYC document. The file itself lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccountDocument {
    pub id: String,
    pub account_id: String,
    pub document_type: String,
    pub document_number: Option<String>,
    pub file_path: String,
    pub file_name: String,
    #[ts(as = "Option<String>")]
    pub file_size_mb: Option<Decimal>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Application
// =============================================================================

/// What the customer is asking the business to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationType {
    /// Business buys the ornaments outright.
    DirectBuying,
    /// Business pays off a pledge held by a financier and takes the gold.
    PledgeRelease,
}

string_enum!(ApplicationType, "application_type", {
    DirectBuying => "DIRECT_BUYING",
    PledgeRelease => "PLEDGE_RELEASE",
});

/// Lifecycle state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Submitted,
    Approved,
    Rejected,
    Closed,
}

string_enum!(ApplicationStatus, "status", {
    Submitted => "SUBMITTED",
    Approved => "APPROVED",
    Rejected => "REJECTED",
    Closed => "CLOSED",
});

impl ApplicationStatus {
    /// Ornaments and estimations can only be attached to active applications.
    #[inline]
    pub const fn is_active(&self) -> bool {
        matches!(self, ApplicationStatus::Submitted | ApplicationStatus::Approved)
    }
}

impl Default for ApplicationStatus {
    fn default() -> Self {
        ApplicationStatus::Submitted
    }
}

/// A loan/sale application.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Application {
    pub id: String,
    pub account_id: String,
    pub application_type: ApplicationType,
    /// Business identifier, e.g. `APP-20260131-4F2A`.
    pub application_no: String,
    #[ts(as = "Option<String>")]
    pub application_date: Option<NaiveDate>,
    pub place: Option<String>,
    pub status: ApplicationStatus,
    /// Sum of ornament quantities (set when ornaments are recorded).
    pub total_quantity: Option<i64>,
    /// Sum of approximate ornament weights, 3 dp.
    #[ts(as = "Option<String>")]
    pub total_weight_gms: Option<Decimal>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Details of the pledge being released (PLEDGE_RELEASE applications only).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PledgeDetails {
    pub id: String,
    pub application_id: String,
    pub pledger_name: Option<String>,
    pub pledger_address: Option<String>,
    pub financier_name: Option<String>,
    pub branch_name: Option<String>,
    pub gold_loan_account_no: Option<String>,
    pub authorized_person: Option<String>,
    #[ts(as = "Option<String>")]
    pub principal_amount: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub interest_amount: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub total_due: Option<Decimal>,
    pub cheque_no: Option<String>,
    #[ts(as = "Option<String>")]
    pub cheque_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub margin_percentage: Option<Decimal>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A piece of jewellery brought in with an application.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Ornament {
    pub id: String,
    pub application_id: String,
    pub item_name: String,
    pub quantity: i64,
    #[ts(as = "Option<String>")]
    pub purity_percentage: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub approx_weight_gms: Option<Decimal>,
    pub item_photo_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Estimation
// =============================================================================

/// State of an estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimationStatus {
    Estimated,
    Invoiced,
}

string_enum!(EstimationStatus, "status", {
    Estimated => "ESTIMATED",
    Invoiced => "INVOICED",
});

/// Header of the valuation done for one application.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Estimation {
    pub id: String,
    pub account_id: String,
    /// The application this estimation values (one-to-one).
    pub application_id: String,
    pub estimation_no: Option<String>,
    #[ts(as = "String")]
    pub estimation_date: NaiveDate,
    pub status: EstimationStatus,
    /// Sum of `net_amount` over the items.
    #[ts(as = "String")]
    pub total_net_amount: Decimal,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One valued item on an estimation.
///
/// Inputs and outputs of [`crate::estimation::estimate`] are both stored so
/// the figure can be re-derived and audited later.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EstimationItem {
    pub id: String,
    pub estimation_id: String,
    pub item_name: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub gross_weight_gms: Decimal,
    #[ts(as = "String")]
    pub stone_weight_gms: Decimal,
    #[ts(as = "String")]
    pub net_weight_gms: Decimal,
    #[ts(as = "String")]
    pub pure_weight_gms: Decimal,
    #[ts(as = "String")]
    pub gold_rate_per_gm: Decimal,
    #[ts(as = "String")]
    pub purity_percentage: Decimal,
    #[ts(as = "String")]
    pub gross_amount: Decimal,
    #[ts(as = "String")]
    pub deduction_percentage: Decimal,
    #[ts(as = "String")]
    pub net_amount: Decimal,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payments
// =============================================================================

/// Settlement state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

string_enum!(PaymentStatus, "payment_status", {
    Pending => "PENDING",
    Partial => "PARTIAL",
    Paid => "PAID",
});

impl PaymentStatus {
    /// Derives the status from what has been paid against the invoice total.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use svs_core::PaymentStatus;
    ///
    /// let total = Decimal::from(1000);
    /// assert_eq!(PaymentStatus::from_paid(Decimal::ZERO, total), PaymentStatus::Pending);
    /// assert_eq!(PaymentStatus::from_paid(Decimal::from(400), total), PaymentStatus::Partial);
    /// assert_eq!(PaymentStatus::from_paid(total, total), PaymentStatus::Paid);
    /// ```
    pub fn from_paid(paid: Decimal, total: Decimal) -> Self {
        if paid >= total && paid > Decimal::ZERO {
            PaymentStatus::Paid
        } else if paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// How a settlement was paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    Cash,
    Neft,
    Rtgs,
    Imps,
    Upi,
    Cheque,
}

string_enum!(PaymentMode, "payment_mode", {
    Cash => "CASH",
    Neft => "NEFT",
    Rtgs => "RTGS",
    Imps => "IMPS",
    Upi => "UPI",
    Cheque => "CHEQUE",
});

/// Invoice raised against an estimation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentInvoice {
    pub id: String,
    pub invoice_no: String,
    pub account_id: String,
    pub application_id: String,
    pub estimation_id: String,
    #[ts(as = "String")]
    pub invoice_date: NaiveDate,
    #[ts(as = "String")]
    pub total_net_amount: Decimal,
    pub amount_in_words: Option<String>,
    pub remarks: Option<String>,
    pub payment_status: PaymentStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Post-melting line on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub item_name: String,
    #[ts(as = "Option<String>")]
    pub weight_before_melting: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub weight_after_melting: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub purity_after_melting: Option<Decimal>,
    #[ts(as = "Option<String>")]
    pub gold_rate_per_gm: Option<Decimal>,
    #[ts(as = "String")]
    pub gross_amount: Decimal,
    #[ts(as = "String")]
    pub deductions_amount: Decimal,
    #[ts(as = "String")]
    pub net_amount: Decimal,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An itemised deduction (testing charge, melting loss, ...) on an invoice item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentDeduction {
    pub id: String,
    pub invoice_item_id: String,
    pub deduction_type: String,
    #[ts(as = "String")]
    pub deduction_amount: Decimal,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A payout made against an invoice.
/// An invoice can be settled in several instalments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentSettlement {
    pub id: String,
    pub invoice_id: String,
    pub payment_mode: PaymentMode,
    #[ts(as = "String")]
    pub paid_amount: Decimal,
    pub reference_no: Option<String>,
    pub bank_name: Option<String>,
    #[ts(as = "Option<String>")]
    pub payment_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
