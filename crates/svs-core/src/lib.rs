//! # svs-core: Pure Business Logic for SVS Gold
//!
//! This crate is the **heart** of the SVS Gold back office. It contains the
//! gold valuation formula and the record types as pure code with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SVS Gold Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (external)                          │   │
//! │  │    /accounts ─► /applications ─► /estimations ─► /payments      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ svs-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │estimation │  │  decimal  │  │   types   │  │ validation│  │   │
//! │  │   │ estimate()│  │ half-up   │  │  Account  │  │   rules   │  │   │
//! │  │   │           │  │ rounding  │  │  Invoice  │  │  requests │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    svs-db (Database Layer)                      │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`estimation`] - The valuation formula and its result
//! - [`decimal`] - Half-up rounding helpers (no floating point!)
//! - [`types`] - Record types (Account, Application, Estimation, ...)
//! - [`requests`] - Workflow inputs with field validation
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Decimal Everything**: Weights and money are `rust_decimal::Decimal`, never f64
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use svs_core::estimate;
//!
//! let d = |s: &str| s.parse::<Decimal>().unwrap();
//!
//! // 10g bangle with 1g of stones, 22K, at 6000/g, 2% wastage
//! let result = estimate(d("10.000"), d("1.000"), d("91.6"), d("6000.00"), d("2")).unwrap();
//!
//! assert_eq!(result.net_amount.to_string(), "48451.20");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod decimal;
pub mod error;
pub mod estimation;
pub mod requests;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use svs_core::estimate` instead of
// `use svs_core::estimation::estimate`

pub use error::{CoreError, CoreResult, ValidationError};
pub use estimation::{estimate, EstimationResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal places kept for weights in grams on every valuation step.
pub const WEIGHT_DECIMAL_PLACES: u32 = 2;

/// Decimal places kept for currency amounts.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Decimal places kept for an application's total ornament weight.
pub const TOTAL_WEIGHT_DECIMAL_PLACES: u32 = 3;

/// Maximum ornaments accepted in a single request.
///
/// ## Business Reason
/// A counter appraisal handles a handful of pieces at a time; anything
/// larger is almost certainly a client bug resubmitting a list.
pub const MAX_ORNAMENTS_PER_REQUEST: usize = 100;
