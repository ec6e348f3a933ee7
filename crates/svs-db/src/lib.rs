//! # svs-db: Record Keeping for SVS Gold
//!
//! SQLite storage for the gold purchase back office: accounts,
//! applications, ornaments, estimations, invoices and settlements.
//! Valuation math comes from `svs-core`; this crate persists its results.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SVS Gold Data Flow                               │
//! │                                                                         │
//! │  Caller (seed binary, future HTTP layer)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     svs-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ AccountRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ApplicationRepo│   │ 001_initial  │  │   │
//! │  │   │ DbConfig      │    │ EstimationRepo │   │  _schema.sql │  │   │
//! │  │   │               │    │ PaymentRepo    │   │              │  │   │
//! │  │   └───────────────┘    └───────┬────────┘   └──────────────┘  │   │
//! │  │                                │ estimate(), validators        │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │                              svs-core                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Workflow repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use svs_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//! let receipt = db.estimations().add_item(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    AccountLookup, AccountRepository, ApplicationRepository, EstimationReceipt,
    EstimationRepository, OrnamentSummary, PaymentRepository, SettlementReceipt,
};
