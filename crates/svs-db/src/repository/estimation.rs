//! # Estimation Repository
//!
//! Persists valuations produced by [`svs_core::estimate`].
//!
//! ## Add-Item Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EstimationItemCreateRequest                                            │
//! │       │                                                                 │
//! │       ├── validate()  ─────────────► DbError::Core (400)               │
//! │       ├── estimate()  ─────────────► DbError::Core (stone > gross)     │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  account by mobile ─► latest active application ─► Conflict if none    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  estimation for application?                                           │
//! │       ├── yes: reuse (Conflict if already INVOICED)                     │
//! │       └── no:  open { status: ESTIMATED, date: today }                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT estimation_items                                               │
//! │  total_net_amount = Σ item.net_amount (exact decimal sum)              │
//! │       │                                                                 │
//! │       ▼  COMMIT                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use svs_core::decimal::round_half_up;
use svs_core::requests::EstimationItemCreateRequest;
use svs_core::{estimate, Estimation, EstimationItem, EstimationStatus};

use super::application::latest_active_application;
use super::{account_id_by_mobile, decimal_column, decimal_text, new_id, sum_decimals};
use crate::error::{DbError, DbResult};

/// Result of adding one valued item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationReceipt {
    pub estimation_id: String,
    pub application_id: String,
    pub item: EstimationItem,
    /// Running total over every item of the estimation.
    pub total_net_amount: Decimal,
    pub status: EstimationStatus,
}

/// Repository for estimation database operations.
#[derive(Debug, Clone)]
pub struct EstimationRepository {
    pool: SqlitePool,
}

impl EstimationRepository {
    /// Creates a new EstimationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EstimationRepository { pool }
    }

    /// Values an item and records it against the customer's latest active
    /// application.
    ///
    /// ## Errors
    /// * `DbError::Core` - invalid input, or stone weight above gross weight
    /// * `DbError::NotFound` - no account for the mobile number
    /// * `DbError::Conflict` - no active application, or its estimation has
    ///   already been invoiced
    pub async fn add_item(&self, req: &EstimationItemCreateRequest) -> DbResult<EstimationReceipt> {
        req.validate()?;

        let valuation = estimate(
            req.gross_weight_gms,
            req.stone_weight_gms,
            req.purity_percentage,
            req.gold_rate_per_gm,
            req.deduction_percentage,
        )?;

        let mut tx = self.pool.begin().await?;
        let account_id = account_id_by_mobile(&mut tx, &req.mobile).await?;

        let application = latest_active_application(&mut tx, &account_id)
            .await?
            .ok_or_else(|| DbError::conflict("No active application"))?;

        let estimation_id = match find_for_application(&mut tx, &application.id).await? {
            Some(estimation) if estimation.status == EstimationStatus::Invoiced => {
                return Err(DbError::conflict("Estimation already invoiced"));
            }
            Some(estimation) => estimation.id,
            None => {
                let id = new_id();
                debug!(id = %id, application_id = %application.id, "Opening estimation");

                sqlx::query(
                    r#"
                    INSERT INTO estimations (
                        id, account_id, application_id, estimation_no,
                        estimation_date, status, total_net_amount, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )
                .bind(&id)
                .bind(&account_id)
                .bind(&application.id)
                .bind(&req.estimation_no)
                .bind(Utc::now().date_naive())
                .bind(EstimationStatus::Estimated)
                .bind(decimal_text(round_half_up(Decimal::ZERO)))
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                id
            }
        };

        let item = EstimationItem {
            id: new_id(),
            estimation_id: estimation_id.clone(),
            item_name: req.item_name.clone(),
            quantity: req.quantity,
            gross_weight_gms: req.gross_weight_gms,
            stone_weight_gms: req.stone_weight_gms,
            net_weight_gms: valuation.net_gold_weight,
            pure_weight_gms: valuation.pure_gold_weight,
            gold_rate_per_gm: req.gold_rate_per_gm,
            purity_percentage: req.purity_percentage,
            gross_amount: valuation.gross_amount,
            deduction_percentage: valuation.deductions,
            net_amount: valuation.net_amount,
            created_at: Utc::now(),
        };

        debug!(
            estimation_id = %estimation_id,
            item_name = %item.item_name,
            net_amount = %item.net_amount,
            "Adding estimation item"
        );

        sqlx::query(
            r#"
            INSERT INTO estimation_items (
                id, estimation_id, item_name, quantity,
                gross_weight_gms, stone_weight_gms, net_weight_gms, pure_weight_gms,
                gold_rate_per_gm, purity_percentage,
                gross_amount, deduction_percentage, net_amount,
                created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10,
                ?11, ?12, ?13,
                ?14
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.estimation_id)
        .bind(&item.item_name)
        .bind(item.quantity)
        .bind(decimal_text(item.gross_weight_gms))
        .bind(decimal_text(item.stone_weight_gms))
        .bind(decimal_text(item.net_weight_gms))
        .bind(decimal_text(item.pure_weight_gms))
        .bind(decimal_text(item.gold_rate_per_gm))
        .bind(decimal_text(item.purity_percentage))
        .bind(decimal_text(item.gross_amount))
        .bind(decimal_text(item.deduction_percentage))
        .bind(decimal_text(item.net_amount))
        .bind(item.created_at)
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query("SELECT net_amount FROM estimation_items WHERE estimation_id = ?1")
            .bind(&estimation_id)
            .fetch_all(&mut *tx)
            .await?;
        let total_net_amount = round_half_up(sum_decimals(&rows, "net_amount")?);

        sqlx::query("UPDATE estimations SET total_net_amount = ?2 WHERE id = ?1")
            .bind(&estimation_id)
            .bind(decimal_text(total_net_amount))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            application_no = %application.application_no,
            net_amount = %item.net_amount,
            total_net_amount = %total_net_amount,
            "Estimation item recorded"
        );

        Ok(EstimationReceipt {
            estimation_id,
            application_id: application.id,
            item,
            total_net_amount,
            status: EstimationStatus::Estimated,
        })
    }

    /// Gets an estimation by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Estimation>> {
        let row = sqlx::query("SELECT * FROM estimations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_estimation).transpose()
    }

    /// Gets the estimation opened for an application, if any.
    pub async fn get_for_application(&self, application_id: &str) -> DbResult<Option<Estimation>> {
        let mut conn = self.pool.acquire().await?;
        find_for_application(&mut conn, application_id).await
    }

    /// Lists an estimation's items in insertion order.
    pub async fn list_items(&self, estimation_id: &str) -> DbResult<Vec<EstimationItem>> {
        let rows = sqlx::query(
            "SELECT * FROM estimation_items WHERE estimation_id = ?1 ORDER BY rowid",
        )
        .bind(estimation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_estimation_item).collect()
    }
}

// =============================================================================
// Shared Queries
// =============================================================================

pub(crate) async fn find_for_application(
    conn: &mut SqliteConnection,
    application_id: &str,
) -> DbResult<Option<Estimation>> {
    let row = sqlx::query("SELECT * FROM estimations WHERE application_id = ?1")
        .bind(application_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(map_estimation).transpose()
}

/// Marks an estimation as invoiced.
pub(crate) async fn mark_invoiced(conn: &mut SqliteConnection, estimation_id: &str) -> DbResult<()> {
    let result = sqlx::query("UPDATE estimations SET status = ?2 WHERE id = ?1")
        .bind(estimation_id)
        .bind(EstimationStatus::Invoiced)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Estimation", estimation_id));
    }

    Ok(())
}

// =============================================================================
// Row Mapping
// =============================================================================

fn map_estimation(row: &SqliteRow) -> DbResult<Estimation> {
    Ok(Estimation {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        application_id: row.try_get("application_id")?,
        estimation_no: row.try_get("estimation_no")?,
        estimation_date: row.try_get("estimation_date")?,
        status: row.try_get("status")?,
        total_net_amount: decimal_column(row, "total_net_amount")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_estimation_item(row: &SqliteRow) -> DbResult<EstimationItem> {
    Ok(EstimationItem {
        id: row.try_get("id")?,
        estimation_id: row.try_get("estimation_id")?,
        item_name: row.try_get("item_name")?,
        quantity: row.try_get("quantity")?,
        gross_weight_gms: decimal_column(row, "gross_weight_gms")?,
        stone_weight_gms: decimal_column(row, "stone_weight_gms")?,
        net_weight_gms: decimal_column(row, "net_weight_gms")?,
        pure_weight_gms: decimal_column(row, "pure_weight_gms")?,
        gold_rate_per_gm: decimal_column(row, "gold_rate_per_gm")?,
        purity_percentage: decimal_column(row, "purity_percentage")?,
        gross_amount: decimal_column(row, "gross_amount")?,
        deduction_percentage: decimal_column(row, "deduction_percentage")?,
        net_amount: decimal_column(row, "net_amount")?,
        created_at: row.try_get("created_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
