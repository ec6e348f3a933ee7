//! # Application Repository
//!
//! Database operations for applications, pledge details and ornaments.
//!
//! ## Application Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Application Lifecycle                               │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → Application { status: SUBMITTED }                   │
//! │                                                                         │
//! │  2. DESCRIBE                                                           │
//! │     └── create_pledge_details()   (PLEDGE_RELEASE only, once)          │
//! │     └── add_ornaments()           → totals recomputed                  │
//! │                                                                         │
//! │  3. VALUE                                                              │
//! │     └── EstimationRepository::add_item()                               │
//! │                                                                         │
//! │  4. DECIDE                                                             │
//! │     └── update_status() → APPROVED / REJECTED / CLOSED                 │
//! │                                                                         │
//! │  "Active" = SUBMITTED or APPROVED. Ornaments and estimations always    │
//! │  attach to the customer's most recent active application.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use svs_core::decimal::round_weight_3dp;
use svs_core::requests::{ApplicationCreateRequest, OrnamentCreateRequest, PledgeDetailsCreateRequest};
use svs_core::{Application, ApplicationStatus, ApplicationType, Ornament, PledgeDetails};

use super::{
    account_id_by_mobile, generate_code, new_id, optional_decimal_column, optional_decimal_text,
};
use crate::error::{DbError, DbResult};

/// Totals after a batch of ornaments is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrnamentSummary {
    pub application_id: String,
    pub application_no: String,
    pub ornaments_added: usize,
    pub total_quantity: i64,
    pub total_weight_gms: Decimal,
    pub status: ApplicationStatus,
}

/// Repository for application database operations.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    pool: SqlitePool,
}

impl ApplicationRepository {
    /// Creates a new ApplicationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ApplicationRepository { pool }
    }

    // =========================================================================
    // Applications
    // =========================================================================

    /// Opens a new application for the customer.
    ///
    /// ## Application Number
    /// Uses the supplied number, or generates `APP-XXXXXX` when absent.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no account for the mobile number
    /// * `DbError::Conflict` - an active application with this number exists
    pub async fn create(&self, req: &ApplicationCreateRequest) -> DbResult<Application> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;
        let account_id = account_id_by_mobile(&mut tx, &req.mobile).await?;

        let application_no = req
            .application_no
            .clone()
            .unwrap_or_else(|| generate_code("APP"));

        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM applications
            WHERE account_id = ?1
              AND application_no = ?2
              AND status IN ('SUBMITTED', 'APPROVED')
            "#,
        )
        .bind(&account_id)
        .bind(&application_no)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Err(DbError::conflict("Active application already exists"));
        }

        let application = Application {
            id: new_id(),
            account_id,
            application_type: req.application_type,
            application_no,
            application_date: req.application_date,
            place: req.place.clone(),
            status: ApplicationStatus::Submitted,
            total_quantity: None,
            total_weight_gms: None,
            created_at: Utc::now(),
        };

        debug!(
            id = %application.id,
            application_no = %application.application_no,
            application_type = %application.application_type,
            "Creating application"
        );

        sqlx::query(
            r#"
            INSERT INTO applications (
                id, account_id, application_type, application_no,
                application_date, place, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&application.id)
        .bind(&application.account_id)
        .bind(application.application_type)
        .bind(&application.application_no)
        .bind(application.application_date)
        .bind(&application.place)
        .bind(application.status)
        .bind(application.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(application_no = %application.application_no, "Application submitted");
        Ok(application)
    }

    /// Lists the customer's applications, newest first.
    pub async fn list_by_mobile(&self, mobile: &str) -> DbResult<Vec<Application>> {
        let mut conn = self.pool.acquire().await?;
        let account_id = account_id_by_mobile(&mut conn, mobile).await?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM applications
            WHERE account_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(&account_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(map_application).collect()
    }

    /// Gets an application by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Application>> {
        let row = sqlx::query("SELECT * FROM applications WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_application).transpose()
    }

    /// Moves an application to a new status.
    pub async fn update_status(&self, id: &str, status: ApplicationStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Updating application status");

        let result = sqlx::query("UPDATE applications SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Application", id));
        }

        Ok(())
    }

    // =========================================================================
    // Pledge Details
    // =========================================================================

    /// Records pledge details on the customer's latest PLEDGE_RELEASE
    /// application.
    ///
    /// ## Errors
    /// * `DbError::Conflict` - no pledge-release application, or details
    ///   were already recorded for it
    pub async fn create_pledge_details(
        &self,
        req: &PledgeDetailsCreateRequest,
    ) -> DbResult<PledgeDetails> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;
        let account_id = account_id_by_mobile(&mut tx, &req.mobile).await?;

        let application_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM applications
            WHERE account_id = ?1 AND application_type = ?2
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(&account_id)
        .bind(ApplicationType::PledgeRelease)
        .fetch_optional(&mut *tx)
        .await?;

        let application_id = application_id
            .ok_or_else(|| DbError::conflict("No PLEDGE_RELEASE application found"))?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM pledge_details WHERE application_id = ?1")
                .bind(&application_id)
                .fetch_optional(&mut *tx)
                .await?;

        if existing.is_some() {
            return Err(DbError::conflict("Pledge details already exist"));
        }

        let pledge = PledgeDetails {
            id: new_id(),
            application_id,
            pledger_name: req.pledger_name.clone(),
            pledger_address: req.pledger_address.clone(),
            financier_name: req.financier_name.clone(),
            branch_name: req.branch_name.clone(),
            gold_loan_account_no: req.gold_loan_account_no.clone(),
            authorized_person: req.authorized_person.clone(),
            principal_amount: req.principal_amount,
            interest_amount: req.interest_amount,
            total_due: req.total_due,
            cheque_no: req.cheque_no.clone(),
            cheque_date: req.cheque_date,
            margin_percentage: req.margin_percentage,
            created_at: Utc::now(),
        };

        debug!(application_id = %pledge.application_id, "Saving pledge details");

        sqlx::query(
            r#"
            INSERT INTO pledge_details (
                id, application_id,
                pledger_name, pledger_address,
                financier_name, branch_name,
                gold_loan_account_no, authorized_person,
                principal_amount, interest_amount, total_due,
                cheque_no, cheque_date, margin_percentage,
                created_at
            ) VALUES (
                ?1, ?2,
                ?3, ?4,
                ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15
            )
            "#,
        )
        .bind(&pledge.id)
        .bind(&pledge.application_id)
        .bind(&pledge.pledger_name)
        .bind(&pledge.pledger_address)
        .bind(&pledge.financier_name)
        .bind(&pledge.branch_name)
        .bind(&pledge.gold_loan_account_no)
        .bind(&pledge.authorized_person)
        .bind(optional_decimal_text(pledge.principal_amount))
        .bind(optional_decimal_text(pledge.interest_amount))
        .bind(optional_decimal_text(pledge.total_due))
        .bind(&pledge.cheque_no)
        .bind(pledge.cheque_date)
        .bind(optional_decimal_text(pledge.margin_percentage))
        .bind(pledge.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(pledge)
    }

    /// Gets the pledge details of an application.
    pub async fn get_pledge_details(&self, application_id: &str) -> DbResult<Option<PledgeDetails>> {
        let row = sqlx::query("SELECT * FROM pledge_details WHERE application_id = ?1")
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_pledge_details).transpose()
    }

    // =========================================================================
    // Ornaments
    // =========================================================================

    /// Records ornaments on the customer's latest active application.
    ///
    /// ## What This Does (one transaction)
    /// 1. Finds the latest SUBMITTED/APPROVED application
    /// 2. Inserts every ornament
    /// 3. Recomputes `total_quantity` and `total_weight_gms` (3 dp) over all
    ///    of the application's ornaments; a missing weight counts as zero
    ///
    /// ## Errors
    /// * `DbError::Conflict` - no active application
    pub async fn add_ornaments(&self, req: &OrnamentCreateRequest) -> DbResult<OrnamentSummary> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;
        let account_id = account_id_by_mobile(&mut tx, &req.mobile).await?;

        let application = latest_active_application(&mut tx, &account_id)
            .await?
            .ok_or_else(|| DbError::conflict("No active application"))?;

        let now = Utc::now();
        for item in &req.ornaments {
            debug!(application_id = %application.id, item_name = %item.item_name, "Adding ornament");

            sqlx::query(
                r#"
                INSERT INTO ornaments (
                    id, application_id, item_name, quantity,
                    purity_percentage, approx_weight_gms, item_photo_url, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(new_id())
            .bind(&application.id)
            .bind(&item.item_name)
            .bind(item.quantity)
            .bind(optional_decimal_text(item.purity_percentage))
            .bind(optional_decimal_text(item.approx_weight_gms))
            .bind(&item.item_photo_url)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        let rows = sqlx::query(
            "SELECT quantity, approx_weight_gms FROM ornaments WHERE application_id = ?1",
        )
        .bind(&application.id)
        .fetch_all(&mut *tx)
        .await?;

        let mut total_quantity: i64 = 0;
        let mut total_weight = Decimal::ZERO;
        for row in &rows {
            let quantity: i64 = row.try_get("quantity")?;
            total_quantity += quantity;
            if let Some(weight) = optional_decimal_column(row, "approx_weight_gms")? {
                total_weight = total_weight
                    .checked_add(weight)
                    .ok_or_else(|| DbError::Internal("ornament weight total overflowed".to_string()))?;
            }
        }
        let total_weight_gms = round_weight_3dp(total_weight);

        sqlx::query(
            r#"
            UPDATE applications
            SET total_quantity = ?2, total_weight_gms = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&application.id)
        .bind(total_quantity)
        .bind(total_weight_gms.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            application_no = %application.application_no,
            added = req.ornaments.len(),
            total_quantity,
            total_weight_gms = %total_weight_gms,
            "Ornaments recorded"
        );

        Ok(OrnamentSummary {
            application_id: application.id,
            application_no: application.application_no,
            ornaments_added: req.ornaments.len(),
            total_quantity,
            total_weight_gms,
            status: application.status,
        })
    }

    /// Lists an application's ornaments in insertion order.
    pub async fn list_ornaments(&self, application_id: &str) -> DbResult<Vec<Ornament>> {
        let rows = sqlx::query("SELECT * FROM ornaments WHERE application_id = ?1 ORDER BY rowid")
            .bind(application_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_ornament).collect()
    }
}

// =============================================================================
// Shared Queries
// =============================================================================

/// Finds the account's most recent SUBMITTED or APPROVED application.
pub(crate) async fn latest_active_application(
    conn: &mut SqliteConnection,
    account_id: &str,
) -> DbResult<Option<Application>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM applications
        WHERE account_id = ?1
          AND status IN ('SUBMITTED', 'APPROVED')
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(account_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(map_application).transpose()
}

// =============================================================================
// Row Mapping
// =============================================================================

pub(crate) fn map_application(row: &SqliteRow) -> DbResult<Application> {
    Ok(Application {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        application_type: row.try_get("application_type")?,
        application_no: row.try_get("application_no")?,
        application_date: row.try_get("application_date")?,
        place: row.try_get("place")?,
        status: row.try_get("status")?,
        total_quantity: row.try_get("total_quantity")?,
        total_weight_gms: optional_decimal_column(row, "total_weight_gms")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_pledge_details(row: &SqliteRow) -> DbResult<PledgeDetails> {
    Ok(PledgeDetails {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        pledger_name: row.try_get("pledger_name")?,
        pledger_address: row.try_get("pledger_address")?,
        financier_name: row.try_get("financier_name")?,
        branch_name: row.try_get("branch_name")?,
        gold_loan_account_no: row.try_get("gold_loan_account_no")?,
        authorized_person: row.try_get("authorized_person")?,
        principal_amount: optional_decimal_column(row, "principal_amount")?,
        interest_amount: optional_decimal_column(row, "interest_amount")?,
        total_due: optional_decimal_column(row, "total_due")?,
        cheque_no: row.try_get("cheque_no")?,
        cheque_date: row.try_get("cheque_date")?,
        margin_percentage: optional_decimal_column(row, "margin_percentage")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_ornament(row: &SqliteRow) -> DbResult<Ornament> {
    Ok(Ornament {
        id: row.try_get("id")?,
        application_id: row.try_get("application_id")?,
        item_name: row.try_get("item_name")?,
        quantity: row.try_get("quantity")?,
        purity_percentage: optional_decimal_column(row, "purity_percentage")?,
        approx_weight_gms: optional_decimal_column(row, "approx_weight_gms")?,
        item_photo_url: row.try_get("item_photo_url")?,
        created_at: row.try_get("created_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use rust_decimal_macros::dec;
    use svs_core::requests::{AccountCreateRequest, OrnamentItemRequest};
    use svs_core::AccountType;

    const MOBILE: &str = "9876543210";

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts()
            .create(&AccountCreateRequest {
                account_type: AccountType::Customer,
                account_code: Some("CUST-1002".to_string()),
                first_name: "Pavan".to_string(),
                last_name: "Gentela".to_string(),
                mobile: MOBILE.to_string(),
                email: None,
                phone: None,
                pan_no: None,
                city: None,
                state: None,
                pincode: None,
                address_text: None,
            })
            .await
            .unwrap();
        db
    }

    fn application_request(
        application_type: ApplicationType,
        application_no: Option<&str>,
    ) -> ApplicationCreateRequest {
        ApplicationCreateRequest {
            mobile: MOBILE.to_string(),
            application_type,
            application_date: None,
            application_no: application_no.map(str::to_string),
            place: Some("Hyderabad".to_string()),
        }
    }

    fn ornament(name: &str, quantity: i64, weight: Option<Decimal>) -> OrnamentItemRequest {
        OrnamentItemRequest {
            item_name: name.to_string(),
            quantity,
            purity_percentage: Some(dec!(91.6)),
            approx_weight_gms: weight,
            item_photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_application_generates_number() {
        let db = setup().await;
        let app = db
            .applications()
            .create(&application_request(ApplicationType::DirectBuying, None))
            .await
            .unwrap();

        assert!(app.application_no.starts_with("APP-"));
        assert_eq!(app.status, ApplicationStatus::Submitted);

        let stored = db.applications().get_by_id(&app.id).await.unwrap().unwrap();
        assert_eq!(stored.application_no, app.application_no);
        assert_eq!(stored.application_type, ApplicationType::DirectBuying);
    }

    #[tokio::test]
    async fn test_duplicate_active_application_rejected() {
        let db = setup().await;
        let repo = db.applications();
        let req = application_request(ApplicationType::DirectBuying, Some("APP-001"));

        let first = repo.create(&req).await.unwrap();
        let err = repo.create(&req).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        // Once closed, the number may be reused
        repo.update_status(&first.id, ApplicationStatus::Closed)
            .await
            .unwrap();
        assert!(repo.create(&req).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = setup().await;
        let repo = db.applications();
        repo.create(&application_request(ApplicationType::DirectBuying, Some("APP-001")))
            .await
            .unwrap();
        repo.create(&application_request(ApplicationType::PledgeRelease, Some("APP-002")))
            .await
            .unwrap();

        let apps = repo.list_by_mobile(MOBILE).await.unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0].application_no, "APP-002");
        assert_eq!(apps[1].application_no, "APP-001");
    }

    #[tokio::test]
    async fn test_update_status_unknown_id() {
        let db = setup().await;
        let err = db
            .applications()
            .update_status("missing", ApplicationStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_pledge_details_once_per_application() {
        let db = setup().await;
        let repo = db.applications();

        let req = PledgeDetailsCreateRequest {
            mobile: MOBILE.to_string(),
            financier_name: Some("Muthoot".to_string()),
            principal_amount: Some(dec!(150000.00)),
            margin_percentage: Some(dec!(75)),
            ..Default::default()
        };

        // No pledge-release application yet
        let err = repo.create_pledge_details(&req).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let app = repo
            .create(&application_request(ApplicationType::PledgeRelease, None))
            .await
            .unwrap();
        let pledge = repo.create_pledge_details(&req).await.unwrap();
        assert_eq!(pledge.application_id, app.id);

        let err = repo.create_pledge_details(&req).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let stored = repo.get_pledge_details(&app.id).await.unwrap().unwrap();
        assert_eq!(stored.principal_amount, Some(dec!(150000.00)));
        assert_eq!(stored.margin_percentage, Some(dec!(75)));
    }

    #[tokio::test]
    async fn test_ornaments_require_active_application() {
        let db = setup().await;
        let req = OrnamentCreateRequest {
            mobile: MOBILE.to_string(),
            ornaments: vec![ornament("Chain", 1, Some(dec!(10.5)))],
        };

        let err = db.applications().add_ornaments(&req).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_ornament_totals() {
        let db = setup().await;
        let repo = db.applications();
        let app = repo
            .create(&application_request(ApplicationType::DirectBuying, None))
            .await
            .unwrap();

        let summary = repo
            .add_ornaments(&OrnamentCreateRequest {
                mobile: MOBILE.to_string(),
                ornaments: vec![
                    ornament("Chain", 1, Some(dec!(10.1234))),
                    ornament("Ring", 2, None),
                    ornament("Bangle", 2, Some(dec!(20.0001))),
                ],
            })
            .await
            .unwrap();

        assert_eq!(summary.application_id, app.id);
        assert_eq!(summary.ornaments_added, 3);
        assert_eq!(summary.total_quantity, 5);
        // 30.1235 → 30.124
        assert_eq!(summary.total_weight_gms, dec!(30.124));

        // A second batch accumulates
        let summary = repo
            .add_ornaments(&OrnamentCreateRequest {
                mobile: MOBILE.to_string(),
                ornaments: vec![ornament("Earring", 2, Some(dec!(4)))],
            })
            .await
            .unwrap();
        assert_eq!(summary.total_quantity, 7);
        assert_eq!(summary.total_weight_gms, dec!(34.124));

        let stored = repo.get_by_id(&app.id).await.unwrap().unwrap();
        assert_eq!(stored.total_quantity, Some(7));
        assert_eq!(stored.total_weight_gms.unwrap().to_string(), "34.124");
        assert_eq!(repo.list_ornaments(&app.id).await.unwrap().len(), 4);
    }
}
