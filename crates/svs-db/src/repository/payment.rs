//! # Payment Repository
//!
//! Invoices raised against estimations, and the money that settles them.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Payment Flow                                   │
//! │                                                                         │
//! │  1. INVOICE                                                            │
//! │     └── create_invoice() → PaymentInvoice { PENDING }                  │
//! │         (latest application that has an estimation; estimation is      │
//! │          marked INVOICED)                                              │
//! │                                                                         │
//! │  2. ITEMISE                                                            │
//! │     └── add_invoice_item()  melted weights, amounts                    │
//! │     └── add_deduction()     per-item deductions                        │
//! │                                                                         │
//! │  3. SETTLE                                                             │
//! │     └── add_settlement() → status recomputed from Σ paid               │
//! │           Σ paid = 0          → PENDING                                │
//! │           0 < Σ paid < total  → PARTIAL                                │
//! │           Σ paid ≥ total      → PAID                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use svs_core::requests::{
    InvoiceItemCreateRequest, PaymentDeductionCreateRequest, PaymentInvoiceCreateRequest,
    PaymentSettlementCreateRequest,
};
use svs_core::{InvoiceItem, PaymentDeduction, PaymentInvoice, PaymentSettlement, PaymentStatus};

use super::estimation::mark_invoiced;
use super::{
    account_id_by_mobile, decimal_column, decimal_text, new_id, optional_decimal_column,
    optional_decimal_text, sum_decimals,
};
use crate::error::{DbError, DbResult};

/// Result of recording a settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub settlement: PaymentSettlement,
    /// Sum of every settlement on the invoice, this one included.
    pub total_paid: Decimal,
    pub payment_status: PaymentStatus,
}

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    /// Raises an invoice on the customer's latest estimated application.
    ///
    /// ## Errors
    /// * `DbError::Conflict` - no application with an estimation
    /// * `DbError::UniqueViolation` - invoice number already used
    pub async fn create_invoice(&self, req: &PaymentInvoiceCreateRequest) -> DbResult<PaymentInvoice> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;
        let account_id = account_id_by_mobile(&mut tx, &req.mobile).await?;

        let row = sqlx::query(
            r#"
            SELECT a.id AS application_id, e.id AS estimation_id
            FROM applications a
            JOIN estimations e ON e.application_id = a.id
            WHERE a.account_id = ?1
            ORDER BY a.created_at DESC, a.rowid DESC
            LIMIT 1
            "#,
        )
        .bind(&account_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::conflict("No application/estimation found"))?;

        let invoice = PaymentInvoice {
            id: new_id(),
            invoice_no: req.invoice_no.clone(),
            account_id,
            application_id: row.try_get("application_id")?,
            estimation_id: row.try_get("estimation_id")?,
            invoice_date: req.invoice_date,
            total_net_amount: req.total_net_amount,
            amount_in_words: req.amount_in_words.clone(),
            remarks: req.remarks.clone(),
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };

        debug!(
            id = %invoice.id,
            invoice_no = %invoice.invoice_no,
            estimation_id = %invoice.estimation_id,
            "Creating invoice"
        );

        sqlx::query(
            r#"
            INSERT INTO payment_invoices (
                id, invoice_no, account_id, application_id, estimation_id,
                invoice_date, total_net_amount, amount_in_words, remarks,
                payment_status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_no)
        .bind(&invoice.account_id)
        .bind(&invoice.application_id)
        .bind(&invoice.estimation_id)
        .bind(invoice.invoice_date)
        .bind(decimal_text(invoice.total_net_amount))
        .bind(&invoice.amount_in_words)
        .bind(&invoice.remarks)
        .bind(invoice.payment_status)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, invoice.invoice_no.clone())
            }
            other => other,
        })?;

        mark_invoiced(&mut tx, &invoice.estimation_id).await?;

        tx.commit().await?;

        info!(invoice_no = %invoice.invoice_no, total = %invoice.total_net_amount, "Invoice created");
        Ok(invoice)
    }

    /// Gets an invoice by ID.
    pub async fn get_invoice(&self, id: &str) -> DbResult<Option<PaymentInvoice>> {
        let row = sqlx::query("SELECT * FROM payment_invoices WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_invoice).transpose()
    }

    // =========================================================================
    // Invoice Items & Deductions
    // =========================================================================

    /// Adds a line to the customer's latest invoice.
    ///
    /// ## Errors
    /// * `DbError::Conflict` - the customer has no invoice
    pub async fn add_invoice_item(&self, req: &InvoiceItemCreateRequest) -> DbResult<InvoiceItem> {
        req.validate()?;

        let mut conn = self.pool.acquire().await?;
        let account_id = account_id_by_mobile(&mut conn, &req.mobile).await?;
        let invoice = latest_invoice(&mut conn, &account_id)
            .await?
            .ok_or_else(|| DbError::conflict("No invoice found"))?;

        let item = InvoiceItem {
            id: new_id(),
            invoice_id: invoice.id,
            item_name: req.item_name.clone(),
            weight_before_melting: req.weight_before_melting,
            weight_after_melting: req.weight_after_melting,
            purity_after_melting: req.purity_after_melting,
            gold_rate_per_gm: req.gold_rate_per_gm,
            gross_amount: req.gross_amount,
            deductions_amount: req.deductions_amount,
            net_amount: req.net_amount,
            created_at: Utc::now(),
        };

        if let (Some(before), Some(after)) = (item.weight_before_melting, item.weight_after_melting) {
            if after > before {
                warn!(
                    invoice_no = %invoice.invoice_no,
                    item_name = %item.item_name,
                    before = %before,
                    after = %after,
                    "Weight after melting exceeds weight before melting"
                );
            }
        }

        debug!(invoice_id = %item.invoice_id, item_name = %item.item_name, "Adding invoice item");

        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                id, invoice_id, item_name,
                weight_before_melting, weight_after_melting, purity_after_melting,
                gold_rate_per_gm, gross_amount, deductions_amount, net_amount,
                created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.invoice_id)
        .bind(&item.item_name)
        .bind(optional_decimal_text(item.weight_before_melting))
        .bind(optional_decimal_text(item.weight_after_melting))
        .bind(optional_decimal_text(item.purity_after_melting))
        .bind(optional_decimal_text(item.gold_rate_per_gm))
        .bind(decimal_text(item.gross_amount))
        .bind(decimal_text(item.deductions_amount))
        .bind(decimal_text(item.net_amount))
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Lists an invoice's items in insertion order.
    pub async fn list_invoice_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let rows = sqlx::query("SELECT * FROM invoice_items WHERE invoice_id = ?1 ORDER BY rowid")
            .bind(invoice_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_invoice_item).collect()
    }

    /// Records a deduction against an invoice item.
    ///
    /// ## Errors
    /// * `DbError::ForeignKeyViolation` - unknown invoice item
    pub async fn add_deduction(&self, req: &PaymentDeductionCreateRequest) -> DbResult<PaymentDeduction> {
        req.validate()?;

        let deduction = PaymentDeduction {
            id: new_id(),
            invoice_item_id: req.invoice_item_id.clone(),
            deduction_type: req.deduction_type.clone(),
            deduction_amount: req.deduction_amount,
            created_at: Utc::now(),
        };

        debug!(
            invoice_item_id = %deduction.invoice_item_id,
            deduction_type = %deduction.deduction_type,
            amount = %deduction.deduction_amount,
            "Adding deduction"
        );

        sqlx::query(
            r#"
            INSERT INTO payment_deductions (
                id, invoice_item_id, deduction_type, deduction_amount, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&deduction.id)
        .bind(&deduction.invoice_item_id)
        .bind(&deduction.deduction_type)
        .bind(decimal_text(deduction.deduction_amount))
        .bind(deduction.created_at)
        .execute(&self.pool)
        .await?;

        Ok(deduction)
    }

    /// Lists the deductions recorded against an invoice item.
    pub async fn list_deductions(&self, invoice_item_id: &str) -> DbResult<Vec<PaymentDeduction>> {
        let rows = sqlx::query(
            "SELECT * FROM payment_deductions WHERE invoice_item_id = ?1 ORDER BY rowid",
        )
        .bind(invoice_item_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DbResult<PaymentDeduction> {
                Ok(PaymentDeduction {
                    id: row.try_get("id")?,
                    invoice_item_id: row.try_get("invoice_item_id")?,
                    deduction_type: row.try_get("deduction_type")?,
                    deduction_amount: decimal_column(row, "deduction_amount")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    // =========================================================================
    // Settlements
    // =========================================================================

    /// Records a payment against the customer's latest invoice and
    /// recomputes the invoice's payment status.
    ///
    /// ## Errors
    /// * `DbError::Conflict` - the customer has no invoice
    pub async fn add_settlement(
        &self,
        req: &PaymentSettlementCreateRequest,
    ) -> DbResult<SettlementReceipt> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;
        let account_id = account_id_by_mobile(&mut tx, &req.mobile).await?;
        let invoice = latest_invoice(&mut tx, &account_id)
            .await?
            .ok_or_else(|| DbError::conflict("No invoice found"))?;

        let settlement = PaymentSettlement {
            id: new_id(),
            invoice_id: invoice.id.clone(),
            payment_mode: req.payment_mode,
            paid_amount: req.paid_amount,
            reference_no: req.reference_no.clone(),
            bank_name: req.bank_name.clone(),
            payment_date: req.payment_date,
            created_at: Utc::now(),
        };

        debug!(
            invoice_no = %invoice.invoice_no,
            payment_mode = %settlement.payment_mode,
            paid_amount = %settlement.paid_amount,
            "Recording settlement"
        );

        sqlx::query(
            r#"
            INSERT INTO payment_settlements (
                id, invoice_id, payment_mode, paid_amount,
                reference_no, bank_name, payment_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&settlement.id)
        .bind(&settlement.invoice_id)
        .bind(settlement.payment_mode)
        .bind(decimal_text(settlement.paid_amount))
        .bind(&settlement.reference_no)
        .bind(&settlement.bank_name)
        .bind(settlement.payment_date)
        .bind(settlement.created_at)
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query("SELECT paid_amount FROM payment_settlements WHERE invoice_id = ?1")
            .bind(&invoice.id)
            .fetch_all(&mut *tx)
            .await?;
        let total_paid = sum_decimals(&rows, "paid_amount")?;
        let payment_status = PaymentStatus::from_paid(total_paid, invoice.total_net_amount);

        sqlx::query("UPDATE payment_invoices SET payment_status = ?2 WHERE id = ?1")
            .bind(&invoice.id)
            .bind(payment_status)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if total_paid > invoice.total_net_amount {
            warn!(
                invoice_no = %invoice.invoice_no,
                total_paid = %total_paid,
                invoice_total = %invoice.total_net_amount,
                "Invoice overpaid"
            );
        }

        info!(
            invoice_no = %invoice.invoice_no,
            total_paid = %total_paid,
            payment_status = %payment_status,
            "Settlement recorded"
        );

        Ok(SettlementReceipt {
            settlement,
            total_paid,
            payment_status,
        })
    }

    /// Lists an invoice's settlements in insertion order.
    pub async fn list_settlements(&self, invoice_id: &str) -> DbResult<Vec<PaymentSettlement>> {
        let rows = sqlx::query(
            "SELECT * FROM payment_settlements WHERE invoice_id = ?1 ORDER BY rowid",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DbResult<PaymentSettlement> {
                Ok(PaymentSettlement {
                    id: row.try_get("id")?,
                    invoice_id: row.try_get("invoice_id")?,
                    payment_mode: row.try_get("payment_mode")?,
                    paid_amount: decimal_column(row, "paid_amount")?,
                    reference_no: row.try_get("reference_no")?,
                    bank_name: row.try_get("bank_name")?,
                    payment_date: row.try_get("payment_date")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

// =============================================================================
// Shared Queries
// =============================================================================

async fn latest_invoice(
    conn: &mut SqliteConnection,
    account_id: &str,
) -> DbResult<Option<PaymentInvoice>> {
    let row = sqlx::query(
        r#"
        SELECT * FROM payment_invoices
        WHERE account_id = ?1
        ORDER BY created_at DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(account_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(map_invoice).transpose()
}

// =============================================================================
// Row Mapping
// =============================================================================

fn map_invoice(row: &SqliteRow) -> DbResult<PaymentInvoice> {
    Ok(PaymentInvoice {
        id: row.try_get("id")?,
        invoice_no: row.try_get("invoice_no")?,
        account_id: row.try_get("account_id")?,
        application_id: row.try_get("application_id")?,
        estimation_id: row.try_get("estimation_id")?,
        invoice_date: row.try_get("invoice_date")?,
        total_net_amount: decimal_column(row, "total_net_amount")?,
        amount_in_words: row.try_get("amount_in_words")?,
        remarks: row.try_get("remarks")?,
        payment_status: row.try_get("payment_status")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_invoice_item(row: &SqliteRow) -> DbResult<InvoiceItem> {
    Ok(InvoiceItem {
        id: row.try_get("id")?,
        invoice_id: row.try_get("invoice_id")?,
        item_name: row.try_get("item_name")?,
        weight_before_melting: optional_decimal_column(row, "weight_before_melting")?,
        weight_after_melting: optional_decimal_column(row, "weight_after_melting")?,
        purity_after_melting: optional_decimal_column(row, "purity_after_melting")?,
        gold_rate_per_gm: optional_decimal_column(row, "gold_rate_per_gm")?,
        gross_amount: decimal_column(row, "gross_amount")?,
        deductions_amount: decimal_column(row, "deductions_amount")?,
        net_amount: decimal_column(row, "net_amount")?,
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
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use svs_core::requests::{
        AccountCreateRequest, ApplicationCreateRequest, EstimationItemCreateRequest,
    };
    use svs_core::{AccountType, ApplicationType, EstimationStatus, PaymentMode};

    const MOBILE: &str = "9876543210";

    async fn setup(with_estimation: bool) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts()
            .create(&AccountCreateRequest {
                account_type: AccountType::Customer,
                account_code: None,
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
        db.applications()
            .create(&ApplicationCreateRequest {
                mobile: MOBILE.to_string(),
                application_type: ApplicationType::DirectBuying,
                application_date: None,
                application_no: None,
                place: None,
            })
            .await
            .unwrap();

        if with_estimation {
            db.estimations()
                .add_item(&EstimationItemCreateRequest {
                    mobile: MOBILE.to_string(),
                    item_name: "Bangle".to_string(),
                    quantity: 1,
                    estimation_no: None,
                    gross_weight_gms: dec!(10.000),
                    stone_weight_gms: dec!(1.000),
                    purity_percentage: dec!(91.6),
                    gold_rate_per_gm: dec!(6000.00),
                    deduction_percentage: dec!(2),
                })
                .await
                .unwrap();
        }
        db
    }

    fn invoice_request(invoice_no: &str) -> PaymentInvoiceCreateRequest {
        PaymentInvoiceCreateRequest {
            mobile: MOBILE.to_string(),
            invoice_no: invoice_no.to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            total_net_amount: dec!(48451.20),
            amount_in_words: Some("Forty eight thousand four hundred fifty one and twenty paise".to_string()),
            remarks: None,
        }
    }

    fn settlement(amount: Decimal) -> PaymentSettlementCreateRequest {
        PaymentSettlementCreateRequest {
            mobile: MOBILE.to_string(),
            payment_mode: PaymentMode::Neft,
            paid_amount: amount,
            reference_no: Some("UTR0001".to_string()),
            bank_name: None,
            payment_date: None,
        }
    }

    fn invoice_item() -> InvoiceItemCreateRequest {
        InvoiceItemCreateRequest {
            mobile: MOBILE.to_string(),
            item_name: "Bangle".to_string(),
            weight_before_melting: Some(dec!(9.00)),
            weight_after_melting: Some(dec!(8.90)),
            purity_after_melting: Some(dec!(91.2)),
            gold_rate_per_gm: Some(dec!(6000.00)),
            gross_amount: dec!(48700.80),
            deductions_amount: dec!(249.60),
            net_amount: dec!(48451.20),
        }
    }

    #[tokio::test]
    async fn test_invoice_requires_estimation() {
        let db = setup(false).await;
        let err = db
            .payments()
            .create_invoice(&invoice_request("INV-001"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_invoice_marks_estimation_invoiced() {
        let db = setup(true).await;
        let invoice = db
            .payments()
            .create_invoice(&invoice_request("INV-001"))
            .await
            .unwrap();
        assert_eq!(invoice.payment_status, PaymentStatus::Pending);

        let estimation = db
            .estimations()
            .get_by_id(&invoice.estimation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(estimation.status, EstimationStatus::Invoiced);

        let stored = db.payments().get_invoice(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.total_net_amount, dec!(48451.20));
        assert_eq!(stored.invoice_date, NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_invoice_number() {
        let db = setup(true).await;
        db.payments()
            .create_invoice(&invoice_request("INV-001"))
            .await
            .unwrap();

        let err = db
            .payments()
            .create_invoice(&invoice_request("INV-001"))
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "INV-001"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_items_and_deductions() {
        let db = setup(true).await;
        let payments = db.payments();

        let err = payments.add_invoice_item(&invoice_item()).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let invoice = payments
            .create_invoice(&invoice_request("INV-001"))
            .await
            .unwrap();
        let item = payments.add_invoice_item(&invoice_item()).await.unwrap();
        assert_eq!(item.invoice_id, invoice.id);

        payments
            .add_deduction(&PaymentDeductionCreateRequest {
                invoice_item_id: item.id.clone(),
                deduction_type: "MELTING_LOSS".to_string(),
                deduction_amount: dec!(249.60),
            })
            .await
            .unwrap();

        let items = payments.list_invoice_items(&invoice.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].weight_after_melting, Some(dec!(8.90)));

        let deductions = payments.list_deductions(&item.id).await.unwrap();
        assert_eq!(deductions.len(), 1);
        assert_eq!(deductions[0].deduction_amount, dec!(249.60));
    }

    #[tokio::test]
    async fn test_deduction_for_unknown_item_is_fk_violation() {
        let db = setup(true).await;
        let err = db
            .payments()
            .add_deduction(&PaymentDeductionCreateRequest {
                invoice_item_id: uuid::Uuid::new_v4().to_string(),
                deduction_type: "MELTING_LOSS".to_string(),
                deduction_amount: dec!(10),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_settlements_move_status() {
        let db = setup(true).await;
        let payments = db.payments();

        let err = payments.add_settlement(&settlement(dec!(100))).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let invoice = payments
            .create_invoice(&invoice_request("INV-001"))
            .await
            .unwrap();

        let receipt = payments.add_settlement(&settlement(dec!(20000.00))).await.unwrap();
        assert_eq!(receipt.payment_status, PaymentStatus::Partial);
        assert_eq!(receipt.total_paid, dec!(20000.00));

        let receipt = payments.add_settlement(&settlement(dec!(28451.20))).await.unwrap();
        assert_eq!(receipt.payment_status, PaymentStatus::Paid);
        assert_eq!(receipt.total_paid, dec!(48451.20));

        let stored = payments.get_invoice(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(payments.list_settlements(&invoice.id).await.unwrap().len(), 2);
    }
}
