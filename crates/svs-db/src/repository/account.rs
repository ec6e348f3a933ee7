//! # Account Repository
//!
//! Customer accounts and the records hanging off them.
//!
//! ## Account Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  accounts (mobile UNIQUE, email UNIQUE, account_code UNIQUE)            │
//! │     │                                                                   │
//! │     ├── addresses          any number                                   │
//! │     ├── bank_accounts      any number, at most ONE is_primary           │
//! │     └── account_documents  metadata only, files live elsewhere          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use svs_core::requests::{
    AccountCheckRequest, AccountCreateRequest, AccountDocumentCreateRequest,
    AddressCreateRequest, BankAccountCreateRequest,
};
use svs_core::validation::validate_mobile;
use svs_core::{Account, AccountDocument, Address, BankAccount};

use super::{
    account_id_by_mobile, generate_code, new_id, optional_decimal_column, optional_decimal_text,
};
use crate::error::{DbError, DbResult};

/// Country recorded when an address omits one.
pub const DEFAULT_COUNTRY: &str = "India";

/// Outcome of an account existence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLookup {
    pub exists: bool,
    pub account_id: Option<String>,
    pub account_code: Option<String>,
}

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Checks whether an account exists for a mobile number or email.
    ///
    /// Either may be given; a match on either one counts. Both are
    /// compared trimmed, the way `create` stores them.
    pub async fn check(&self, req: &AccountCheckRequest) -> DbResult<AccountLookup> {
        req.validate()?;

        let row = sqlx::query(
            r#"
            SELECT id, account_code
            FROM accounts
            WHERE mobile = ?1 OR email = ?2
            LIMIT 1
            "#,
        )
        .bind(req.mobile.as_deref().map(str::trim))
        .bind(req.email.as_deref().map(str::trim))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(AccountLookup {
                exists: true,
                account_id: Some(row.try_get("id")?),
                account_code: Some(row.try_get("account_code")?),
            }),
            None => Ok(AccountLookup {
                exists: false,
                account_id: None,
                account_code: None,
            }),
        }
    }

    /// Creates an account.
    ///
    /// ## Account Code
    /// Uses the supplied code, or generates `CUST-XXXXXX` when absent.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - mobile, email or account code taken
    pub async fn create(&self, req: &AccountCreateRequest) -> DbResult<Account> {
        req.validate()?;

        let account = Account {
            id: new_id(),
            account_code: req
                .account_code
                .clone()
                .unwrap_or_else(|| generate_code("CUST")),
            account_type: req.account_type,
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            mobile: req.mobile.trim().to_string(),
            email: req.email.as_deref().map(|email| email.trim().to_string()),
            phone: req.phone.clone(),
            pan_no: req.pan_no.clone(),
            city: req.city.clone(),
            state: req.state.clone(),
            pincode: req.pincode.clone(),
            address_text: req.address_text.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %account.id, account_code = %account.account_code, "Creating account");

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, account_code, account_type,
                first_name, last_name,
                mobile, email, phone, pan_no,
                city, state, pincode, address_text,
                created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14
            )
            "#,
        )
        .bind(&account.id)
        .bind(&account.account_code)
        .bind(account.account_type)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.mobile)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.pan_no)
        .bind(&account.city)
        .bind(&account.state)
        .bind(&account.pincode)
        .bind(&account.address_text)
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_duplicate_value(e.into(), &account))?;

        info!(account_code = %account.account_code, "Account created");
        Ok(account)
    }

    /// Gets an account by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_account).transpose()
    }

    /// Gets an account by mobile number.
    pub async fn get_by_mobile(&self, mobile: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE mobile = ?1")
            .bind(mobile)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_account).transpose()
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Adds an address to the account registered under `mobile`.
    pub async fn add_address(&self, mobile: &str, req: &AddressCreateRequest) -> DbResult<Address> {
        validate_mobile(mobile)?;
        req.validate()?;

        let mut conn = self.pool.acquire().await?;
        let account_id = account_id_by_mobile(&mut conn, mobile).await?;

        let address = Address {
            id: new_id(),
            account_id,
            address_type: req.address_type.clone(),
            address_line: req.address_line.clone(),
            street: req.street.clone(),
            city: req.city.clone(),
            state: req.state.clone(),
            country: req
                .country
                .clone()
                .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            pincode: req.pincode.clone(),
            created_at: Utc::now(),
        };

        debug!(account_id = %address.account_id, address_type = %address.address_type, "Adding address");

        sqlx::query(
            r#"
            INSERT INTO addresses (
                id, account_id, address_type, address_line, street,
                city, state, country, pincode, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&address.id)
        .bind(&address.account_id)
        .bind(&address.address_type)
        .bind(&address.address_line)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.pincode)
        .bind(address.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(address)
    }

    /// Lists an account's addresses, oldest first.
    pub async fn list_addresses(&self, account_id: &str) -> DbResult<Vec<Address>> {
        let rows = sqlx::query(
            "SELECT * FROM addresses WHERE account_id = ?1 ORDER BY created_at, rowid",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_address).collect()
    }

    // =========================================================================
    // Bank Accounts
    // =========================================================================

    /// Adds a bank account.
    ///
    /// ## Primary Account
    /// When the new account is primary, any existing primary is demoted
    /// first, in the same transaction.
    pub async fn add_bank_account(
        &self,
        mobile: &str,
        req: &BankAccountCreateRequest,
    ) -> DbResult<BankAccount> {
        validate_mobile(mobile)?;
        req.validate()?;

        let mut tx = self.pool.begin().await?;
        let account_id = account_id_by_mobile(&mut tx, mobile).await?;

        if req.is_primary {
            let demoted = sqlx::query(
                "UPDATE bank_accounts SET is_primary = 0 WHERE account_id = ?1 AND is_primary = 1",
            )
            .bind(&account_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if demoted > 0 {
                debug!(account_id = %account_id, "Demoted previous primary bank account");
            }
        }

        let bank = BankAccount {
            id: new_id(),
            account_id,
            bank_name: req.bank_name.clone(),
            branch: req.branch.clone(),
            account_number: req.account_number.clone(),
            ifsc_code: req.ifsc_code.to_uppercase(),
            account_holder_name: req.account_holder_name.clone(),
            account_holder_type: req.account_holder_type.clone(),
            is_primary: req.is_primary,
            created_at: Utc::now(),
        };

        debug!(account_id = %bank.account_id, is_primary = bank.is_primary, "Adding bank account");

        sqlx::query(
            r#"
            INSERT INTO bank_accounts (
                id, account_id, bank_name, branch, account_number, ifsc_code,
                account_holder_name, account_holder_type, is_primary, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&bank.id)
        .bind(&bank.account_id)
        .bind(&bank.bank_name)
        .bind(&bank.branch)
        .bind(&bank.account_number)
        .bind(&bank.ifsc_code)
        .bind(&bank.account_holder_name)
        .bind(&bank.account_holder_type)
        .bind(bank.is_primary)
        .bind(bank.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(bank)
    }

    /// Lists an account's bank accounts, primary first.
    pub async fn list_bank_accounts(&self, account_id: &str) -> DbResult<Vec<BankAccount>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM bank_accounts
            WHERE account_id = ?1
            ORDER BY is_primary DESC, created_at, rowid
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_bank_account).collect()
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Records document metadata (the file itself is stored elsewhere).
    pub async fn add_document(
        &self,
        mobile: &str,
        req: &AccountDocumentCreateRequest,
    ) -> DbResult<AccountDocument> {
        validate_mobile(mobile)?;
        req.validate()?;

        let mut conn = self.pool.acquire().await?;
        let account_id = account_id_by_mobile(&mut conn, mobile).await?;

        let document = AccountDocument {
            id: new_id(),
            account_id,
            document_type: req.document_type.clone(),
            document_number: req.document_number.clone(),
            file_path: req.file_path.clone(),
            file_name: req.file_name.clone(),
            file_size_mb: req.file_size_mb,
            created_at: Utc::now(),
        };

        debug!(account_id = %document.account_id, document_type = %document.document_type, "Adding document");

        sqlx::query(
            r#"
            INSERT INTO account_documents (
                id, account_id, document_type, document_number,
                file_path, file_name, file_size_mb, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&document.id)
        .bind(&document.account_id)
        .bind(&document.document_type)
        .bind(&document.document_number)
        .bind(&document.file_path)
        .bind(&document.file_name)
        .bind(optional_decimal_text(document.file_size_mb))
        .bind(document.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(document)
    }

    /// Lists an account's documents, oldest first.
    pub async fn list_documents(&self, account_id: &str) -> DbResult<Vec<AccountDocument>> {
        let rows = sqlx::query(
            "SELECT * FROM account_documents WHERE account_id = ?1 ORDER BY created_at, rowid",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_document).collect()
    }
}

fn map_account(row: &SqliteRow) -> DbResult<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        account_code: row.try_get("account_code")?,
        account_type: row.try_get("account_type")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        mobile: row.try_get("mobile")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        pan_no: row.try_get("pan_no")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        pincode: row.try_get("pincode")?,
        address_text: row.try_get("address_text")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_address(row: &SqliteRow) -> DbResult<Address> {
    Ok(Address {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        address_type: row.try_get("address_type")?,
        address_line: row.try_get("address_line")?,
        street: row.try_get("street")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        country: row.try_get("country")?,
        pincode: row.try_get("pincode")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_bank_account(row: &SqliteRow) -> DbResult<BankAccount> {
    Ok(BankAccount {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        bank_name: row.try_get("bank_name")?,
        branch: row.try_get("branch")?,
        account_number: row.try_get("account_number")?,
        ifsc_code: row.try_get("ifsc_code")?,
        account_holder_name: row.try_get("account_holder_name")?,
        account_holder_type: row.try_get("account_holder_type")?,
        is_primary: row.try_get("is_primary")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_document(row: &SqliteRow) -> DbResult<AccountDocument> {
    Ok(AccountDocument {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        document_type: row.try_get("document_type")?,
        document_number: row.try_get("document_number")?,
        file_path: row.try_get("file_path")?,
        file_name: row.try_get("file_name")?,
        file_size_mb: optional_decimal_column(row, "file_size_mb")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Fills in the offending value of a unique violation on `accounts`.
fn with_duplicate_value(err: DbError, account: &Account) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } => {
            let value = match field.as_str() {
                "accounts.mobile" => account.mobile.clone(),
                "accounts.email" => account.email.clone().unwrap_or_default(),
                "accounts.account_code" => account.account_code.clone(),
                _ => "unknown".to_string(),
            };
            DbError::duplicate(field, value)
        }
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use rust_decimal_macros::dec;
    use svs_core::{AccountType, CoreError};

    async fn setup() -> AccountRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts()
    }

    fn account_request(mobile: &str, email: Option<&str>) -> AccountCreateRequest {
        AccountCreateRequest {
            account_type: AccountType::Customer,
            account_code: None,
            first_name: "Pavan".to_string(),
            last_name: "Gentela".to_string(),
            mobile: mobile.to_string(),
            email: email.map(str::to_string),
            phone: None,
            pan_no: None,
            city: Some("Hyderabad".to_string()),
            state: Some("Telangana".to_string()),
            pincode: None,
            address_text: None,
        }
    }

    fn bank_request(is_primary: bool) -> BankAccountCreateRequest {
        BankAccountCreateRequest {
            bank_name: "State Bank".to_string(),
            branch: None,
            account_number: "000123456789".to_string(),
            ifsc_code: "sbin0001234".to_string(),
            account_holder_name: "Pavan Gentela".to_string(),
            account_holder_type: None,
            is_primary,
        }
    }

    #[tokio::test]
    async fn test_create_and_check_account() {
        let repo = setup().await;

        let lookup = repo
            .check(&AccountCheckRequest {
                mobile: Some("9876543210".to_string()),
                email: None,
            })
            .await
            .unwrap();
        assert!(!lookup.exists);

        let account = repo
            .create(&account_request("9876543210", Some("pavan@example.com")))
            .await
            .unwrap();
        assert!(account.account_code.starts_with("CUST-"));
        assert_eq!(account.full_name(), "Pavan Gentela");

        // Email alone finds it too
        let lookup = repo
            .check(&AccountCheckRequest {
                mobile: None,
                email: Some("pavan@example.com".to_string()),
            })
            .await
            .unwrap();
        assert!(lookup.exists);
        assert_eq!(lookup.account_id.as_deref(), Some(account.id.as_str()));
        assert_eq!(lookup.account_code, Some(account.account_code.clone()));

        let stored = repo.get_by_mobile("9876543210").await.unwrap().unwrap();
        assert_eq!(stored.id, account.id);
        assert_eq!(stored.account_type, AccountType::Customer);
    }

    #[tokio::test]
    async fn test_check_requires_mobile_or_email() {
        let repo = setup().await;
        let err = repo.check(&AccountCheckRequest::default()).await.unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_duplicate_mobile_is_unique_violation() {
        let repo = setup().await;
        repo.create(&account_request("9876543210", None)).await.unwrap();

        let err = repo
            .create(&account_request("9876543210", None))
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "accounts.mobile");
                assert_eq!(value, "9876543210");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_mobile_is_not_found() {
        let repo = setup().await;
        let req = AddressCreateRequest {
            address_type: "HOME".to_string(),
            address_line: "1-2-3 Main Road".to_string(),
            street: None,
            city: "Hyderabad".to_string(),
            state: "Telangana".to_string(),
            country: None,
            pincode: None,
        };

        let err = repo.add_address("9000000000", &req).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_address_defaults_country() {
        let repo = setup().await;
        let account = repo.create(&account_request("9876543210", None)).await.unwrap();

        let req = AddressCreateRequest {
            address_type: "HOME".to_string(),
            address_line: "1-2-3 Main Road".to_string(),
            street: None,
            city: "Hyderabad".to_string(),
            state: "Telangana".to_string(),
            country: None,
            pincode: Some("500001".to_string()),
        };
        let address = repo.add_address("9876543210", &req).await.unwrap();
        assert_eq!(address.country, DEFAULT_COUNTRY);

        let listed = repo.list_addresses(&account.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].pincode.as_deref(), Some("500001"));
    }

    #[tokio::test]
    async fn test_single_primary_bank_account() {
        let repo = setup().await;
        let account = repo.create(&account_request("9876543210", None)).await.unwrap();

        let first = repo.add_bank_account("9876543210", &bank_request(true)).await.unwrap();
        assert_eq!(first.ifsc_code, "SBIN0001234");
        repo.add_bank_account("9876543210", &bank_request(false)).await.unwrap();
        let third = repo.add_bank_account("9876543210", &bank_request(true)).await.unwrap();

        let banks = repo.list_bank_accounts(&account.id).await.unwrap();
        assert_eq!(banks.len(), 3);
        assert_eq!(banks.iter().filter(|b| b.is_primary).count(), 1);
        assert_eq!(banks[0].id, third.id);
    }

    #[tokio::test]
    async fn test_document_metadata_round_trip() {
        let repo = setup().await;
        let account = repo.create(&account_request("9876543210", None)).await.unwrap();

        let req = AccountDocumentCreateRequest {
            document_type: "PAN".to_string(),
            document_number: Some("ABCDE1234F".to_string()),
            file_path: "/uploads/pan.pdf".to_string(),
            file_name: "pan.pdf".to_string(),
            file_size_mb: Some(dec!(1.25)),
        };
        repo.add_document("9876543210", &req).await.unwrap();

        let docs = repo.list_documents(&account.id).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_size_mb, Some(dec!(1.25)));
    }

    #[tokio::test]
    async fn test_padded_mobile_reaches_same_account() {
        let repo = setup().await;
        let account = repo
            .create(&account_request(" 9876543210 ", Some(" pavan@example.com ")))
            .await
            .unwrap();
        assert_eq!(account.mobile, "9876543210");
        assert_eq!(account.email.as_deref(), Some("pavan@example.com"));

        let lookup = repo
            .check(&AccountCheckRequest {
                mobile: Some(" 9876543210 ".to_string()),
                email: None,
            })
            .await
            .unwrap();
        assert!(lookup.exists);
        assert_eq!(lookup.account_id.as_deref(), Some(account.id.as_str()));

        let lookup = repo
            .check(&AccountCheckRequest {
                mobile: None,
                email: Some("pavan@example.com ".to_string()),
            })
            .await
            .unwrap();
        assert!(lookup.exists);

        let req = AddressCreateRequest {
            address_type: "HOME".to_string(),
            address_line: "1-2-3 Main Road".to_string(),
            street: None,
            city: "Hyderabad".to_string(),
            state: "Telangana".to_string(),
            country: None,
            pincode: None,
        };
        let address = repo.add_address(" 9876543210 ", &req).await.unwrap();
        assert_eq!(address.account_id, account.id);

        let err = repo
            .create(&account_request("9876543210", None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_malformed_mobile_rejected_before_lookup() {
        let repo = setup().await;
        repo.create(&account_request("9876543210", None)).await.unwrap();

        let address = AddressCreateRequest {
            address_type: "HOME".to_string(),
            address_line: "1-2-3 Main Road".to_string(),
            street: None,
            city: "Hyderabad".to_string(),
            state: "Telangana".to_string(),
            country: None,
            pincode: None,
        };
        let err = repo.add_address("98765-4321", &address).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = repo
            .add_bank_account("", &bank_request(true))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let document = AccountDocumentCreateRequest {
            document_type: "PAN".to_string(),
            document_number: None,
            file_path: "/uploads/pan.pdf".to_string(),
            file_name: "pan.pdf".to_string(),
            file_size_mb: None,
        };
        let err = repo.add_document("abc", &document).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }
}
