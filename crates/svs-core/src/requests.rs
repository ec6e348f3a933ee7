//! # Request Types
//!
//! Inputs to the record-keeping workflows, as the HTTP layer deserializes
//! them. Each request validates its own fields; lookups and database rules
//! are checked later by svs-db.
//!
//! Most workflows identify the customer by `mobile` rather than by id.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AccountType, ApplicationType, PaymentMode};
use crate::validation::{
    validate_account_lookup, validate_email, validate_estimation_input, validate_mobile,
    validate_name, validate_non_negative, validate_ornament, validate_ornament_count,
    validate_percentage, validate_positive, validate_quantity, validate_required, validate_uuid,
    ValidationResult,
};

// =============================================================================
// Accounts
// =============================================================================

/// Does an account exist for this mobile or email?
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountCheckRequest {
    pub mobile: Option<String>,
    pub email: Option<String>,
}

impl AccountCheckRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_account_lookup(self.mobile.as_deref(), self.email.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreateRequest {
    pub account_type: AccountType,
    /// Generated when absent.
    pub account_code: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub pan_no: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub address_text: Option<String>,
}

impl AccountCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        validate_mobile(&self.mobile)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(code) = &self.account_code {
            validate_required("account_code", code, 30)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressCreateRequest {
    pub address_type: String,
    pub address_line: String,
    pub street: Option<String>,
    pub city: String,
    pub state: String,
    /// Defaults to India.
    pub country: Option<String>,
    pub pincode: Option<String>,
}

impl AddressCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("address_type", &self.address_type, 30)?;
        validate_required("address_line", &self.address_line, 500)?;
        validate_required("city", &self.city, 100)?;
        validate_required("state", &self.state, 100)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccountCreateRequest {
    pub bank_name: String,
    pub branch: Option<String>,
    pub account_number: String,
    pub ifsc_code: String,
    pub account_holder_name: String,
    pub account_holder_type: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl BankAccountCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("bank_name", &self.bank_name, 100)?;
        validate_required("account_number", &self.account_number, 34)?;
        validate_required("ifsc_code", &self.ifsc_code, 11)?;
        validate_name("account_holder_name", &self.account_holder_name)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDocumentCreateRequest {
    pub document_type: String,
    pub document_number: Option<String>,
    pub file_path: String,
    pub file_name: String,
    pub file_size_mb: Option<Decimal>,
}

impl AccountDocumentCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("document_type", &self.document_type, 50)?;
        validate_required("file_path", &self.file_path, 1000)?;
        validate_required("file_name", &self.file_name, 255)?;
        if let Some(size) = self.file_size_mb {
            validate_non_negative("file_size_mb", size)?;
        }
        Ok(())
    }
}

// =============================================================================
// Applications
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationCreateRequest {
    pub mobile: String,
    pub application_type: ApplicationType,
    pub application_date: Option<NaiveDate>,
    /// Generated when absent.
    pub application_no: Option<String>,
    pub place: Option<String>,
}

impl ApplicationCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_mobile(&self.mobile)?;
        if let Some(no) = &self.application_no {
            validate_required("application_no", no, 50)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PledgeDetailsCreateRequest {
    pub mobile: String,
    pub pledger_name: Option<String>,
    pub pledger_address: Option<String>,
    pub financier_name: Option<String>,
    pub branch_name: Option<String>,
    pub gold_loan_account_no: Option<String>,
    pub authorized_person: Option<String>,
    pub principal_amount: Option<Decimal>,
    pub interest_amount: Option<Decimal>,
    pub total_due: Option<Decimal>,
    pub cheque_no: Option<String>,
    pub cheque_date: Option<NaiveDate>,
    pub margin_percentage: Option<Decimal>,
}

impl PledgeDetailsCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_mobile(&self.mobile)?;
        for (field, amount) in [
            ("principal_amount", self.principal_amount),
            ("interest_amount", self.interest_amount),
            ("total_due", self.total_due),
        ] {
            if let Some(amount) = amount {
                validate_non_negative(field, amount)?;
            }
        }
        if let Some(margin) = self.margin_percentage {
            validate_percentage("margin_percentage", margin)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrnamentItemRequest {
    pub item_name: String,
    pub quantity: i64,
    pub purity_percentage: Option<Decimal>,
    pub approx_weight_gms: Option<Decimal>,
    pub item_photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrnamentCreateRequest {
    pub mobile: String,
    pub ornaments: Vec<OrnamentItemRequest>,
}

impl OrnamentCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_mobile(&self.mobile)?;
        validate_ornament_count(self.ornaments.len())?;
        for item in &self.ornaments {
            validate_ornament(
                &item.item_name,
                item.quantity,
                item.purity_percentage,
                item.approx_weight_gms,
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Estimation
// =============================================================================

/// One item to value and attach to the customer's active application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationItemCreateRequest {
    pub mobile: String,
    pub item_name: String,
    pub quantity: i64,
    /// Only used when the estimation header is created by this request.
    pub estimation_no: Option<String>,
    pub gross_weight_gms: Decimal,
    #[serde(default)]
    pub stone_weight_gms: Decimal,
    pub purity_percentage: Decimal,
    pub gold_rate_per_gm: Decimal,
    #[serde(default)]
    pub deduction_percentage: Decimal,
}

impl EstimationItemCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_mobile(&self.mobile)?;
        validate_required("item_name", &self.item_name, 200)?;
        validate_quantity(self.quantity)?;
        validate_estimation_input(
            self.gross_weight_gms,
            self.stone_weight_gms,
            self.purity_percentage,
            self.gold_rate_per_gm,
            self.deduction_percentage,
        )
    }
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInvoiceCreateRequest {
    pub mobile: String,
    pub invoice_no: String,
    pub invoice_date: NaiveDate,
    pub total_net_amount: Decimal,
    pub amount_in_words: Option<String>,
    pub remarks: Option<String>,
}

impl PaymentInvoiceCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_mobile(&self.mobile)?;
        validate_required("invoice_no", &self.invoice_no, 50)?;
        validate_non_negative("total_net_amount", self.total_net_amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItemCreateRequest {
    pub mobile: String,
    pub item_name: String,
    pub weight_before_melting: Option<Decimal>,
    pub weight_after_melting: Option<Decimal>,
    pub purity_after_melting: Option<Decimal>,
    pub gold_rate_per_gm: Option<Decimal>,
    pub gross_amount: Decimal,
    #[serde(default)]
    pub deductions_amount: Decimal,
    pub net_amount: Decimal,
}

impl InvoiceItemCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_mobile(&self.mobile)?;
        validate_required("item_name", &self.item_name, 200)?;
        for (field, weight) in [
            ("weight_before_melting", self.weight_before_melting),
            ("weight_after_melting", self.weight_after_melting),
        ] {
            if let Some(weight) = weight {
                validate_non_negative(field, weight)?;
            }
        }
        if let Some(purity) = self.purity_after_melting {
            validate_percentage("purity_after_melting", purity)?;
        }
        validate_non_negative("gross_amount", self.gross_amount)?;
        validate_non_negative("deductions_amount", self.deductions_amount)?;
        validate_non_negative("net_amount", self.net_amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDeductionCreateRequest {
    pub invoice_item_id: String,
    pub deduction_type: String,
    pub deduction_amount: Decimal,
}

impl PaymentDeductionCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("invoice_item_id", &self.invoice_item_id)?;
        validate_required("deduction_type", &self.deduction_type, 50)?;
        validate_non_negative("deduction_amount", self.deduction_amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettlementCreateRequest {
    pub mobile: String,
    pub payment_mode: PaymentMode,
    pub paid_amount: Decimal,
    pub reference_no: Option<String>,
    pub bank_name: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

impl PaymentSettlementCreateRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_mobile(&self.mobile)?;
        validate_positive("paid_amount", self.paid_amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn estimation_request() -> EstimationItemCreateRequest {
        EstimationItemCreateRequest {
            mobile: "9876543210".to_string(),
            item_name: "Bangle".to_string(),
            quantity: 1,
            estimation_no: None,
            gross_weight_gms: dec!(10.000),
            stone_weight_gms: dec!(1.000),
            purity_percentage: dec!(91.6),
            gold_rate_per_gm: dec!(6000.00),
            deduction_percentage: dec!(2),
        }
    }

    #[test]
    fn test_estimation_request_validation() {
        assert!(estimation_request().validate().is_ok());

        let mut req = estimation_request();
        req.quantity = 0;
        assert!(req.validate().is_err());

        let mut req = estimation_request();
        req.deduction_percentage = dec!(120);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_estimation_request_defaults() {
        let req: EstimationItemCreateRequest = serde_json::from_str(
            r#"{
                "mobile": "9876543210",
                "item_name": "Chain",
                "quantity": 1,
                "gross_weight_gms": "12.5",
                "purity_percentage": "91.6",
                "gold_rate_per_gm": "6000"
            }"#,
        )
        .unwrap();

        assert_eq!(req.stone_weight_gms, Decimal::ZERO);
        assert_eq!(req.deduction_percentage, Decimal::ZERO);
        assert!(req.estimation_no.is_none());
    }

    #[test]
    fn test_account_check_requires_mobile_or_email() {
        assert!(AccountCheckRequest::default().validate().is_err());
        let req = AccountCheckRequest {
            mobile: Some("9876543210".to_string()),
            email: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_ornament_request_rejects_empty_list() {
        let req = OrnamentCreateRequest {
            mobile: "9876543210".to_string(),
            ornaments: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_settlement_requires_positive_amount() {
        let req = PaymentSettlementCreateRequest {
            mobile: "9876543210".to_string(),
            payment_mode: PaymentMode::Upi,
            paid_amount: Decimal::ZERO,
            reference_no: None,
            bank_name: None,
            payment_date: None,
        };
        assert!(req.validate().is_err());
    }
}
