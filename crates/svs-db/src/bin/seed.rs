//! # Seed Data Generator
//!
//! Walks one customer through the whole purchase workflow so a fresh
//! development database has something to look at.
//!
//! ## Usage
//! ```bash
//! # Seed ./svs_gold_dev.db
//! cargo run -p svs-db --bin seed
//!
//! # Specify database path
//! cargo run -p svs-db --bin seed -- --db ./data/svs_gold.db
//! ```
//!
//! ## Generated Records
//! ```text
//! Account CUST-1002 ──► Address ──► Bank account
//!       │
//!       ▼
//! Application (DIRECT_BUYING) ──► 2 ornaments
//!       │
//!       ▼
//! Estimation ──► 2 items ──► Invoice ──► Invoice item ──► Deduction
//!                                 │
//!                                 ▼
//!                       Settlement (UPI) ──► PAID
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use std::env;
use svs_core::requests::{
    AccountCheckRequest, AccountCreateRequest, AddressCreateRequest, ApplicationCreateRequest,
    BankAccountCreateRequest, EstimationItemCreateRequest, InvoiceItemCreateRequest,
    OrnamentCreateRequest, OrnamentItemRequest, PaymentDeductionCreateRequest,
    PaymentInvoiceCreateRequest, PaymentSettlementCreateRequest,
};
use svs_core::{AccountType, ApplicationType, PaymentMode};
use svs_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const SAMPLE_MOBILE: &str = "9876543210";

/// (item, quantity, gross g, stone g, purity %, rate per g, deduction %)
/// Decimals as (mantissa, scale).
type SampleItem = (&'static str, i64, (i64, u32), (i64, u32), (i64, u32), (i64, u32), (i64, u32));

const SAMPLE_ITEMS: &[SampleItem] = &[
    ("Bangle", 2, (10_000, 3), (1_000, 3), (916, 1), (600_000, 2), (2, 0)),
    ("Chain", 1, (5_000, 3), (0, 0), (916, 1), (600_000, 2), (0, 0)),
];

fn dec((mantissa, scale): (i64, u32)) -> Decimal {
    Decimal::new(mantissa, scale)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./svs_gold_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("SVS Gold Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./svs_gold_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("SVS Gold Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let lookup = db
        .accounts()
        .check(&AccountCheckRequest {
            mobile: Some(SAMPLE_MOBILE.to_string()),
            email: None,
        })
        .await?;
    if lookup.exists {
        println!("⚠ Sample account {:?} already exists", lookup.account_code);
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Onboarding
    let account = db
        .accounts()
        .create(&AccountCreateRequest {
            account_type: AccountType::Customer,
            account_code: Some("CUST-1002".to_string()),
            first_name: "Pavan".to_string(),
            last_name: "Gentela".to_string(),
            mobile: SAMPLE_MOBILE.to_string(),
            email: Some("pavan@example.com".to_string()),
            phone: None,
            pan_no: None,
            city: Some("Hyderabad".to_string()),
            state: Some("Telangana".to_string()),
            pincode: Some("500001".to_string()),
            address_text: None,
        })
        .await?;
    println!("✓ Account {} ({} {})", account.account_code, account.first_name, account.last_name);

    db.accounts()
        .add_address(
            SAMPLE_MOBILE,
            &AddressCreateRequest {
                address_type: "HOME".to_string(),
                address_line: "Plot 12, Road 3".to_string(),
                street: Some("Banjara Hills".to_string()),
                city: "Hyderabad".to_string(),
                state: "Telangana".to_string(),
                country: None,
                pincode: Some("500034".to_string()),
            },
        )
        .await?;
    db.accounts()
        .add_bank_account(
            SAMPLE_MOBILE,
            &BankAccountCreateRequest {
                bank_name: "State Bank of India".to_string(),
                branch: Some("Banjara Hills".to_string()),
                account_number: "00000012345678".to_string(),
                ifsc_code: "sbin0000001".to_string(),
                account_holder_name: "Pavan Gentela".to_string(),
                account_holder_type: Some("SELF".to_string()),
                is_primary: true,
            },
        )
        .await?;
    println!("✓ Address and primary bank account");

    // Application and ornaments
    let application = db
        .applications()
        .create(&ApplicationCreateRequest {
            mobile: SAMPLE_MOBILE.to_string(),
            application_type: ApplicationType::DirectBuying,
            application_date: None,
            application_no: None,
            place: Some("Hyderabad".to_string()),
        })
        .await?;
    println!("✓ Application {}", application.application_no);

    let summary = db
        .applications()
        .add_ornaments(&OrnamentCreateRequest {
            mobile: SAMPLE_MOBILE.to_string(),
            ornaments: SAMPLE_ITEMS
                .iter()
                .map(|(name, quantity, gross, _, purity, _, _)| OrnamentItemRequest {
                    item_name: name.to_string(),
                    quantity: *quantity,
                    purity_percentage: Some(dec(*purity)),
                    approx_weight_gms: Some(dec(*gross)),
                    item_photo_url: None,
                })
                .collect(),
        })
        .await?;
    println!(
        "✓ {} ornaments, {} g total",
        summary.total_quantity, summary.total_weight_gms
    );

    // Estimation
    let mut total = Decimal::ZERO;
    for (name, quantity, gross, stone, purity, rate, deduction) in SAMPLE_ITEMS {
        let receipt = db
            .estimations()
            .add_item(&EstimationItemCreateRequest {
                mobile: SAMPLE_MOBILE.to_string(),
                item_name: name.to_string(),
                quantity: *quantity,
                estimation_no: None,
                gross_weight_gms: dec(*gross),
                stone_weight_gms: dec(*stone),
                purity_percentage: dec(*purity),
                gold_rate_per_gm: dec(*rate),
                deduction_percentage: dec(*deduction),
            })
            .await?;
        println!(
            "✓ Estimated {}: net {} g, pure {} g, net amount {}",
            receipt.item.item_name,
            receipt.item.net_weight_gms,
            receipt.item.pure_weight_gms,
            receipt.item.net_amount
        );
        total = receipt.total_net_amount;
    }
    println!("  Estimation total: {}", total);

    // Invoice and settlement
    let today = Utc::now().date_naive();
    let invoice = db
        .payments()
        .create_invoice(&PaymentInvoiceCreateRequest {
            mobile: SAMPLE_MOBILE.to_string(),
            invoice_no: format!("INV-{}", today.format("%Y%m%d")),
            invoice_date: today,
            total_net_amount: total,
            amount_in_words: None,
            remarks: Some("Seed data".to_string()),
        })
        .await?;
    println!("✓ Invoice {}", invoice.invoice_no);

    let item = db
        .payments()
        .add_invoice_item(&InvoiceItemCreateRequest {
            mobile: SAMPLE_MOBILE.to_string(),
            item_name: "Melted lot".to_string(),
            weight_before_melting: Some(Decimal::new(15_000, 3)),
            weight_after_melting: Some(Decimal::new(14_000, 3)),
            purity_after_melting: Some(Decimal::new(916, 1)),
            gold_rate_per_gm: Some(Decimal::new(600_000, 2)),
            gross_amount: total,
            deductions_amount: Decimal::ZERO,
            net_amount: total,
        })
        .await?;
    db.payments()
        .add_deduction(&PaymentDeductionCreateRequest {
            invoice_item_id: item.id.clone(),
            deduction_type: "TESTING".to_string(),
            deduction_amount: Decimal::ZERO,
        })
        .await?;
    println!("✓ Invoice item and deduction");

    let receipt = db
        .payments()
        .add_settlement(&PaymentSettlementCreateRequest {
            mobile: SAMPLE_MOBILE.to_string(),
            payment_mode: PaymentMode::Upi,
            paid_amount: total,
            reference_no: Some("UPI-SEED-0001".to_string()),
            bank_name: None,
            payment_date: Some(today),
        })
        .await?;
    println!(
        "✓ Settlement: paid {} ({})",
        receipt.total_paid, receipt.payment_status
    );

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
