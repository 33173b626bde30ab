//! Shared fixtures for the settlement engine integration tests.

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use log::*;
use spg_common::Money;
use split_payment_engine::{
    db_types::{CoPayment, CustomerDetails, NewCoPayment, NewContributor, NewOrder, PaymentStatus, PayoutProfile},
    order_intent::{IntentItem, OrderIntent},
    traits::{PayoutInstruction, PayoutProvider, PayoutProviderError, PayoutReceipt, SettlementDatabase},
    SqliteDatabase,
    PAYMENT_LINK_METHOD,
};
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    create_database(url).await;
    run_migrations(url).await;
}

pub fn random_db_path() -> String {
    format!("sqlite://{}/test_settlement_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating connection to database")
}

async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    migrate!("./migrations").run(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
}

async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        warn!("Error dropping database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
}

pub fn cake_intent(vendor_id: Option<i64>) -> OrderIntent {
    OrderIntent {
        customer: CustomerDetails {
            email: "birthday.host@example.com".to_string(),
            name: "Priya".to_string(),
            phone: "+911234567890".to_string(),
        },
        items: vec![IntentItem {
            vendor_id,
            name: "Two-tier chocolate cake".to_string(),
            quantity: 1,
            unit_price: Money::from_minor(450),
        }],
        delivery_address: "14 MG Road, Bengaluru".to_string(),
        delivery_fee: None,
        estimated_delivery: None,
    }
}

pub fn empty_intent() -> OrderIntent {
    let mut intent = cake_intent(Some(1));
    intent.items.clear();
    intent
}

/// Seeds a co-payment whose contributors hold payment links `plink_0`, `plink_1`, ...
pub async fn seed_co_payment(db: &SqliteDatabase, amounts: &[i64], intent: &OrderIntent) -> CoPayment {
    let contributors = amounts
        .iter()
        .enumerate()
        .map(|(i, a)| NewContributor {
            email: format!("payer{i}@example.com"),
            amount_owed: Money::from_minor(*a),
            payment_link_id: format!("plink_{i}"),
        })
        .collect();
    let total_amount = Money::from_minor(amounts.iter().sum());
    let order_intent = serde_json::to_string(intent).unwrap();
    db.insert_co_payment(NewCoPayment { total_amount, order_intent, contributors })
        .await
        .expect("Error seeding co-payment")
}

/// Seeds a pending single-payment order and returns it.
pub async fn seed_pending_order(db: &SqliteDatabase, number: &str, total: i64, vendor_id: i64) -> split_payment_engine::db_types::Order {
    let order = NewOrder {
        order_number: number.to_string().into(),
        customer: CustomerDetails {
            email: "solo.buyer@example.com".to_string(),
            name: "Rahul".to_string(),
            phone: String::new(),
        },
        vendor_id,
        total_amount: Money::from_minor(total),
        payment_status: PaymentStatus::Pending,
        payment_method: PAYMENT_LINK_METHOD.to_string(),
        gateway_payment_id: None,
        delivery_address: "2 Residency Road".to_string(),
        line_items: "[]".to_string(),
        estimated_delivery: Utc::now() + chrono::Duration::hours(3),
    };
    db.insert_order(order).await.expect("Error seeding order")
}

pub fn complete_profile(name: &str) -> PayoutProfile {
    PayoutProfile {
        beneficiary_name: name.to_string(),
        account_number: "001122334455".to_string(),
        ifsc_code: "HDFC0000123".to_string(),
    }
}

pub async fn count_rows(db: &SqliteDatabase, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}")).fetch_one(db.pool()).await.unwrap();
    n
}

/// A payout provider double that records every instruction and can be told to fail specific legs
/// (matched on the reference prefix).
#[derive(Clone, Default)]
pub struct StubPayoutProvider {
    pub sent: Arc<Mutex<Vec<PayoutInstruction>>>,
    pub failing_legs: Vec<String>,
}

impl StubPayoutProvider {
    pub fn failing(legs: &[&str]) -> Self {
        Self { sent: Arc::default(), failing_legs: legs.iter().map(|s| s.to_string()).collect() }
    }

    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl PayoutProvider for StubPayoutProvider {
    async fn send_payout(&self, instruction: PayoutInstruction) -> Result<PayoutReceipt, PayoutProviderError> {
        if self.failing_legs.iter().any(|leg| instruction.reference_id.starts_with(leg.as_str())) {
            return Err(PayoutProviderError("simulated provider outage".to_string()));
        }
        self.sent.lock().unwrap().push(instruction.clone());
        Ok(PayoutReceipt {
            provider_ref: format!("pout_{}", self.call_count()),
            status: "processed".to_string(),
            utr: Some("UTR0012345".to_string()),
        })
    }
}
