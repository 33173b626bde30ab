use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_web::{body::MessageBody, error::ResponseError, http::StatusCode, test, test::TestRequest, web, App};
use spg_common::{Money, Secret};
use split_payment_engine::{
    db_types::{CoPayment, NewCoPayment, NewContributor, PayoutProfile},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{Notifier, PayoutInstruction, PayoutProvider, PayoutProviderError, PayoutReceipt, SettlementDatabase},
    SettlementApi,
    SettlementFlowApi,
    SplitConfig,
    SqliteDatabase,
};

use crate::{helpers::calculate_hmac, middleware::HmacMiddlewareFactory, routes::PaymentWebhookRoute};

pub const TEST_SECRET: &str = "whsec_test_secret";
pub const SIGNATURE_HEADER: &str = "X-Signature";

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating connection to database")
}

pub fn split_config() -> SplitConfig {
    let platform_profile = PayoutProfile {
        beneficiary_name: "Cake Platform Pvt Ltd".to_string(),
        account_number: "990011223344".to_string(),
        ifsc_code: "ICIC0000042".to_string(),
    };
    SplitConfig { platform_profile, ..SplitConfig::default() }
}

pub fn vendor_profile() -> PayoutProfile {
    PayoutProfile {
        beneficiary_name: "Anand Bakers".to_string(),
        account_number: "001122334455".to_string(),
        ifsc_code: "HDFC0000123".to_string(),
    }
}

/// Seeds a co-payment whose contributors hold payment links `plink_0`, `plink_1`, ...
pub async fn seed_co_payment(db: &SqliteDatabase, amounts: &[i64], vendor_id: i64) -> CoPayment {
    let total: i64 = amounts.iter().sum();
    let intent = serde_json::json!({
        "customer": { "email": "birthday.host@example.com", "name": "Priya", "phone": "+911234567890" },
        "items": [
            { "vendor_id": vendor_id, "name": "Two-tier chocolate cake", "quantity": 1, "unit_price": total }
        ],
        "delivery_address": "14 MG Road, Bengaluru"
    });
    let contributors = amounts
        .iter()
        .enumerate()
        .map(|(i, a)| NewContributor {
            email: format!("payer{i}@example.com"),
            amount_owed: Money::from_minor(*a),
            payment_link_id: format!("plink_{i}"),
        })
        .collect();
    let new = NewCoPayment { total_amount: Money::from_minor(total), order_intent: intent.to_string(), contributors };
    db.insert_co_payment(new).await.expect("Error seeding co-payment")
}

pub fn paid_event(link_id: &str, payment_id: &str, order_note: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "event": "payment_link.paid",
        "payload": {
            "payment_link": { "entity": { "id": link_id, "notes": { "order_id": order_note } } },
            "payment": { "entity": { "id": payment_id } }
        }
    })
}

pub fn cancelled_event(link_id: &str, order_note: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "event": "payment_link.cancelled",
        "payload": {
            "payment_link": { "entity": { "id": link_id, "notes": { "order_id": order_note } } }
        }
    })
}

/// A payout provider double that only counts dispatches.
#[derive(Clone, Default)]
pub struct RecordingProvider {
    count: Arc<AtomicUsize>,
}

impl RecordingProvider {
    pub fn call_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl PayoutProvider for RecordingProvider {
    async fn send_payout(&self, instruction: PayoutInstruction) -> Result<PayoutReceipt, PayoutProviderError> {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PayoutReceipt {
            provider_ref: format!("pout_{n}"),
            status: "processed".to_string(),
            utr: Some(format!("UTR{}", instruction.amount.value())),
        })
    }
}

/// Signs `event` with `secret` and posts it at the webhook endpoint of a freshly built service.
/// All durable state lives in the database, so rebuilding the app per request changes nothing.
pub async fn post_event<B, N>(
    db: &B,
    provider: RecordingProvider,
    notifier: N,
    event: &serde_json::Value,
    secret: &str,
) -> (StatusCode, String)
where
    B: SettlementDatabase + 'static,
    N: Notifier + 'static,
{
    let body = event.to_string();
    let signature = calculate_hmac(secret, body.as_bytes());
    let app = App::new()
        .app_data(web::Data::new(SettlementFlowApi::new(db.clone())))
        .app_data(web::Data::new(SettlementApi::new(db.clone(), provider, split_config())))
        .app_data(web::Data::new(notifier))
        .service(
            web::scope("/webhooks")
                .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, Secret::new(TEST_SECRET.to_string()), true))
                .service(PaymentWebhookRoute::<B, RecordingProvider, N>::new()),
        );
    let service = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/webhooks/payments")
        .insert_header((SIGNATURE_HEADER, signature))
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body)
        .to_request();
    match test::try_call_service(&service, req).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}
