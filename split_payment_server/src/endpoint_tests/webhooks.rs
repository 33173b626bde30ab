//! End-to-end tests of the payment webhook endpoint against a real SQLite store.

use actix_web::http::StatusCode;
use chrono::Utc;
use spg_common::Money;
use split_payment_engine::{
    db_types::{CoPaymentStatus, ContributorStatus, Contributor, CustomerDetails, NewOrder, PaymentStatus},
    traits::{SettlementDatabase, SettlementError},
    PAYMENT_LINK_METHOD,
};

use super::{
    helpers::{
        cancelled_event,
        new_test_db,
        paid_event,
        post_event,
        seed_co_payment,
        vendor_profile,
        RecordingProvider,
        TEST_SECRET,
    },
    mocks::{MockNotify, MockSettlementDb},
};
use crate::{data_objects::JsonResponse, integrations::notify::LogNotifier};

fn response(body: &str) -> JsonResponse {
    serde_json::from_str(body).expect("Response body was not a JsonResponse")
}

#[actix_web::test]
async fn a_co_payment_completes_and_settles_over_http() {
    let db = new_test_db().await;
    let co_payment = seed_co_payment(&db, &[300, 150], 7).await;
    db.upsert_payout_profile(7, &vendor_profile()).await.unwrap();
    let provider = RecordingProvider::default();

    let (status, body) = post_event(&db, provider.clone(), LogNotifier, &paid_event("plink_0", "pay_a", None), TEST_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    let res = response(&body);
    assert!(res.success);
    assert!(res.message.contains("recorded"), "was: {}", res.message);
    assert_eq!(provider.call_count(), 0);

    let (status, body) = post_event(&db, provider.clone(), LogNotifier, &paid_event("plink_1", "pay_b", None), TEST_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    let res = response(&body);
    assert!(res.success);
    assert!(res.message.contains("created"), "was: {}", res.message);

    let stored = db.fetch_co_payment(co_payment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CoPaymentStatus::Completed);
    let order_id = stored.order_id.expect("co-payment should have an order");
    let order = db.fetch_order_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(order.total_amount, Money::from_minor(450));
    // Both settlement legs went out, and the ledger row is in place.
    assert_eq!(provider.call_count(), 2);
    let split = db.fetch_payment_split(order_id).await.unwrap().expect("split should be written");
    assert_eq!(split.platform_amount, Money::from_minor(90));
    assert_eq!(split.vendor_amount, Money::from_minor(360));
}

#[actix_web::test]
async fn redelivered_completing_events_do_not_settle_twice() {
    let db = new_test_db().await;
    seed_co_payment(&db, &[450], 7).await;
    db.upsert_payout_profile(7, &vendor_profile()).await.unwrap();
    let provider = RecordingProvider::default();

    let (_, body) = post_event(&db, provider.clone(), LogNotifier, &paid_event("plink_0", "pay_a", None), TEST_SECRET).await;
    assert!(response(&body).success);
    assert_eq!(provider.call_count(), 2);

    let (status, body) = post_event(&db, provider.clone(), LogNotifier, &paid_event("plink_0", "pay_a", None), TEST_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    let res = response(&body);
    assert!(res.success);
    assert!(res.message.contains("already exists"), "was: {}", res.message);
    assert_eq!(provider.call_count(), 2);
}

#[actix_web::test]
async fn notifications_fire_exactly_once_for_a_new_order() {
    let db = new_test_db().await;
    seed_co_payment(&db, &[450], 7).await;
    db.upsert_payout_profile(7, &vendor_profile()).await.unwrap();

    let mut notifier = MockNotify::new();
    notifier.expect_notify_customer().times(1).returning(|_| Ok(()));
    notifier.expect_notify_vendor().times(1).returning(|_| Ok(()));
    let (_, body) = post_event(&db, RecordingProvider::default(), notifier, &paid_event("plink_0", "pay_a", None), TEST_SECRET).await;
    assert!(response(&body).success);

    // A replay must not notify anyone: the mock has no expectations and would panic on any call.
    let silent = MockNotify::new();
    let (_, body) = post_event(&db, RecordingProvider::default(), silent, &paid_event("plink_0", "pay_a", None), TEST_SECRET).await;
    assert!(response(&body).success);
}

#[actix_web::test]
async fn single_payment_orders_are_paid_via_the_order_note() {
    let db = new_test_db().await;
    let order = db
        .insert_order(NewOrder {
            order_number: "ORD-20240611-SOLO".to_string().into(),
            customer: CustomerDetails {
                email: "solo.buyer@example.com".to_string(),
                name: "Rahul".to_string(),
                phone: String::new(),
            },
            vendor_id: 7,
            total_amount: Money::from_minor(999),
            payment_status: PaymentStatus::Pending,
            payment_method: PAYMENT_LINK_METHOD.to_string(),
            gateway_payment_id: None,
            delivery_address: "2 Residency Road".to_string(),
            line_items: "[]".to_string(),
            estimated_delivery: Utc::now() + chrono::Duration::hours(3),
        })
        .await
        .unwrap();
    db.upsert_payout_profile(7, &vendor_profile()).await.unwrap();
    let provider = RecordingProvider::default();

    let event = paid_event("plink_solo", "pay_z", Some("ORD-20240611-SOLO"));
    let (status, body) = post_event(&db, provider.clone(), LogNotifier, &event, TEST_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response(&body).success);
    let stored = db.fetch_order_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Completed);
    assert_eq!(stored.gateway_payment_id.as_deref(), Some("pay_z"));
    assert_eq!(provider.call_count(), 2);
}

#[actix_web::test]
async fn a_stale_paid_event_after_cancellation_is_acknowledged_but_rejected() {
    let db = new_test_db().await;
    seed_co_payment(&db, &[300, 150], 7).await;

    let (status, body) =
        post_event(&db, RecordingProvider::default(), LogNotifier, &cancelled_event("plink_0", None), TEST_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response(&body).success);

    let (status, body) =
        post_event(&db, RecordingProvider::default(), LogNotifier, &paid_event("plink_0", "pay_a", None), TEST_SECRET).await;
    // Acknowledged so the gateway stops retrying, but flagged as not applied.
    assert_eq!(status, StatusCode::OK);
    assert!(!response(&body).success);
    let contributor = db.fetch_contributor_by_link("plink_0").await.unwrap().unwrap();
    assert_eq!(contributor.status, ContributorStatus::Pending);
    assert!(contributor.cancelled_at.is_some());
}

#[actix_web::test]
async fn unhandled_event_kinds_are_acknowledged() {
    let db = new_test_db().await;
    let event = serde_json::json!({
        "event": "payment.captured",
        "payload": { "payment": { "entity": { "id": "pay_123" } } }
    });
    let (status, body) = post_event(&db, RecordingProvider::default(), LogNotifier, &event, TEST_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    let res = response(&body);
    assert!(res.success);
    assert!(res.message.contains("ignored"), "was: {}", res.message);
}

#[actix_web::test]
async fn storage_failures_surface_as_500_so_the_gateway_redelivers() {
    let mut db = MockSettlementDb::new();
    db.expect_clone().returning(|| {
        let mut m = MockSettlementDb::new();
        m.expect_fetch_contributor_by_link().returning(|link_id| {
            Ok(Some(Contributor {
                id: 1,
                co_payment_id: 1,
                email: "payer0@example.com".to_string(),
                amount_owed: Money::from_minor(100),
                status: ContributorStatus::Pending,
                payment_link_id: link_id.to_string(),
                paid_at: None,
                cancelled_at: None,
                created_at: Utc::now(),
            }))
        });
        m.expect_confirm_contributor()
            .returning(|_| Err(SettlementError::DatabaseError("sqlite is on fire".to_string())));
        m
    });

    let (status, _) =
        post_event(&db, RecordingProvider::default(), LogNotifier, &paid_event("plink_0", "pay_a", None), TEST_SECRET).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
