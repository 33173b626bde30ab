//! Tests of the webhook HMAC middleware in isolation.

use actix_web::{body::MessageBody, error::ResponseError, http::StatusCode, test, test::TestRequest, web, App, HttpResponse};
use spg_common::Secret;

use super::helpers::{SIGNATURE_HEADER, TEST_SECRET};
use crate::{helpers::calculate_hmac, middleware::HmacMiddlewareFactory};

async fn echo(body: web::Bytes) -> HttpResponse {
    HttpResponse::Ok().body(body)
}

async fn guarded_request(body: &str, signature: Option<&str>, enabled: bool) -> (StatusCode, String) {
    let app = App::new().service(
        web::scope("/webhooks")
            .wrap(HmacMiddlewareFactory::new(SIGNATURE_HEADER, Secret::new(TEST_SECRET.to_string()), enabled))
            .route("/payments", web::post().to(echo)),
    );
    let service = test::init_service(app).await;
    let mut req = TestRequest::post().uri("/webhooks/payments").set_payload(body.to_string());
    if let Some(sig) = signature {
        req = req.insert_header((SIGNATURE_HEADER, sig));
    }
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            (status, body)
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}

#[actix_web::test]
async fn a_correctly_signed_request_reaches_the_handler() {
    let body = r#"{"event":"payment_link.paid"}"#;
    let sig = calculate_hmac(TEST_SECRET, body.as_bytes());
    let (status, echoed) = guarded_request(body, Some(&sig), true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, body);
}

#[actix_web::test]
async fn a_tampered_body_is_rejected_with_401() {
    let sig = calculate_hmac(TEST_SECRET, br#"{"amount":450}"#);
    let (status, _) = guarded_request(r#"{"amount":999}"#, Some(&sig), true).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn a_signature_under_the_wrong_key_is_rejected_with_401() {
    let body = r#"{"event":"payment_link.paid"}"#;
    let sig = calculate_hmac("not-the-secret", body.as_bytes());
    let (status, _) = guarded_request(body, Some(&sig), true).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn a_missing_signature_header_is_rejected_with_400() {
    let (status, _) = guarded_request(r#"{"event":"payment_link.paid"}"#, None, true).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn disabled_verification_lets_unsigned_requests_through() {
    let body = r#"{"event":"payment_link.paid"}"#;
    let (status, echoed) = guarded_request(body, None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, body);
}
