use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{Duration, TimeZone, Utc};
use pixelwall_engine::{
    db_types::{Canvas, Fulfillment, SessionStatus},
    traits::FulfillmentError,
    FulfillmentApi,
};
use pxw_common::Secret;
use serde_json::json;
use stripe_tools::compute_signature;

use super::{
    helpers::{assignment, open_session, post_request},
    mocks::MockPixelBackend,
};
use crate::{
    config::ServerOptions,
    middleware::StripeSignatureMiddlewareFactory,
    stripe_routes::StripeWebhookRoute,
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_test";

fn server_options() -> ServerOptions {
    ServerOptions { use_x_forwarded_for: false, use_forwarded: false, session_timeout: Duration::minutes(120) }
}

fn canvas() -> Canvas {
    Canvas { id: 1, side_length: 10, created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() }
}

fn completed_event(session_id: &str) -> serde_json::Value {
    json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "created": 1_719_830_000,
        "data": { "object": { "id": session_id, "status": "complete", "payment_status": "paid" } }
    })
}

fn expired_event(session_id: &str) -> serde_json::Value {
    json!({
        "id": "evt_2",
        "type": "checkout.session.expired",
        "created": 1_719_830_000,
        "data": { "object": { "id": session_id, "status": "expired" } }
    })
}

#[actix_web::test]
async fn completed_session_is_fulfilled() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/webhook", completed_event("cs_live_1"), configure_fulfilled).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "unexpected body: {body}");
}

#[actix_web::test]
async fn unknown_session_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    // A 2xx stops the gateway redelivering an event we can never process.
    let (status, body) =
        post_request("/webhook", completed_event("cs_unknown"), configure_unknown).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Unknown session"), "unexpected body: {body}");
}

#[actix_web::test]
async fn terminal_session_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/webhook", completed_event("cs_expired"), configure_terminal).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already Expired"), "unexpected body: {body}");
}

#[actix_web::test]
async fn storage_trouble_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request("/webhook", completed_event("cs_busy"), configure_unavailable).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn expired_event_closes_the_session() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/webhook", expired_event("cs_live_2"), configure_expiry).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""success":true"#), "unexpected body: {body}");
}

// ---------------------------------------  signature middleware  ---------------------------------------

async fn signed_request(body: String, header: Option<String>) -> StatusCode {
    let app = App::new()
        .service(
            web::scope("/stripe")
                .wrap(StripeSignatureMiddlewareFactory::new(Secret::new(WEBHOOK_SECRET.to_string()), 300, true))
                .service(StripeWebhookRoute::<MockPixelBackend>::new()),
        )
        .app_data(web::Data::new(FulfillmentApi::new(expiry_backend(), Default::default())))
        .app_data(web::Data::new(server_options()));
    let service = test::init_service(app).await;
    let mut req = TestRequest::post()
        .uri("/stripe/webhook")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body);
    if let Some(h) = header {
        req = req.insert_header(("Stripe-Signature", h));
    }
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.status(),
        Err(e) => e.error_response().status(),
    }
}

#[actix_web::test]
async fn valid_signature_is_accepted() {
    let _ = env_logger::try_init().ok();
    let body = expired_event("cs_live_2").to_string();
    let ts = Utc::now().timestamp();
    let header = format!("t={ts},v1={}", compute_signature(WEBHOOK_SECRET, ts, body.as_bytes()));
    let status = signed_request(body, Some(header)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn missing_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = expired_event("cs_live_2").to_string();
    let status = signed_request(body, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn forged_signature_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = expired_event("cs_live_2").to_string();
    let ts = Utc::now().timestamp();
    let header = format!("t={ts},v1={}", compute_signature("whsec_wrong_secret", ts, body.as_bytes()));
    let status = signed_request(body, Some(header)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ---------------------------------------  service configurations  ---------------------------------------

fn configure_fulfilled(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_fetch_canvas().returning(|| Ok(Some(canvas())));
    backend
        .expect_fulfill_session()
        .withf(|gid, position| gid == "cs_live_1" && (0..100).contains(position))
        .returning(|_, position| Ok(Fulfillment::Assigned(assignment(1, position, "#ff00ff"))));
    register(cfg, backend);
}

fn configure_unknown(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_fetch_canvas().returning(|| Ok(Some(canvas())));
    backend
        .expect_fulfill_session()
        .returning(|gid, _| Err(FulfillmentError::UnknownSession(gid.to_string())));
    register(cfg, backend);
}

fn configure_terminal(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_fetch_canvas().returning(|| Ok(Some(canvas())));
    backend.expect_fulfill_session().returning(|gid, _| {
        Err(FulfillmentError::SessionAlreadyTerminal(gid.to_string(), SessionStatus::Expired))
    });
    register(cfg, backend);
}

fn configure_unavailable(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_fetch_canvas().returning(|| Ok(Some(canvas())));
    // The fulfillment layer retries transient failures before giving up, so the mock is hit repeatedly.
    backend
        .expect_fulfill_session()
        .times(4)
        .returning(|_, _| Err(FulfillmentError::StorageUnavailable("database is locked".to_string())));
    register(cfg, backend);
}

fn configure_expiry(cfg: &mut ServiceConfig) {
    register(cfg, expiry_backend());
}

fn expiry_backend() -> MockPixelBackend {
    let mut backend = MockPixelBackend::new();
    backend
        .expect_close_session()
        .withf(|gid, status| gid == "cs_live_2" && *status == SessionStatus::Expired)
        .returning(|gid, _| {
            let mut session = open_session(9, "#333333", 50);
            session.gateway_session_id = Some(gid.to_string());
            session.status = SessionStatus::Expired;
            Ok(Some(session))
        });
    backend
}

fn register(cfg: &mut ServiceConfig, backend: MockPixelBackend) {
    cfg.service(StripeWebhookRoute::<MockPixelBackend>::new())
        .app_data(web::Data::new(FulfillmentApi::new(backend, Default::default())))
        .app_data(web::Data::new(server_options()));
}
