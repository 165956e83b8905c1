use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Duration;
use pixelwall_engine::CheckoutApi;
use serde_json::json;
use stripe_tools::StripeApiError;

use super::{
    helpers::{open_session, post_request},
    mocks::{MockGateway, MockPixelBackend},
};
use crate::{
    config::ServerOptions,
    data_objects::CheckoutResponse,
    integrations::stripe::GatewaySession,
    routes::CheckoutRoute,
};

fn server_options() -> ServerOptions {
    ServerOptions { use_x_forwarded_for: false, use_forwarded: false, session_timeout: Duration::minutes(120) }
}

#[actix_web::test]
async fn checkout_happy_path() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/checkout", json!({"color": "#FFD700"}), configure_happy).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: CheckoutResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.session_id, "cs_test_1");
    assert_eq!(response.redirect_url, "https://checkout.stripe.com/pay/cs_test_1");
    assert_eq!(response.amount, 500);
}

#[actix_web::test]
async fn checkout_rejects_invalid_colour() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/checkout", json!({"color": "bright red"}), configure_never_called).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid colour"), "unexpected body: {body}");
}

#[actix_web::test]
async fn checkout_maps_gateway_failure_to_502() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("/checkout", json!({"color": "#123456"}), configure_gateway_down).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("payment gateway"), "unexpected body: {body}");
}

fn configure_happy(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_insert_session().returning(|new_session| {
        // The price must be the server-side quote for gold, not anything the client sent.
        assert_eq!(new_session.price.value(), 500);
        let mut session = open_session(42, "#ffd700", 500);
        session.color = new_session.color;
        Ok(session)
    });
    backend.expect_attach_gateway_session().returning(|id, gateway_id, redirect_url| {
        let mut session = open_session(id, "#ffd700", 500);
        session.gateway_session_id = Some(gateway_id.to_string());
        session.redirect_url = Some(redirect_url.to_string());
        Ok(session)
    });
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment_session().returning(|session, _expires_at| {
        assert_eq!(session.id, 42);
        Ok(GatewaySession {
            id: "cs_test_1".to_string(),
            redirect_url: "https://checkout.stripe.com/pay/cs_test_1".to_string(),
        })
    });
    cfg.service(CheckoutRoute::<MockPixelBackend, MockGateway>::new())
        .app_data(web::Data::new(CheckoutApi::new(backend)))
        .app_data(web::Data::new(gateway))
        .app_data(web::Data::new(server_options()));
}

fn configure_never_called(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_insert_session().never();
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment_session().never();
    cfg.service(CheckoutRoute::<MockPixelBackend, MockGateway>::new())
        .app_data(web::Data::new(CheckoutApi::new(backend)))
        .app_data(web::Data::new(gateway))
        .app_data(web::Data::new(server_options()));
}

fn configure_gateway_down(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_insert_session().returning(|new_session| {
        let mut session = open_session(7, "#123456", 50);
        session.color = new_session.color;
        Ok(session)
    });
    backend.expect_attach_gateway_session().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_payment_session()
        .returning(|_, _| Err(StripeApiError::RestResponseError("connection refused".to_string())));
    cfg.service(CheckoutRoute::<MockPixelBackend, MockGateway>::new())
        .app_data(web::Data::new(CheckoutApi::new(backend)))
        .app_data(web::Data::new(gateway))
        .app_data(web::Data::new(server_options()));
}
