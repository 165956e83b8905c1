use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use log::debug;
use pixelwall_engine::db_types::{Assignment, PixelSession, SessionStatus};
use pxw_common::{Cents, HexColor};

pub async fn get_request(path: &str, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn post_request(
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::post().uri(path).set_json(body).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

// Fixtures shared by the endpoint tests.

pub fn open_session(id: i64, color: &str, price: i64) -> PixelSession {
    PixelSession {
        id,
        gateway_session_id: None,
        color: HexColor::parse(color).unwrap(),
        price: Cents::from(price),
        status: SessionStatus::Open,
        redirect_url: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

pub fn assignment(session_id: i64, position: i64, color: &str) -> Assignment {
    Assignment {
        id: session_id * 10,
        session_id,
        position,
        color: HexColor::parse(color).unwrap(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 0).unwrap(),
    }
}
