use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use pixelwall_engine::{db_types::Cell, CanvasApi};

use super::{
    helpers::{assignment, get_request},
    mocks::MockPixelBackend,
};
use crate::{
    data_objects::{ActivityEntry, GridCell},
    routes::{ActivityRoute, GridRoute},
};

fn cells() -> Vec<Cell> {
    (0..4)
        .map(|position| Cell {
            position,
            color: if position == 2 { "#ff0000".to_string() } else { String::new() },
            version: i64::from(position == 2),
            updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        })
        .collect()
}

#[actix_web::test]
async fn fetch_grid() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/grid", configure_grid).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    // The grid is a bare array, not an envelope object.
    assert!(body.starts_with('['), "unexpected body: {body}");
    let grid: Vec<GridCell> = serde_json::from_str(&body).unwrap();
    assert_eq!(grid.len(), 4);
    assert_eq!(grid[2].position, 2);
    assert_eq!(grid[2].color, "#ff0000");
    assert!(grid[0].color.is_empty());
}

#[actix_web::test]
async fn fetch_activity_with_default_limit() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/activity", configure_activity).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""pixel_id":1"#), "unexpected body: {body}");
    let entries: Vec<ActivityEntry> = serde_json::from_str(&body).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].pixel_id, 1);
    assert_eq!(entries[0].color, "#00ff00");
}

#[actix_web::test]
async fn fetch_activity_clamps_oversized_limit() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/activity?limit=100000", configure_activity_clamped).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

fn configure_grid(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_fetch_all_cells().returning(|| Ok(cells()));
    cfg.service(GridRoute::<MockPixelBackend>::new()).app_data(web::Data::new(CanvasApi::new(backend)));
}

fn configure_activity(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    // No limit in the query, so the API must ask for the default of 50.
    backend
        .expect_fetch_recent_assignments()
        .withf(|limit| *limit == 50)
        .returning(|_| Ok(vec![assignment(2, 1, "#00ff00"), assignment(1, 3, "#0000ff")]));
    cfg.service(ActivityRoute::<MockPixelBackend>::new()).app_data(web::Data::new(CanvasApi::new(backend)));
}

fn configure_activity_clamped(cfg: &mut ServiceConfig) {
    let mut backend = MockPixelBackend::new();
    backend.expect_fetch_recent_assignments().withf(|limit| *limit == 200).returning(|_| Ok(vec![]));
    cfg.service(ActivityRoute::<MockPixelBackend>::new()).app_data(web::Data::new(CanvasApi::new(backend)));
}
