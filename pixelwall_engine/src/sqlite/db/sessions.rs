use chrono::Duration;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewPixelSession, PixelSession, SessionStatus};

pub async fn insert_session(
    session: NewPixelSession,
    conn: &mut SqliteConnection,
) -> Result<PixelSession, sqlx::Error> {
    let session: PixelSession =
        sqlx::query_as("INSERT INTO pixel_sessions (color, price) VALUES ($1, $2) RETURNING *")
            .bind(session.color)
            .bind(session.price)
            .fetch_one(conn)
            .await?;
    debug!("🗃️ Session #{} created for {} at {}", session.id, session.color, session.price);
    Ok(session)
}

pub async fn attach_gateway_session(
    id: i64,
    gateway_session_id: &str,
    redirect_url: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PixelSession>, sqlx::Error> {
    let session = sqlx::query_as(
        "UPDATE pixel_sessions SET gateway_session_id = $2, redirect_url = $3, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(gateway_session_id)
    .bind(redirect_url)
    .fetch_optional(conn)
    .await?;
    Ok(session)
}

pub async fn fetch_session_by_gateway_id(
    gateway_session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PixelSession>, sqlx::Error> {
    let session = sqlx::query_as("SELECT * FROM pixel_sessions WHERE gateway_session_id = $1")
        .bind(gateway_session_id)
        .fetch_optional(conn)
        .await?;
    Ok(session)
}

/// The guarded `Open` -> `Completed` transition. First writer wins: the update applies only while the session is
/// still `Open`, so a duplicate notification or a concurrent expiry sweep can never complete a session twice.
pub async fn claim_completion(
    gateway_session_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PixelSession>, sqlx::Error> {
    let session = sqlx::query_as(
        "UPDATE pixel_sessions SET status = 'Completed', updated_at = CURRENT_TIMESTAMP WHERE \
         gateway_session_id = $1 AND status = 'Open' RETURNING *",
    )
    .bind(gateway_session_id)
    .fetch_optional(conn)
    .await?;
    Ok(session)
}

/// Guarded transition from `Open` to a terminal status. Returns `None` if the session was not `Open`.
pub async fn close_session(
    gateway_session_id: &str,
    status: SessionStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<PixelSession>, sqlx::Error> {
    let session = sqlx::query_as(
        "UPDATE pixel_sessions SET status = $2, updated_at = CURRENT_TIMESTAMP WHERE gateway_session_id = $1 AND \
         status = 'Open' RETURNING *",
    )
    .bind(gateway_session_id)
    .bind(status.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(session)
}

/// Expires `Open` sessions that have not been updated within `older_than`. Guarded on `Open`, so a completion
/// that lands first always wins the race.
pub async fn expire_open_sessions(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<PixelSession>, sqlx::Error> {
    let rows = sqlx::query_as(
        format!(
            "UPDATE pixel_sessions SET updated_at = CURRENT_TIMESTAMP, status = 'Expired' WHERE status = 'Open' \
             AND (unixepoch(CURRENT_TIMESTAMP) - unixepoch(updated_at)) > {} RETURNING *;",
            older_than.num_seconds()
        )
        .as_str(),
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

/// `Completed` sessions with no ledger entry. The reconciliation pass replays these.
pub async fn fetch_unfulfilled_sessions(conn: &mut SqliteConnection) -> Result<Vec<PixelSession>, sqlx::Error> {
    let rows = sqlx::query_as(
        r#"
        SELECT s.* FROM pixel_sessions s
        LEFT JOIN assignments a ON a.session_id = s.id
        WHERE s.status = 'Completed' AND a.id IS NULL
        ORDER BY s.updated_at ASC
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}
