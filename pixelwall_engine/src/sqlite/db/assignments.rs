use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Assignment, PixelSession};

/// Inserts the ledger entry for a session, returning `false` in the second element if an entry already existed.
///
/// The unique index on `session_id` is the exactly-once invariant; a conflict resolves to the existing row
/// rather than a double insert.
pub async fn idempotent_insert(
    session: &PixelSession,
    position: i64,
    conn: &mut SqliteConnection,
) -> Result<(Assignment, bool), sqlx::Error> {
    let inserted: Option<Assignment> = sqlx::query_as(
        "INSERT INTO assignments (session_id, position, color) VALUES ($1, $2, $3) ON CONFLICT (session_id) DO \
         NOTHING RETURNING *",
    )
    .bind(session.id)
    .bind(position)
    .bind(&session.color)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(assignment) => {
            debug!("📝️ Assignment [{}] recorded for session #{}", assignment.id, session.id);
            Ok((assignment, true))
        },
        None => {
            let existing = fetch_by_session_id(session.id, conn)
                .await?
                .ok_or_else(|| sqlx::Error::RowNotFound)?;
            Ok((existing, false))
        },
    }
}

pub async fn fetch_by_session_id(
    session_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Assignment>, sqlx::Error> {
    let assignment = sqlx::query_as("SELECT * FROM assignments WHERE session_id = $1")
        .bind(session_id)
        .fetch_optional(conn)
        .await?;
    Ok(assignment)
}

/// The most recent ledger entries, newest first. `id` breaks ties between entries created within the same
/// timestamp granule.
pub async fn fetch_recent(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<Assignment>, sqlx::Error> {
    let rows = sqlx::query_as("SELECT * FROM assignments ORDER BY created_at DESC, id DESC LIMIT $1")
        .bind(limit)
        .fetch_all(conn)
        .await?;
    Ok(rows)
}
