use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::Cell, traits::FulfillmentError};

/// How many times a lost optimistic-concurrency race on a single cell is retried before giving up.
const MAX_WRITE_ATTEMPTS: u32 = 5;

pub async fn fetch_cell(position: i64, conn: &mut SqliteConnection) -> Result<Option<Cell>, sqlx::Error> {
    let cell =
        sqlx::query_as("SELECT * FROM cells WHERE position = $1").bind(position).fetch_optional(conn).await?;
    Ok(cell)
}

/// Every cell, ordered by position. A single statement, so the result is one consistent snapshot.
pub async fn fetch_all_cells(conn: &mut SqliteConnection) -> Result<Vec<Cell>, sqlx::Error> {
    let cells = sqlx::query_as("SELECT * FROM cells ORDER BY position ASC").fetch_all(conn).await?;
    Ok(cells)
}

/// Paints a cell using optimistic versioning: read the current version, then update only if it has not moved.
///
/// A lost race retries the write against the *same* cell rather than reselecting one, because two completed
/// payments may legitimately target the same cell (last write wins). Exhausting the retries surfaces
/// [`FulfillmentError::CellWriteConflict`].
pub async fn apply_color(
    position: i64,
    color: &str,
    conn: &mut SqliteConnection,
) -> Result<Cell, FulfillmentError> {
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let cell = fetch_cell(position, conn)
            .await?
            .ok_or_else(|| FulfillmentError::PositionOutOfRange(position))?;
        let updated: Option<Cell> = sqlx::query_as(
            "UPDATE cells SET color = $1, version = version + 1, updated_at = CURRENT_TIMESTAMP WHERE position = \
             $2 AND version = $3 RETURNING *",
        )
        .bind(color)
        .bind(position)
        .bind(cell.version)
        .fetch_optional(&mut *conn)
        .await?;
        match updated {
            Some(cell) => return Ok(cell),
            None => trace!("🗃️ Lost a version race on cell {position} (attempt {attempt}). Retrying."),
        }
    }
    Err(FulfillmentError::CellWriteConflict(position))
}
