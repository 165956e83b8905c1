use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::Canvas;

pub async fn fetch_canvas(conn: &mut SqliteConnection) -> Result<Option<Canvas>, sqlx::Error> {
    let canvas = sqlx::query_as("SELECT * FROM canvas WHERE id = 1").fetch_optional(conn).await?;
    Ok(canvas)
}

/// Inserts the singleton canvas row. This is not atomic on its own; embed the call inside a transaction together
/// with [`create_cells`] and pass `&mut *tx` as the connection argument.
pub async fn create_canvas(side_length: i64, conn: &mut SqliteConnection) -> Result<Canvas, sqlx::Error> {
    let canvas = sqlx::query_as("INSERT INTO canvas (id, side_length) VALUES (1, $1) RETURNING *")
        .bind(side_length)
        .fetch_one(conn)
        .await?;
    Ok(canvas)
}

/// Bulk-creates the blank cell population `[0, cell_count)` in a single statement.
pub async fn create_cells(cell_count: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        WITH RECURSIVE seq(p) AS (SELECT 0 UNION ALL SELECT p + 1 FROM seq WHERE p + 1 < $1)
        INSERT INTO cells (position) SELECT p FROM seq;
        "#,
    )
    .bind(cell_count)
    .execute(conn)
    .await?;
    debug!("🗃️ {cell_count} blank cells created");
    Ok(())
}
