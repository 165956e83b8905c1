use thiserror::Error;

use crate::db_types::{Assignment, Canvas, Cell};

/// Read-only access to the canvas and the fulfillment ledger.
///
/// These queries are side-effect free and are polled continuously by viewers, so implementations must serve them
/// without blocking the fulfillment write path.
#[allow(async_fn_in_trait)]
pub trait CanvasManagement {
    /// The canvas row, or `None` if the canvas has not been initialised yet.
    async fn fetch_canvas(&self) -> Result<Option<Canvas>, CanvasApiError>;

    /// Every cell, ordered by position, from a single consistent snapshot.
    async fn fetch_all_cells(&self) -> Result<Vec<Cell>, CanvasApiError>;

    async fn fetch_cell(&self, position: i64) -> Result<Option<Cell>, CanvasApiError>;

    /// The most recent ledger entries, newest first.
    async fn fetch_recent_assignments(&self, limit: i64) -> Result<Vec<Assignment>, CanvasApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum CanvasApiError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("The canvas has not been initialised")]
    CanvasNotInitialized,
    #[error("The canvas already exists with side length {existing}, but {configured} was requested")]
    SizeMismatch { existing: i64, configured: i64 },
    #[error("Side length {0} is outside the supported range")]
    InvalidSideLength(i64),
}

impl From<sqlx::Error> for CanvasApiError {
    fn from(e: sqlx::Error) -> Self {
        CanvasApiError::DatabaseError(e.to_string())
    }
}
