use crate::{
    db_types::{Assignment, Canvas, Cell},
    traits::{CanvasApiError, CanvasManagement},
};

/// The number of ledger entries an activity query returns when the caller does not say how many it wants.
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;
/// The most ledger entries a single activity query will ever return.
pub const MAX_ACTIVITY_LIMIT: i64 = 200;

/// `CanvasApi` serves the read side: the grid snapshot and the recent-activity feed. Viewers poll these
/// continuously, so everything here is side-effect free.
#[derive(Debug, Clone)]
pub struct CanvasApi<B> {
    db: B,
}

impl<B> CanvasApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CanvasApi<B>
where B: CanvasManagement
{
    pub async fn canvas(&self) -> Result<Canvas, CanvasApiError> {
        self.db.fetch_canvas().await?.ok_or(CanvasApiError::CanvasNotInitialized)
    }

    /// The full grid, every cell in position order, from a single consistent snapshot.
    pub async fn grid(&self) -> Result<Vec<Cell>, CanvasApiError> {
        self.db.fetch_all_cells().await
    }

    pub async fn cell(&self, position: i64) -> Result<Option<Cell>, CanvasApiError> {
        self.db.fetch_cell(position).await
    }

    /// The most recent assignments, newest first. A missing or non-positive `limit` falls back to
    /// [`DEFAULT_ACTIVITY_LIMIT`]; anything above [`MAX_ACTIVITY_LIMIT`] is clamped.
    pub async fn activity(&self, limit: Option<i64>) -> Result<Vec<Assignment>, CanvasApiError> {
        let limit = match limit {
            Some(n) if n > 0 => n.min(MAX_ACTIVITY_LIMIT),
            _ => DEFAULT_ACTIVITY_LIMIT,
        };
        self.db.fetch_recent_assignments(limit).await
    }
}
