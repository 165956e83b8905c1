//! `SqliteDatabase` is a concrete implementation of a Pixelwall Engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{assignments, canvas, cells, new_pool, sessions};
use crate::{
    db_types::{Assignment, Canvas, Cell, Fulfillment, NewPixelSession, PixelSession, SessionStatus, MAX_SIDE_LENGTH},
    traits::{CanvasApiError, CanvasManagement, FulfillmentError, PixelGatewayDatabase},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

impl CanvasManagement for SqliteDatabase {
    async fn fetch_canvas(&self) -> Result<Option<Canvas>, CanvasApiError> {
        let mut conn = self.pool.acquire().await?;
        let canvas = canvas::fetch_canvas(&mut conn).await?;
        Ok(canvas)
    }

    async fn fetch_all_cells(&self) -> Result<Vec<Cell>, CanvasApiError> {
        let mut conn = self.pool.acquire().await?;
        let cells = cells::fetch_all_cells(&mut conn).await?;
        Ok(cells)
    }

    async fn fetch_cell(&self, position: i64) -> Result<Option<Cell>, CanvasApiError> {
        let mut conn = self.pool.acquire().await?;
        let cell = cells::fetch_cell(position, &mut conn).await?;
        Ok(cell)
    }

    async fn fetch_recent_assignments(&self, limit: i64) -> Result<Vec<Assignment>, CanvasApiError> {
        let mut conn = self.pool.acquire().await?;
        let assignments = assignments::fetch_recent(limit, &mut conn).await?;
        Ok(assignments)
    }
}

impl PixelGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn initialize_canvas(&self, side_length: i64) -> Result<Canvas, CanvasApiError> {
        if !(1..=MAX_SIDE_LENGTH).contains(&side_length) {
            return Err(CanvasApiError::InvalidSideLength(side_length));
        }
        let mut tx = self.pool.begin().await?;
        if let Some(existing) = canvas::fetch_canvas(&mut tx).await? {
            return if existing.side_length == side_length {
                debug!("🗃️ Canvas already initialised with side length {side_length}. Nothing to do.");
                Ok(existing)
            } else {
                Err(CanvasApiError::SizeMismatch { existing: existing.side_length, configured: side_length })
            };
        }
        let canvas = canvas::create_canvas(side_length, &mut tx).await?;
        canvas::create_cells(canvas.cell_count(), &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Canvas initialised: {side_length}x{side_length}, {} cells", canvas.cell_count());
        Ok(canvas)
    }

    async fn insert_session(&self, session: NewPixelSession) -> Result<PixelSession, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let session = sessions::insert_session(session, &mut conn).await?;
        Ok(session)
    }

    async fn attach_gateway_session(
        &self,
        id: i64,
        gateway_session_id: &str,
        redirect_url: &str,
    ) -> Result<PixelSession, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let session = sessions::attach_gateway_session(id, gateway_session_id, redirect_url, &mut conn)
            .await?
            .ok_or_else(|| FulfillmentError::UnknownSession(format!("internal id {id}")))?;
        debug!("🗃️ Session #{id} linked to gateway session {gateway_session_id}");
        Ok(session)
    }

    async fn fetch_session_by_gateway_id(
        &self,
        gateway_session_id: &str,
    ) -> Result<Option<PixelSession>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let session = sessions::fetch_session_by_gateway_id(gateway_session_id, &mut conn).await?;
        Ok(session)
    }

    /// Fulfils a completed payment in a single atomic transaction: guarded status transition, ledger insert,
    /// cell write. A crash can never leave the ledger and the grid observably out of step, because either the
    /// whole transaction commits or none of it does.
    async fn fulfill_session(
        &self,
        gateway_session_id: &str,
        position: i64,
    ) -> Result<Fulfillment, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let canvas = canvas::fetch_canvas(&mut tx).await?.ok_or(CanvasApiError::CanvasNotInitialized)?;
        if !(0..canvas.cell_count()).contains(&position) {
            return Err(FulfillmentError::PositionOutOfRange(position));
        }
        if let Some(session) = sessions::claim_completion(gateway_session_id, &mut tx).await? {
            debug!("🗃️ Session #{} ({gateway_session_id}) transitioned Open -> Completed", session.id);
            let (assignment, _) = assignments::idempotent_insert(&session, position, &mut tx).await?;
            cells::apply_color(assignment.position, assignment.color.as_str(), &mut tx).await?;
            tx.commit().await?;
            debug!(
                "🗃️ Session #{} fulfilled: cell {} painted {}",
                session.id, assignment.position, assignment.color
            );
            return Ok(Fulfillment::Assigned(assignment));
        }
        // The transition did not apply: the session is unknown, already terminal, or already completed.
        let session = sessions::fetch_session_by_gateway_id(gateway_session_id, &mut tx)
            .await?
            .ok_or_else(|| FulfillmentError::UnknownSession(gateway_session_id.to_string()))?;
        match session.status {
            SessionStatus::Completed => match assignments::fetch_by_session_id(session.id, &mut tx).await? {
                Some(assignment) => {
                    debug!("🗃️ Session #{} already fulfilled by assignment [{}]", session.id, assignment.id);
                    Ok(Fulfillment::AlreadyFulfilled(assignment))
                },
                None => {
                    // A previous attempt transitioned the session but crashed before fulfilling it. Repair now.
                    warn!("🗃️ Session #{} is Completed but has no ledger entry. Replaying fulfillment.", session.id);
                    let (assignment, inserted) = assignments::idempotent_insert(&session, position, &mut tx).await?;
                    if inserted {
                        cells::apply_color(assignment.position, assignment.color.as_str(), &mut tx).await?;
                    }
                    tx.commit().await?;
                    if inserted {
                        Ok(Fulfillment::Assigned(assignment))
                    } else {
                        Ok(Fulfillment::AlreadyFulfilled(assignment))
                    }
                },
            },
            status @ (SessionStatus::Expired | SessionStatus::Cancelled) => {
                Err(FulfillmentError::SessionAlreadyTerminal(gateway_session_id.to_string(), status))
            },
            // The guarded update missed but the row still reads Open: another writer holds the lock. Retryable.
            SessionStatus::Open => Err(FulfillmentError::StorageUnavailable(format!(
                "session {gateway_session_id} is still Open after a losing transition race"
            ))),
        }
    }

    async fn close_session(
        &self,
        gateway_session_id: &str,
        status: SessionStatus,
    ) -> Result<Option<PixelSession>, FulfillmentError> {
        if !status.is_terminal() {
            return Err(FulfillmentError::DatabaseError(format!("{status} is not a terminal status")));
        }
        let mut conn = self.pool.acquire().await?;
        let session = sessions::close_session(gateway_session_id, status, &mut conn).await?;
        if let Some(s) = &session {
            debug!("🗃️ Session #{} ({gateway_session_id}) closed as {status}", s.id);
        }
        Ok(session)
    }

    async fn expire_open_sessions(&self, older_than: Duration) -> Result<Vec<PixelSession>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let expired = sessions::expire_open_sessions(older_than, &mut conn).await?;
        Ok(expired)
    }

    async fn fetch_unfulfilled_sessions(&self) -> Result<Vec<PixelSession>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let sessions = sessions::fetch_unfulfilled_sessions(&mut conn).await?;
        Ok(sessions)
    }

    async fn close(&mut self) -> Result<(), FulfillmentError> {
        self.pool.close().await;
        Ok(())
    }
}
