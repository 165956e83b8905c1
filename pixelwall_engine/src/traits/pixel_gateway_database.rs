use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{Canvas, Fulfillment, NewPixelSession, PixelSession, SessionStatus},
    traits::{CanvasApiError, CanvasManagement},
};

/// This trait defines the write-path behaviour for backends supporting the Pixelwall Engine.
///
/// This behaviour includes:
/// * Creating the canvas and its cell population at startup.
/// * Managing the payment session lifecycle.
/// * The transactional fulfillment step, which is the only place the cell population and the assignment ledger
///   are mutated.
#[allow(async_fn_in_trait)]
pub trait PixelGatewayDatabase: CanvasManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Create the canvas row and bulk-create its cells, all blank, in a single transaction.
    ///
    /// This call is idempotent for the same `side_length`. If a canvas already exists with a different side
    /// length, [`CanvasApiError::SizeMismatch`] is returned; the canvas is never resized.
    async fn initialize_canvas(&self, side_length: i64) -> Result<Canvas, CanvasApiError>;

    /// Persist a new payment session in `Open` status with its locked-in price.
    ///
    /// This happens *before* the gateway is contacted: the session row, not the gateway response, is the durable
    /// record of what was promised to the buyer.
    async fn insert_session(&self, session: NewPixelSession) -> Result<PixelSession, FulfillmentError>;

    /// Record the gateway-issued session id and redirect URL against an internal session.
    async fn attach_gateway_session(
        &self,
        id: i64,
        gateway_session_id: &str,
        redirect_url: &str,
    ) -> Result<PixelSession, FulfillmentError>;

    async fn fetch_session_by_gateway_id(
        &self,
        gateway_session_id: &str,
    ) -> Result<Option<PixelSession>, FulfillmentError>;

    /// Fulfil a completed payment, in a single atomic transaction:
    ///
    /// 1. Transition the session from `Open` to `Completed` with a guarded update (first writer wins).
    /// 2. Insert the assignment ledger row, keyed by the unique session id. A uniqueness conflict resolves to
    ///    the existing row, never a double insert.
    /// 3. Paint the target cell using optimistic versioning, retrying the cell write (not reselecting the cell)
    ///    on a lost race.
    ///
    /// If the session is already `Completed`, the existing assignment is returned
    /// ([`Fulfillment::AlreadyFulfilled`]); if the ledger row is missing despite the `Completed` status (a crash
    /// between transition and fulfillment on a previous attempt), the assignment is created now. Sessions in
    /// `Expired` or `Cancelled` are never fulfilled.
    async fn fulfill_session(&self, gateway_session_id: &str, position: i64)
        -> Result<Fulfillment, FulfillmentError>;

    /// Transition an `Open` session to the given terminal status with a guarded update.
    ///
    /// Returns the updated session, or `None` if the session was not `Open` (a completion already won the race,
    /// or the session was already closed). Never touches the ledger.
    async fn close_session(
        &self,
        gateway_session_id: &str,
        status: SessionStatus,
    ) -> Result<Option<PixelSession>, FulfillmentError>;

    /// Mark `Open` sessions that have not been updated for longer than `older_than` as `Expired`.
    ///
    /// The update is guarded on `Open` status, so a completion that lands first is never clobbered. Returns the
    /// sessions that were expired.
    async fn expire_open_sessions(&self, older_than: Duration) -> Result<Vec<PixelSession>, FulfillmentError>;

    /// `Completed` sessions that have no ledger entry. In normal operation this is always empty; the
    /// reconciliation pass replays anything found here.
    async fn fetch_unfulfilled_sessions(&self) -> Result<Vec<PixelSession>, FulfillmentError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), FulfillmentError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("We have an internal database engine error: {0}")]
    DatabaseError(String),
    #[error("The notification references a session that was never created here: {0}")]
    UnknownSession(String),
    #[error("Session {0} is already {1} and will not be fulfilled")]
    SessionAlreadyTerminal(String, SessionStatus),
    #[error("The storage backend is temporarily unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Optimistic concurrency retries exhausted while writing cell {0}")]
    CellWriteConflict(i64),
    #[error("Position {0} lies outside the canvas")]
    PositionOutOfRange(i64),
    #[error("{0}")]
    CanvasError(#[from] CanvasApiError),
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut => FulfillmentError::StorageUnavailable(e.to_string()),
            sqlx::Error::Database(db)
                if db.message().contains("database is locked") || db.message().contains("database is busy") =>
            {
                FulfillmentError::StorageUnavailable(db.message().to_string())
            },
            _ => FulfillmentError::DatabaseError(e.to_string()),
        }
    }
}
