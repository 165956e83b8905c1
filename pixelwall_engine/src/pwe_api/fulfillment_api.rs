use std::fmt::Debug;

use chrono::Duration;
use log::*;
use rand::Rng;

use crate::{
    db_types::{Fulfillment, PixelSession, SessionStatus},
    events::{AssignmentNotifier, PixelAssignedEvent},
    traits::{CanvasApiError, FulfillmentError, PixelGatewayDatabase},
};

/// How many times a retryable storage failure is retried before the error is surfaced to the caller. The gateway
/// redelivers notifications we fail on, so giving up here is safe.
const MAX_FULFILL_ATTEMPTS: u32 = 4;
/// Initial delay before a retry. Doubles on every subsequent attempt.
const RETRY_BASE_DELAY_MS: u64 = 50;

/// `FulfillmentApi` is the primary API for reacting to payment gateway events: completions get fulfilled
/// (exactly once), expiries and cancellations close their session, and a reconciliation pass replays anything a
/// crash left half-done.
pub struct FulfillmentApi<B> {
    db: B,
    notifier: AssignmentNotifier,
}

impl<B> Debug for FulfillmentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FulfillmentApi")
    }
}

impl<B> FulfillmentApi<B> {
    pub fn new(db: B, notifier: AssignmentNotifier) -> Self {
        Self { db, notifier }
    }
}

impl<B> FulfillmentApi<B>
where B: PixelGatewayDatabase
{
    /// Process a payment-completed notification for a session.
    ///
    /// A cell is drawn uniformly at random over the whole canvas, occupied cells included, and the session is
    /// fulfilled against it. The fulfillment itself is atomic and idempotent; this method layers bounded retries
    /// with backoff over the transient failure modes (storage contention, lost cell-version races) and publishes
    /// [`PixelAssignedEvent`] only when a *new* assignment was created.
    pub async fn process_completed_session(
        &self,
        gateway_session_id: &str,
    ) -> Result<Fulfillment, FulfillmentError> {
        let mut delay_ms = RETRY_BASE_DELAY_MS;
        let mut last_error = None;
        for attempt in 1..=MAX_FULFILL_ATTEMPTS {
            let position = self.draw_position().await?;
            match self.db.fulfill_session(gateway_session_id, position).await {
                Ok(fulfillment) => {
                    let assignment = fulfillment.assignment();
                    if fulfillment.is_new() {
                        info!(
                            "🔄️💰️ Session {gateway_session_id} fulfilled: cell {} is now {}",
                            assignment.position, assignment.color
                        );
                        self.notifier.notify(PixelAssignedEvent::new(assignment.clone())).await;
                    } else {
                        debug!(
                            "🔄️💰️ Session {gateway_session_id} was already fulfilled by assignment [{}]. \
                             Nothing to do.",
                            assignment.id
                        );
                    }
                    return Ok(fulfillment);
                },
                Err(e @ (FulfillmentError::StorageUnavailable(_) | FulfillmentError::CellWriteConflict(_))) => {
                    debug!(
                        "🔄️💰️ Transient failure fulfilling session {gateway_session_id} (attempt \
                         {attempt}/{MAX_FULFILL_ATTEMPTS}): {e}"
                    );
                    last_error = Some(e);
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                    delay_ms *= 2;
                },
                Err(e) => return Err(e),
            }
        }
        let err = last_error.unwrap_or_else(|| {
            FulfillmentError::StorageUnavailable("retries exhausted without a recorded cause".to_string())
        });
        warn!("🔄️💰️ Giving up on session {gateway_session_id} after {MAX_FULFILL_ATTEMPTS} attempts: {err}");
        Err(err)
    }

    /// Process a session-expired or checkout-abandoned notification from the gateway.
    ///
    /// Returns the closed session, or `None` when there was nothing to do (the session completed first, was never
    /// ours, or was already closed). The race with a concurrent completion is resolved in storage; a completion
    /// that wins is never undone here.
    pub async fn process_closed_session(
        &self,
        gateway_session_id: &str,
        status: SessionStatus,
    ) -> Result<Option<PixelSession>, FulfillmentError> {
        let session = self.db.close_session(gateway_session_id, status).await?;
        match &session {
            Some(s) => info!("🔄️🕰️ Session #{} ({gateway_session_id}) closed as {status}", s.id),
            None => debug!("🔄️🕰️ No open session to close for {gateway_session_id}. Ignoring."),
        }
        Ok(session)
    }

    /// Expire `Open` sessions that have gone quiet for longer than `older_than`. Returns the expired sessions so
    /// that the caller can mirror the expiry to the gateway.
    pub async fn expire_old_sessions(&self, older_than: Duration) -> Result<Vec<PixelSession>, FulfillmentError> {
        let expired = self.db.expire_open_sessions(older_than).await?;
        if !expired.is_empty() {
            info!("🔄️🕰️ {} stale sessions expired", expired.len());
        }
        Ok(expired)
    }

    /// Replay fulfillment for every `Completed` session without a ledger entry.
    ///
    /// In normal operation there are none; after a crash between the status transition and the ledger write this
    /// pass finishes the job. Returns the number of sessions repaired.
    pub async fn replay_unfulfilled(&self) -> Result<usize, FulfillmentError> {
        let orphans = self.db.fetch_unfulfilled_sessions().await?;
        if orphans.is_empty() {
            return Ok(0);
        }
        warn!("🔄️💰️ Found {} completed sessions without an assignment. Replaying.", orphans.len());
        let mut repaired = 0;
        for session in &orphans {
            let Some(gateway_session_id) = session.gateway_session_id.as_deref() else {
                error!("🔄️💰️ Session #{} is Completed but has no gateway session id. Skipping.", session.id);
                continue;
            };
            match self.process_completed_session(gateway_session_id).await {
                Ok(_) => repaired += 1,
                Err(e) => error!("🔄️💰️ Could not replay session #{}: {e}", session.id),
            }
        }
        Ok(repaired)
    }

    /// Draw a uniformly random cell position over the entire canvas. Every cell is equally likely, whether or not
    /// it already has a colour.
    async fn draw_position(&self) -> Result<i64, FulfillmentError> {
        let canvas = self.db.fetch_canvas().await?.ok_or(CanvasApiError::CanvasNotInitialized)?;
        let position = rand::thread_rng().gen_range(0..canvas.cell_count());
        Ok(position)
    }
}
