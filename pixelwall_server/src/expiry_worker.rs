use chrono::Duration;
use log::*;
use pixelwall_engine::{db_types::PixelSession, events::AssignmentNotifier, FulfillmentApi, SqliteDatabase};
use stripe_tools::StripeApi;
use tokio::task::JoinHandle;

use crate::integrations::stripe::PaymentGateway;

/// Extra slack added to the session timeout before the sweep fires, so that a completion racing the deadline is
/// given every chance to land first.
const EXPIRY_GRACE: Duration = Duration::minutes(10);

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute the worker expires stale open sessions, mirrors each expiry to the gateway (best effort), and
/// replays any completed session a crash left without an assignment.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    notifier: AssignmentNotifier,
    gateway: StripeApi,
    session_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(60));
        let api = FulfillmentApi::new(db, notifier);
        info!("🕰️ Session expiry worker started");
        loop {
            timer.tick().await;
            trace!("🕰️ Running session expiry job");
            match api.expire_old_sessions(session_timeout + EXPIRY_GRACE).await {
                Ok(expired) => {
                    if !expired.is_empty() {
                        info!("🕰️ {} sessions expired: {}", expired.len(), session_list(&expired));
                    }
                    for session in &expired {
                        if let Some(gid) = session.gateway_session_id.as_deref() {
                            if let Err(e) = gateway.expire_payment_session(gid).await {
                                debug!("🕰️ Could not mirror expiry of session #{} to the gateway: {e}", session.id);
                            }
                        }
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running session expiry job: {e}");
                },
            }
            match api.replay_unfulfilled().await {
                Ok(0) => {},
                Ok(n) => info!("🕰️ Reconciliation replayed {n} stranded sessions"),
                Err(e) => error!("🕰️ Error running reconciliation job: {e}"),
            }
        }
    })
}

fn session_list(sessions: &[PixelSession]) -> String {
    sessions
        .iter()
        .map(|s| format!("[{}] gateway_session_id: {}", s.id, s.gateway_session_id.as_deref().unwrap_or("-")))
        .collect::<Vec<String>>()
        .join(", ")
}
