//----------------------------------------------   Stripe webhooks  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info, trace, warn};
use pixelwall_engine::{
    db_types::SessionStatus,
    traits::{FulfillmentError, PixelGatewayDatabase},
    FulfillmentApi,
};
use stripe_tools::Event;

use crate::{
    config::ServerOptions,
    data_objects::JsonResponse,
    errors::ServerError,
    helpers::get_remote_ip,
    route,
};

route!(stripe_webhook => Post "/webhook" impl PixelGatewayDatabase);
/// Route handler for Stripe webhook deliveries.
///
/// The signature middleware has already authenticated the payload by the time this handler runs; the event is
/// trusted here. Completions are the authoritative "paid" signal and drive fulfillment. Responses follow Stripe's
/// redelivery contract: a 2xx acknowledges the event, anything else causes Stripe to retry it later. So
/// permanent conditions (unknown session, already-closed session) are acknowledged, and only transient storage
/// failures are surfaced as errors.
pub async fn stripe_webhook<B>(
    req: HttpRequest,
    body: web::Json<Event>,
    api: web::Data<FulfillmentApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PixelGatewayDatabase,
{
    let event = body.into_inner();
    let peer = get_remote_ip(&req, options.use_x_forwarded_for, options.use_forwarded);
    trace!("💳️ Received webhook event {} ({}) from {peer:?}", event.id, event.event_type);
    let session = event.data.object;
    let result = match event.event_type.as_str() {
        "checkout.session.completed" => match api.process_completed_session(&session.id).await {
            Ok(fulfillment) => {
                let a = fulfillment.assignment();
                JsonResponse::success(format!("Cell {} assigned colour {}", a.position, a.color))
            },
            Err(FulfillmentError::UnknownSession(id)) => {
                warn!("💳️ Ignoring completion for unknown session {id}");
                JsonResponse::failure("Unknown session.")
            },
            Err(FulfillmentError::SessionAlreadyTerminal(id, status)) => {
                info!("💳️ Completion for session {id} arrived after it was already {status}. Ignoring.");
                JsonResponse::failure(format!("Session is already {status}."))
            },
            Err(e @ (FulfillmentError::StorageUnavailable(_) | FulfillmentError::CellWriteConflict(_))) => {
                // Let the gateway redeliver; the reconciliation pass also repairs stragglers.
                warn!("💳️ Could not fulfil session {} right now: {e}", session.id);
                return Err(ServerError::BackendError(e.to_string()));
            },
            Err(e) => {
                warn!("💳️ Unexpected error while handling completion for session {}: {e}", session.id);
                return Err(ServerError::BackendError(e.to_string()));
            },
        },
        "checkout.session.expired" => match api.process_closed_session(&session.id, SessionStatus::Expired).await {
            Ok(Some(s)) => JsonResponse::success(format!("Session #{} expired.", s.id)),
            Ok(None) => {
                debug!("💳️ Expiry for session {} had no open session to close.", session.id);
                JsonResponse::success("Nothing to do.")
            },
            Err(e) => {
                warn!("💳️ Could not close session {}: {e}", session.id);
                return Err(ServerError::BackendError(e.to_string()));
            },
        },
        other => {
            debug!("💳️ Ignoring unhandled event type {other}");
            JsonResponse::success("Event type not handled.")
        },
    };
    Ok(HttpResponse::Ok().json(result))
}
