use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::future::{ok, Either};
use log::*;
use pixelwall_engine::{
    events::{AssignmentHook, AssignmentListener, AssignmentNotifier},
    CanvasApi,
    CheckoutApi,
    FulfillmentApi,
    PixelGatewayDatabase,
    SqliteDatabase,
};
use stripe_tools::StripeApi;

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    helpers::get_remote_ip,
    middleware::StripeSignatureMiddlewareFactory,
    routes::{health, ActivityRoute, CheckoutRoute, GridRoute},
    stripe_routes::StripeWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.initialize_canvas(config.canvas_side_length)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let hook: AssignmentHook = Arc::new(|ev| {
        Box::pin(async move {
            let a = ev.assignment;
            info!("📬️ Pixel assigned: cell {} is now {} (session #{})", a.position, a.color, a.session_id);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let (notifier, listener) = AssignmentListener::new(10, hook);
    let _listener_handle = listener.spawn();

    let stripe_api =
        StripeApi::new(config.stripe_config.api.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let _expiry_handle =
        start_expiry_worker(db.clone(), notifier.clone(), stripe_api.clone(), config.session_timeout);

    let srv = create_server_instance(config, db, notifier, stripe_api)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    notifier: AssignmentNotifier,
    stripe_api: StripeApi,
) -> Result<Server, ServerError> {
    let bind_address = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone());
        let canvas_api = CanvasApi::new(db.clone());
        let fulfillment_api = FulfillmentApi::new(db.clone(), notifier.clone());
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pxw::access_log"))
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(canvas_api))
            .app_data(web::Data::new(fulfillment_api))
            .app_data(web::Data::new(stripe_api.clone()))
            .app_data(web::Data::new(options));
        let api_scope = web::scope("/api")
            .service(CheckoutRoute::<SqliteDatabase, StripeApi>::new())
            .service(GridRoute::<SqliteDatabase>::new())
            .service(ActivityRoute::<SqliteDatabase>::new());
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let stripe_whitelist = config.stripe_config.whitelist.clone();
        let signature_middleware = StripeSignatureMiddlewareFactory::new(
            config.stripe_config.webhook_secret.clone(),
            config.stripe_config.signature_tolerance,
            config.stripe_config.signature_checks,
        );
        let stripe_scope = web::scope("/stripe")
            .wrap(signature_middleware)
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                let whitelisted = match (peer_ip, &stripe_whitelist) {
                    (Some(ip), Some(whitelist)) => {
                        debug!("Stripe webhook from {ip}");
                        whitelist.contains(&ip)
                    },
                    (_, None) => true,
                    (None, Some(_)) => {
                        warn!("No IP address found in stripe remote peer request, denying access.");
                        false
                    },
                };
                if whitelisted {
                    Either::Left(srv.call(req))
                } else {
                    Either::Right(ok(req.error_response(ServerError::ForbiddenPeer)))
                }
            })
            .service(StripeWebhookRoute::<SqliteDatabase>::new());
        app.service(health).service(api_scope).service(stripe_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_address)?
    .run();
    Ok(srv)
}
