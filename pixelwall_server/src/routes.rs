//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will
//! cause the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation
//! (e.g. I/O, database operations, etc.) should be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use pixelwall_engine::{
    traits::{CanvasManagement, PixelGatewayDatabase},
    CanvasApi,
    CheckoutApi,
};
use pxw_common::HexColor;

use crate::{
    config::ServerOptions,
    data_objects::{ActivityEntry, ActivityParams, CheckoutRequest, CheckoutResponse, GridCell},
    errors::ServerError,
    integrations::stripe::PaymentGateway,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/checkout" impl PixelGatewayDatabase, PaymentGateway);
/// Route handler for the checkout endpoint
///
/// The client supplies the colour it wants to paint with; everything else is decided server-side. The price is
/// quoted from the colour, the session is recorded before the gateway is contacted, and the gateway's session id
/// and hosted payment URL are stored against the session before they are returned to the client.
///
/// Note that no cell is chosen here. The cell is drawn at fulfillment time, when the payment actually completes.
pub async fn checkout<B, G>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B>>,
    gateway: web::Data<G>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: PixelGatewayDatabase,
    G: PaymentGateway,
{
    let request = body.into_inner();
    let color = HexColor::parse(&request.color)?;
    debug!("🛒️ POST checkout for colour {color}");
    let session = api.open_session(color).await?;
    let expires_at = chrono::Utc::now() + options.session_timeout;
    let gateway_session = gateway.create_payment_session(&session, expires_at).await.map_err(|e| {
        warn!("🛒️ The payment gateway rejected session #{}: {e}", session.id);
        ServerError::from(e)
    })?;
    let session = api.attach_gateway_session(session.id, &gateway_session.id, &gateway_session.redirect_url).await?;
    info!("🛒️ Session #{} ready for payment as {}", session.id, gateway_session.id);
    let response = CheckoutResponse {
        session_id: gateway_session.id,
        redirect_url: gateway_session.redirect_url,
        amount: session.price.value(),
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Grid  ----------------------------------------------------
route!(grid => Get "/grid" impl CanvasManagement);
/// Route handler for the grid endpoint
///
/// Returns the full canvas as a bare JSON array of cells in position order, from one consistent snapshot. Blank
/// cells are included with an empty colour string so that the client can render the whole grid without position
/// arithmetic.
pub async fn grid<B: CanvasManagement>(api: web::Data<CanvasApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET grid");
    let cells = api.grid().await?.into_iter().map(GridCell::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(cells))
}

//----------------------------------------------   Activity  ----------------------------------------------------
route!(activity => Get "/activity" impl CanvasManagement);
/// Route handler for the activity endpoint
///
/// Returns the most recent pixel assignments, newest first. The `limit` query parameter caps the result; it
/// defaults to 50 and is clamped to 200.
pub async fn activity<B: CanvasManagement>(
    query: web::Query<ActivityParams>,
    api: web::Data<CanvasApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    trace!("💻️ GET activity (limit: {:?})", params.limit);
    let entries = api.activity(params.limit).await?.into_iter().map(ActivityEntry::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(entries))
}
