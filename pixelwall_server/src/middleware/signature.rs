//! Stripe signature middleware for Actix Web.
//!
//! Stripe signs every webhook delivery with a `Stripe-Signature` header: a timestamp and one or more HMAC-SHA256
//! signatures over `"{timestamp}.{raw body}"`, keyed with the endpoint's webhook secret.
//!
//! Wrap the webhook routes with this middleware to reject forged or stale deliveries before any handler sees
//! them. The raw body is consumed for verification and re-injected afterwards, so handlers can still deserialise
//! the payload as usual.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use chrono::Utc;
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use pxw_common::Secret;
use stripe_tools::verify_signature;

const SIGNATURE_HEADER: &str = "Stripe-Signature";

pub struct StripeSignatureMiddlewareFactory {
    secret: Secret<String>,
    /// Maximum age, in seconds, of the signature timestamp.
    tolerance: i64,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl StripeSignatureMiddlewareFactory {
    pub fn new(secret: Secret<String>, tolerance: i64, enabled: bool) -> Self {
        StripeSignatureMiddlewareFactory { secret, tolerance, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for StripeSignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = StripeSignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StripeSignatureMiddlewareService {
            secret: self.secret.clone(),
            tolerance: self.tolerance,
            enabled: self.enabled,
            service: Rc::new(service),
        }))
    }
}

pub struct StripeSignatureMiddlewareService<S> {
    secret: Secret<String>,
    tolerance: i64,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for StripeSignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        let tolerance = self.tolerance;
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking signature for request");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            let header = req
                .headers()
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    warn!("🔐️ No signature found in request. Denying access.");
                    ErrorForbidden("No signature found.")
                })?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            match verify_signature(&secret, &header, data.as_ref(), tolerance, Utc::now().timestamp()) {
                Ok(()) => {
                    trace!("🔐️ Signature check for request ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Invalid signature in request: {e}. Denying access.");
                    Err(ErrorForbidden("Invalid signature."))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
