//! Glue between the pixelwall checkout flow and Stripe's Checkout Session API.
use chrono::{DateTime, Utc};
use log::*;
use pixelwall_engine::db_types::PixelSession;
use stripe_tools::{NewCheckoutSession, StripeApi, StripeApiError};

/// A payment session as reported by the gateway after creation.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub id: String,
    pub redirect_url: String,
}

/// The gateway operations the checkout flow needs. [`StripeApi`] is the production implementation; endpoint tests
/// substitute a mock.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Create a hosted payment session for the given pixel session, expiring at `expires_at`.
    async fn create_payment_session(
        &self,
        session: &PixelSession,
        expires_at: DateTime<Utc>,
    ) -> Result<GatewaySession, StripeApiError>;

    /// Expire an open payment session so the customer can no longer pay against it. Best effort; sessions also
    /// expire on the gateway side via the `expires_at` set at creation.
    async fn expire_payment_session(&self, gateway_session_id: &str) -> Result<(), StripeApiError>;
}

impl PaymentGateway for StripeApi {
    async fn create_payment_session(
        &self,
        session: &PixelSession,
        expires_at: DateTime<Utc>,
    ) -> Result<GatewaySession, StripeApiError> {
        let new_session = NewCheckoutSession {
            product_name: format!("Pixel ({})", session.color),
            amount: session.price,
            client_reference_id: session.id.to_string(),
            success_url: self.config().success_url.clone(),
            cancel_url: self.config().cancel_url.clone(),
            expires_at,
        };
        let created = self.create_checkout_session(&new_session).await?;
        let redirect_url = created.url.ok_or_else(|| {
            error!("💳️ Stripe created session {} without a redirect URL", created.id);
            StripeApiError::EmptyResponse
        })?;
        debug!("💳️ Created Stripe checkout session {} for pixel session #{}", created.id, session.id);
        Ok(GatewaySession { id: created.id, redirect_url })
    }

    async fn expire_payment_session(&self, gateway_session_id: &str) -> Result<(), StripeApiError> {
        self.expire_checkout_session(gateway_session_id).await?;
        Ok(())
    }
}
