use log::*;
use pxw_common::Secret;

const DEFAULT_API_URL: &str = "https://api.stripe.com";

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    /// Base URL for the Stripe API. Override this to point at stripe-mock in tests.
    pub api_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    /// Where Stripe redirects the customer after a successful payment.
    pub success_url: String,
    /// Where Stripe redirects the customer if they abandon the checkout.
    pub cancel_url: String,
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("PXW_STRIPE_API_URL").unwrap_or_else(|_| {
            info!("PXW_STRIPE_API_URL not set, using {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("PXW_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("PXW_STRIPE_SECRET_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("PXW_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("PXW_STRIPE_WEBHOOK_SECRET not set, using (probably useless) default");
            "whsec_00000000000000".to_string()
        }));
        let success_url = std::env::var("PXW_STRIPE_SUCCESS_URL").unwrap_or_else(|_| {
            warn!("PXW_STRIPE_SUCCESS_URL not set, using localhost default");
            "http://localhost:8360/thanks".to_string()
        });
        let cancel_url = std::env::var("PXW_STRIPE_CANCEL_URL").unwrap_or_else(|_| {
            warn!("PXW_STRIPE_CANCEL_URL not set, using localhost default");
            "http://localhost:8360/".to_string()
        });
        Self { api_url, secret_key, webhook_secret, success_url, cancel_url }
    }
}
