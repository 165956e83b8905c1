use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{config::StripeConfig, data_objects::NewCheckoutSession, CheckoutSession, StripeApiError};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.secret_key.reveal()))
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Issue a request against the Stripe REST API. POST bodies are form-encoded, responses are JSON.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !form.is_empty() {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    /// Create a new Checkout Session and return Stripe's record of it, including the hosted payment URL.
    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, StripeApiError> {
        debug!("Creating checkout session for {} ({})", session.product_name, session.amount);
        let form = session.to_form();
        let result = self.rest_query::<CheckoutSession>(Method::POST, "/v1/checkout/sessions", &form).await?;
        if result.url.is_none() {
            warn!("Checkout session {} was created without a redirect URL", result.id);
        }
        info!("Created checkout session {}", result.id);
        Ok(result)
    }

    pub async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, StripeApiError> {
        let path = format!("/v1/checkout/sessions/{session_id}");
        debug!("Fetching checkout session {session_id}");
        self.rest_query::<CheckoutSession>(Method::GET, &path, &[]).await
    }

    /// Expire an open Checkout Session so that the customer can no longer pay against it.
    pub async fn expire_checkout_session(&self, session_id: &str) -> Result<CheckoutSession, StripeApiError> {
        let path = format!("/v1/checkout/sessions/{session_id}/expire");
        debug!("Expiring checkout session {session_id}");
        let result = self.rest_query::<CheckoutSession>(Method::POST, &path, &[]).await?;
        info!("Expired checkout session {session_id}");
        Ok(result)
    }
}
