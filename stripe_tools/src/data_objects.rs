use chrono::{DateTime, Utc};
use pxw_common::Cents;
use serde::{Deserialize, Serialize};

/// The subset of Stripe's Checkout Session object that the pixelwall server cares about.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    /// The hosted payment page. Present while the session is open.
    #[serde(default)]
    pub url: Option<String>,
    /// One of `open`, `complete` or `expired`.
    #[serde(default)]
    pub status: Option<String>,
    /// One of `paid`, `unpaid` or `no_payment_required`.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Correlation token set at creation time; carries our internal session id.
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }
}

/// Parameters for creating a Checkout Session. Stripe's create endpoint is form-encoded, so this serialises to a
/// flat list of `(key, value)` pairs rather than JSON.
#[derive(Debug, Clone)]
pub struct NewCheckoutSession {
    pub product_name: String,
    pub amount: Cents,
    pub client_reference_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub expires_at: DateTime<Utc>,
}

// Stripe bounds for Checkout Session expiry.
const MIN_EXPIRY_SECS: i64 = 30 * 60;
const MAX_EXPIRY_SECS: i64 = 24 * 60 * 60;

impl NewCheckoutSession {
    pub fn to_form(&self) -> Vec<(String, String)> {
        let now = Utc::now().timestamp();
        let expires_at = self.expires_at.timestamp().clamp(now + MIN_EXPIRY_SECS, now + MAX_EXPIRY_SECS);
        vec![
            ("mode".to_string(), "payment".to_string()),
            ("client_reference_id".to_string(), self.client_reference_id.clone()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            ("expires_at".to_string(), expires_at.to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("line_items[0][price_data][currency]".to_string(), "usd".to_string()),
            ("line_items[0][price_data][unit_amount]".to_string(), self.amount.value().to_string()),
            ("line_items[0][price_data][product_data][name]".to_string(), self.product_name.clone()),
        ]
    }
}

/// Stripe's webhook event envelope. `data.object` is the Checkout Session the event refers to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub created: i64,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventData {
    pub object: CheckoutSession,
}
