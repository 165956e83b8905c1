//! A minimal client for the Stripe Checkout API, covering exactly the surface the pixelwall server needs:
//! creating, retrieving and expiring Checkout Sessions, and verifying `Stripe-Signature` headers on incoming
//! webhook events.
mod api;
mod config;
mod error;
mod signature;

mod data_objects;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{CheckoutSession, Event, EventData, NewCheckoutSession};
pub use error::StripeApiError;
pub use signature::{compute_signature, verify_signature, SignatureError, SignatureHeader};
