//! # Pixelwall server
//! This module hosts the HTTP front of the pixelwall. It is responsible for:
//! * Starting pixel purchases and handing customers off to the payment gateway's hosted checkout.
//! * Listening for incoming webhook notifications from the gateway and driving fulfillment.
//! * Serving the canvas and the recent-activity feed to viewers.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/checkout`: Start a pixel purchase.
//! * `/api/grid`: The full canvas, from one consistent snapshot.
//! * `/api/activity`: The most recent pixel assignments.
//! * `/stripe/webhook`: The webhook route for receiving checkout session events from Stripe.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod stripe_routes;

#[cfg(test)]
mod endpoint_tests;
