//! Pixelwall Engine
//!
//! The Pixelwall Engine is the core of a service that lets anyone buy the right to colour one cell of a shared
//! canvas. This library is provider-agnostic: it knows nothing about HTTP or about any specific payment gateway.
//!
//! The library is divided into two main sections:
//! 1. Storage management and control. SQLite is the supported backend (Postgres is feature-gated but not wired
//!    up). You should never need to access the database directly; use the public APIs instead. The exception is
//!    the data types used in the database, which are defined in the [`db_types`] module and are public.
//! 2. The engine public API ([`CheckoutApi`], [`FulfillmentApi`], [`CanvasApi`]). Specific backends need to
//!    implement the traits in [`traits`] in order to act as a backend for the Pixelwall Server.
//!
//! The engine also emits events when certain actions occur, most importantly [`events::PixelAssignedEvent`] after
//! a payment has been fulfilled with a new cell assignment. A simple hook framework lets you subscribe to these
//! events and perform custom actions.
pub mod db_types;
pub mod events;
pub mod pricing;
mod pwe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use pwe_api::{CanvasApi, CheckoutApi, FulfillmentApi};
pub use traits::{CanvasApiError, CanvasManagement, FulfillmentError, PixelGatewayDatabase};
