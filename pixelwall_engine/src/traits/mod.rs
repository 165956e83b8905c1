//! Interface contracts for pixelwall engine storage backends.
//!
//! The module defines the behaviour a database backend needs to expose in order to be supported by the
//! Pixelwall Engine.
//!
//! * [`PixelGatewayDatabase`] defines the write path: session lifecycle and the transactional fulfillment step
//!   that is the only place the cell population and the assignment ledger are mutated.
//! * [`CanvasManagement`] provides the read-only view of the canvas and the fulfillment ledger that the query
//!   surface polls.
mod canvas_management;
mod pixel_gateway_database;

pub use canvas_management::{CanvasApiError, CanvasManagement};
pub use pixel_gateway_database::{FulfillmentError, PixelGatewayDatabase};
