use std::fmt::Display;

use chrono::{DateTime, Utc};
use pixelwall_engine::db_types::{Assignment, Cell};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// The requested colour, e.g. "#ff8800". A leading '#' is optional and case does not matter.
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// The gateway's identifier for the payment session.
    pub session_id: String,
    /// The hosted payment page the client should redirect the customer to.
    pub redirect_url: String,
    /// The price, in cents, locked in for this purchase.
    pub amount: i64,
}

/// One element of the grid read. The endpoint returns a bare JSON array of these, ordered by position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridCell {
    pub position: i64,
    pub color: String,
}

impl From<Cell> for GridCell {
    fn from(cell: Cell) -> Self {
        Self { position: cell.position, color: cell.color }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// The cell that was painted.
    pub pixel_id: i64,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl From<Assignment> for ActivityEntry {
    fn from(a: Assignment) -> Self {
        Self { pixel_id: a.position, color: a.color.into_string(), created_at: a.created_at }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
