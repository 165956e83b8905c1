use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use pxw_common::{Cents, HexColor};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// The colour of a cell nobody has bought yet. Never a valid purchasable colour, so it is always distinguishable
/// from the result of an assignment.
pub const BLANK_COLOR: &str = "";

/// The largest side length a canvas may be created with. Keeps `cell_count` well inside `i64` and the bulk cell
/// insert at startup tractable.
pub const MAX_SIDE_LENGTH: i64 = 4_096;

//--------------------------------------       Canvas        ---------------------------------------------------------
/// The single canvas row. `side_length` is fixed at creation and immutable thereafter.
#[derive(Debug, Clone, FromRow)]
pub struct Canvas {
    pub id: i64,
    pub side_length: i64,
    pub created_at: DateTime<Utc>,
}

impl Canvas {
    /// Total number of cells. Positions are densely assigned in `[0, cell_count)`. Side lengths are validated
    /// against [`MAX_SIDE_LENGTH`] at creation, so the product cannot overflow.
    pub fn cell_count(&self) -> i64 {
        self.side_length * self.side_length
    }
}

//--------------------------------------        Cell         ---------------------------------------------------------
/// One cell of the canvas. `version` is the optimistic concurrency token and increments on every successful
/// colour write.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Cell {
    pub position: i64,
    pub color: String,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        self.color == BLANK_COLOR
    }
}

//--------------------------------------   SessionStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum SessionStatus {
    /// The session has been created and no gateway event has arrived yet.
    Open,
    /// The gateway reported a completed payment for this session.
    Completed,
    /// The session timed out without a completion event.
    Expired,
    /// The customer abandoned the checkout, or the gateway cancelled the session.
    Cancelled,
}

impl SessionStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Open)
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Open => write!(f, "Open"),
            SessionStatus::Completed => write!(f, "Completed"),
            SessionStatus::Expired => write!(f, "Expired"),
            SessionStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid session status: {0}")]
pub struct ConversionError(String);

impl FromStr for SessionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Completed" => Ok(Self::Completed),
            "Expired" => Ok(Self::Expired),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for SessionStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid session status: {value}. But this conversion cannot fail. Defaulting to Open");
            SessionStatus::Open
        })
    }
}

//--------------------------------------   NewPixelSession   ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewPixelSession {
    /// The colour the buyer requested, already validated and normalised.
    pub color: HexColor,
    /// The price locked in at quote time. Never recomputed from a later client-supplied value.
    pub price: Cents,
}

//--------------------------------------    PixelSession     ---------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct PixelSession {
    pub id: i64,
    /// The identifier issued by the payment gateway. `None` until the gateway has responded to session creation.
    pub gateway_session_id: Option<String>,
    pub color: HexColor,
    pub price: Cents,
    pub status: SessionStatus,
    /// The gateway's hosted payment page for this session.
    pub redirect_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     Assignment      ---------------------------------------------------------
/// One entry in the fulfillment ledger. Immutable once created; the unique `session_id` is what makes fulfillment
/// exactly-once.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Assignment {
    pub id: i64,
    pub session_id: i64,
    pub position: i64,
    pub color: HexColor,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     Fulfillment     ---------------------------------------------------------
/// The outcome of processing a payment completion event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fulfillment {
    /// A new assignment was created and the cell was painted.
    Assigned(Assignment),
    /// The session had already been fulfilled; this is the existing ledger entry (idempotent replay).
    AlreadyFulfilled(Assignment),
}

impl Fulfillment {
    pub fn assignment(&self) -> &Assignment {
        match self {
            Fulfillment::Assigned(a) | Fulfillment::AlreadyFulfilled(a) => a,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Fulfillment::Assigned(_))
    }
}
