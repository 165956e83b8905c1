use log::*;
use pxw_common::{Cents, HexColor};

use crate::{
    db_types::{NewPixelSession, PixelSession},
    pricing::price_for_color,
    traits::{FulfillmentError, PixelGatewayDatabase},
};

/// `CheckoutApi` is the write path for starting a purchase. It quotes the price for the requested colour, records
/// the session before the gateway is ever contacted, and links the gateway's response back to the session
/// afterwards.
#[derive(Debug, Clone)]
pub struct CheckoutApi<B> {
    db: B,
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CheckoutApi<B>
where B: PixelGatewayDatabase
{
    /// The price charged for painting a cell in the given colour. Quoted server-side only; nothing the client
    /// sends can influence it.
    pub fn quote(&self, color: &HexColor) -> Cents {
        price_for_color(color.as_str())
    }

    /// Create a new `Open` session with the price locked in.
    ///
    /// The session row is the durable record of the purchase. It is written *before* the gateway call, so a
    /// gateway notification can never reference a session we do not know about.
    pub async fn open_session(&self, color: HexColor) -> Result<PixelSession, FulfillmentError> {
        let price = self.quote(&color);
        let session = self.db.insert_session(NewPixelSession { color, price }).await?;
        debug!("🛒️ Session #{} opened: {} for {}", session.id, session.color, session.price);
        Ok(session)
    }

    /// Record the gateway-issued session id and hosted payment page URL against an open session.
    pub async fn attach_gateway_session(
        &self,
        id: i64,
        gateway_session_id: &str,
        redirect_url: &str,
    ) -> Result<PixelSession, FulfillmentError> {
        self.db.attach_gateway_session(id, gateway_session_id, redirect_url).await
    }

    pub async fn fetch_session(&self, gateway_session_id: &str) -> Result<Option<PixelSession>, FulfillmentError> {
        self.db.fetch_session_by_gateway_id(gateway_session_id).await
    }
}
