use chrono::{DateTime, Duration, Utc};
use mockall::mock;
use pixelwall_engine::{
    db_types::{Assignment, Canvas, Cell, Fulfillment, NewPixelSession, PixelSession, SessionStatus},
    traits::{CanvasApiError, CanvasManagement, FulfillmentError, PixelGatewayDatabase},
};
use stripe_tools::StripeApiError;

use crate::integrations::stripe::{GatewaySession, PaymentGateway};

mock! {
    pub PixelBackend {}
    impl CanvasManagement for PixelBackend {
        async fn fetch_canvas(&self) -> Result<Option<Canvas>, CanvasApiError>;
        async fn fetch_all_cells(&self) -> Result<Vec<Cell>, CanvasApiError>;
        async fn fetch_cell(&self, position: i64) -> Result<Option<Cell>, CanvasApiError>;
        async fn fetch_recent_assignments(&self, limit: i64) -> Result<Vec<Assignment>, CanvasApiError>;
    }
    impl PixelGatewayDatabase for PixelBackend {
        fn url(&self) -> &str;
        async fn initialize_canvas(&self, side_length: i64) -> Result<Canvas, CanvasApiError>;
        async fn insert_session(&self, session: NewPixelSession) -> Result<PixelSession, FulfillmentError>;
        async fn attach_gateway_session(&self, id: i64, gateway_session_id: &str, redirect_url: &str) -> Result<PixelSession, FulfillmentError>;
        async fn fetch_session_by_gateway_id(&self, gateway_session_id: &str) -> Result<Option<PixelSession>, FulfillmentError>;
        async fn fulfill_session(&self, gateway_session_id: &str, position: i64) -> Result<Fulfillment, FulfillmentError>;
        async fn close_session(&self, gateway_session_id: &str, status: SessionStatus) -> Result<Option<PixelSession>, FulfillmentError>;
        async fn expire_open_sessions(&self, older_than: Duration) -> Result<Vec<PixelSession>, FulfillmentError>;
        async fn fetch_unfulfilled_sessions(&self) -> Result<Vec<PixelSession>, FulfillmentError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_payment_session(&self, session: &PixelSession, expires_at: DateTime<Utc>) -> Result<GatewaySession, StripeApiError>;
        async fn expire_payment_session(&self, gateway_session_id: &str) -> Result<(), StripeApiError>;
    }
}
