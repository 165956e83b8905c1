mod canvas_api;
mod checkout_api;
mod fulfillment_api;

pub use canvas_api::CanvasApi;
pub use checkout_api::CheckoutApi;
pub use fulfillment_api::FulfillmentApi;
