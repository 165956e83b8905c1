mod cents;
mod color;
pub mod helpers;
mod secret;

pub use cents::Cents;
pub use color::{ColorError, HexColor};
pub use secret::Secret;
