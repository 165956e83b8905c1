//! The pricing engine.
//!
//! Pricing is a pure, total function over arbitrary input strings. The same function runs on the quote path and
//! on any later re-derivation, so a session's locked-in price can always be audited against its requested colour.
use pxw_common::{Cents, HexColor};

/// The price of any ordinary colour.
pub const BASE_PRICE_CENTS: i64 = 50;

/// Rare colours command a premium. Keys are in canonical `#rrggbb` lowercase form; comparison is therefore
/// case-insensitive for callers, since [`HexColor::parse`] normalises its input.
const RARE_COLOR_PRICES: [(&str, i64); 3] = [
    ("#ffd700", 500), // gold
    ("#c0c0c0", 200), // silver
    ("#b87333", 100), // copper
];

/// Price a requested colour. Malformed or unrecognised colours fall back to the base price rather than erroring;
/// input validation is the checkout layer's job, not the pricing engine's.
pub fn price_for_color(color: &str) -> Cents {
    let canonical = match HexColor::parse(color) {
        Ok(c) => c,
        Err(_) => return Cents::from(BASE_PRICE_CENTS),
    };
    let price = RARE_COLOR_PRICES
        .iter()
        .find(|(rare, _)| *rare == canonical.as_str())
        .map(|(_, price)| *price)
        .unwrap_or(BASE_PRICE_CENTS);
    Cents::from(price)
}
