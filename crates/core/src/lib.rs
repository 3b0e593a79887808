//! Pricebook
//!
//! Pricebook prices restaurant cart lines from time-bounded price entries, variants and
//! modifiers, then layers promotions over the cart and records which ones were redeemed.

pub mod cart;
pub mod catalog;
pub mod fixtures;
pub mod ids;
pub mod lookups;
pub mod modifiers;
pub mod prelude;
pub mod prices;
pub mod pricing;
pub mod promotions;
pub mod quote;
pub mod redemptions;
pub mod variants;
