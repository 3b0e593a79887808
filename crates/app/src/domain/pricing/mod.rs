//! Pricing
//!
//! Loads one tenant's catalog, price list, promotions and usage counts, then prices
//! carts with the in-memory engine.

mod errors;
pub mod service;

pub use errors::PricingServiceError;
pub use service::*;
