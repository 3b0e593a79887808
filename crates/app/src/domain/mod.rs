//! Pricebook Domain Concerns

pub mod catalog;
pub mod orders;
pub mod price_lists;
pub mod pricing;
pub mod promotions;
pub mod redemptions;
pub mod tenants;
