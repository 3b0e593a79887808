//! Redemptions

mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::RedemptionsServiceError;
pub use service::*;
