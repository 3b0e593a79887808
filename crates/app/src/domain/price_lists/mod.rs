//! Price Lists

mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::PriceListsServiceError;
pub use service::*;
