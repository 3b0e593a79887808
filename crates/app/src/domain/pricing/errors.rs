//! Pricing service errors.

use pricebook::{pricing::PricingError, promotions::PromotionError, quote::QuoteError};
use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingServiceError {
    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Promotion(#[from] PromotionError),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    /// A stored row could not be turned into an engine value.
    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl PricingServiceError {
    /// Stable machine code, shared with the engine's own errors where one applies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pricing(error) | Self::Quote(QuoteError::Pricing(error)) => error.code(),
            Self::Promotion(error) | Self::Quote(QuoteError::Promotion(error)) => error.code(),
            Self::Quote(QuoteError::Cart(_) | QuoteError::Overflow) => "amountOverflow",
            Self::Quote(QuoteError::IO) => "ioError",
            Self::InvalidData => "invalidData",
            Self::Sql(_) => "storageUnavailable",
        }
    }
}

impl From<Error> for PricingServiceError {
    fn from(error: Error) -> Self {
        match error {
            Error::ColumnDecode { .. } | Error::Decode(_) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
