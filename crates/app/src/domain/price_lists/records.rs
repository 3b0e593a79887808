//! Price List Records

use jiff::Timestamp;
use pricebook::{ids::PriceListItemUuid, lookups::PriceListRecord};

/// Stored price list item.
#[derive(Debug, Clone)]
pub struct PriceListItemRecord {
    /// Record identifier
    pub uuid: PriceListItemUuid,

    /// Amount in minor units
    pub amount: i64,

    /// ISO currency code, when the record carries one
    pub currency: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl From<PriceListItemRecord> for PriceListRecord {
    fn from(record: PriceListItemRecord) -> Self {
        Self {
            uuid: record.uuid,
            amount: record.amount,
            currency: record.currency,
        }
    }
}
