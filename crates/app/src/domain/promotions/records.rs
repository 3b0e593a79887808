//! Promotions Records

use jiff::Timestamp;
use pricebook::promotions::Promotion;

/// Promotion Record
#[derive(Debug, Clone)]
pub struct PromotionRecord {
    pub promotion: Promotion,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}
