//! Catalog Records

use jiff::Timestamp;
use pricebook::{catalog::CatalogItem, ids::CatalogItemUuid};

/// Stored catalog item.
#[derive(Debug, Clone)]
pub struct CatalogItemRecord {
    pub uuid: CatalogItemUuid,
    pub item: CatalogItem,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}
