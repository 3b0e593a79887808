//! Order Records

use jiff::Timestamp;
use pricebook::ids::{OrderUuid, UserUuid};

/// Order Record
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub user: Option<UserUuid>,
    pub placed_at: Timestamp,
    pub created_at: Timestamp,
}
