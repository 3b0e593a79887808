//! Order Data

use jiff::Timestamp;
use pricebook::ids::{OrderUuid, UserUuid};

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// UUID to assign to the order row.
    pub uuid: OrderUuid,

    /// Customer, absent for guest checkouts.
    pub user: Option<UserUuid>,

    /// When the order was placed.
    pub placed_at: Timestamp,
}
