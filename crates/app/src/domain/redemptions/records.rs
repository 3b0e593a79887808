//! Redemption Records

use jiff::Timestamp;
use pricebook::{
    ids::{OrderUuid, PromotionUuid, RedemptionUuid, TenantUuid, UserUuid},
    lookups::{LookupError, find_currency},
    redemptions::Redemption,
};
use rusty_money::Money;

/// Stored redemption row.
#[derive(Debug, Clone)]
pub struct RedemptionRecord {
    pub uuid: RedemptionUuid,
    pub tenant: TenantUuid,
    pub promotion: PromotionUuid,
    pub user: Option<UserUuid>,
    pub order: OrderUuid,

    /// Discount granted, in minor units of `currency`
    pub amount: i64,

    /// ISO currency code
    pub currency: String,

    pub created_at: Timestamp,
}

impl RedemptionRecord {
    /// Convert into the engine's redemption type.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UnknownCurrency`] when the stored code is not an ISO currency.
    pub fn into_redemption(self) -> Result<Redemption, LookupError> {
        let currency = find_currency(&self.currency)?;

        Ok(Redemption {
            uuid: self.uuid,
            tenant: self.tenant,
            promotion: self.promotion,
            user: self.user,
            order: self.order,
            amount: Money::from_minor(self.amount, currency),
            created_at: self.created_at,
        })
    }
}
