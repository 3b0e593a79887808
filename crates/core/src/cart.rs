//! Carts

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    ids::{BranchUuid, CatalogItemUuid, CategoryUuid, UserUuid},
    pricing::{CartLine, PricedLine},
};

/// How the order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Delivered to the customer
    Delivery,

    /// Collected by the customer
    Pickup,

    /// Eaten on the premises
    DineIn,
}

/// Errors building a cart snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    /// Lines were priced in different currencies.
    #[error("currency mismatch: expected {expected}, found {actual}")]
    CurrencyMismatch {
        /// Currency of the cart
        expected: &'static str,
        /// Currency of the offending line
        actual: &'static str,
    },

    /// Totals overflowed minor-unit arithmetic.
    #[error("cart total overflowed")]
    Overflow,
}

/// A cart as submitted by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Fulfilment type
    pub service_type: ServiceType,

    /// Branch the order is placed with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchUuid>,

    /// Signed-in user, absent for guests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserUuid>,

    /// Coupon codes entered at checkout
    #[serde(default)]
    pub coupon_codes: Vec<String>,

    /// Delivery fee in minor units
    #[serde(default)]
    pub delivery_fee: i64,

    /// Requested lines
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

/// A priced line as seen by promotion evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshotLine {
    /// Item on the line
    pub catalog_item: CatalogItemUuid,

    /// Categories of the item at pricing time
    pub category_ids: SmallVec<[CategoryUuid; 2]>,

    /// Unit price
    pub unit_price: Money<'static, Currency>,

    /// Units
    pub quantity: u32,
}

impl CartSnapshotLine {
    /// `unit_price * quantity` in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] when the total does not fit.
    pub fn total_minor(&self) -> Result<i64, CartError> {
        self.unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::Overflow)
    }
}

impl From<&PricedLine> for CartSnapshotLine {
    fn from(line: &PricedLine) -> Self {
        Self {
            catalog_item: line.catalog_item,
            category_ids: line.snapshot.category_ids.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

/// Priced cart handed to promotion evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    /// Currency of every amount in the cart
    pub currency: &'static Currency,

    /// Fulfilment type
    pub service_type: ServiceType,

    /// Branch the order is placed with
    pub branch: Option<BranchUuid>,

    /// Signed-in user, absent for guests
    pub user: Option<UserUuid>,

    /// Coupon codes entered at checkout
    pub coupon_codes: Vec<String>,

    /// Current delivery fee
    pub delivery_fee: Money<'static, Currency>,

    /// Priced lines
    pub lines: Vec<CartSnapshotLine>,

    subtotal: Money<'static, Currency>,
}

impl CartSnapshot {
    /// Build a snapshot from already-priced lines.
    ///
    /// The cart takes the currency of its first line, or `fallback_currency` when empty.
    ///
    /// # Errors
    ///
    /// - [`CartError::CurrencyMismatch`]: lines disagree on currency.
    /// - [`CartError::Overflow`]: the subtotal does not fit in minor units.
    pub fn from_priced_lines(
        cart: &Cart,
        priced: &[PricedLine],
        fallback_currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let currency = priced.first().map_or(fallback_currency, |line| line.currency);

        if let Some(line) = priced.iter().find(|line| line.currency != currency) {
            return Err(CartError::CurrencyMismatch {
                expected: currency.iso_alpha_code,
                actual: line.currency.iso_alpha_code,
            });
        }

        let lines: Vec<CartSnapshotLine> = priced.iter().map(CartSnapshotLine::from).collect();

        let subtotal = lines.iter().try_fold(0_i64, |acc, line| {
            acc.checked_add(line.total_minor()?).ok_or(CartError::Overflow)
        })?;

        Ok(Self {
            currency,
            service_type: cart.service_type,
            branch: cart.branch,
            user: cart.user,
            coupon_codes: cart.coupon_codes.clone(),
            delivery_fee: Money::from_minor(cart.delivery_fee.max(0), currency),
            lines,
            subtotal: Money::from_minor(subtotal, currency),
        })
    }

    /// Sum of line totals, before discounts and delivery.
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::iso::{EUR, GBP};
    use testresult::TestResult;

    use super::*;
    use crate::{
        catalog::{CatalogItem, TranslatedLabel},
        lookups::InMemoryPriceList,
        prices::{PriceEntry, PriceKind, PriceSource},
        pricing::price_line,
    };

    fn item(amount: i64) -> CatalogItem {
        CatalogItem {
            uuid: CatalogItemUuid::new(),
            name: TranslatedLabel::en("Bread"),
            category_ids: SmallVec::new(),
            image: None,
            allergens: Vec::new(),
            dietary_flags: Vec::new(),
            prices: PriceSource::from_entries(vec![PriceEntry::new(PriceKind::Base, amount)]),
            variants: Vec::new(),
            modifier_groups: Vec::new(),
        }
    }

    fn cart() -> Cart {
        Cart {
            service_type: ServiceType::Delivery,
            branch: None,
            user: None,
            coupon_codes: Vec::new(),
            delivery_fee: 250,
            lines: Vec::new(),
        }
    }

    #[test]
    fn subtotal_sums_line_totals() -> TestResult {
        let now = Timestamp::now();
        let price_list = InMemoryPriceList::new();
        let bread = item(300);
        let butter = item(150);

        let priced = [
            price_line(&bread, &CartLine::new(bread.uuid).with_quantity(2), &price_list, EUR, now)?,
            price_line(&butter, &CartLine::new(butter.uuid), &price_list, EUR, now)?,
        ];

        let snapshot = CartSnapshot::from_priced_lines(&cart(), &priced, EUR)?;

        assert_eq!(snapshot.subtotal(), Money::from_minor(750, EUR));
        assert_eq!(snapshot.delivery_fee, Money::from_minor(250, EUR));
        assert_eq!(snapshot.lines.len(), 2);

        Ok(())
    }

    #[test]
    fn empty_cart_uses_fallback_currency() -> TestResult {
        let snapshot = CartSnapshot::from_priced_lines(&cart(), &[], GBP)?;

        assert_eq!(snapshot.currency, GBP);
        assert_eq!(snapshot.subtotal(), Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn mixed_currencies_are_rejected() -> TestResult {
        let now = Timestamp::now();
        let price_list = InMemoryPriceList::new();
        let bread = item(300);

        let priced = [
            price_line(&bread, &CartLine::new(bread.uuid), &price_list, EUR, now)?,
            price_line(&bread, &CartLine::new(bread.uuid), &price_list, GBP, now)?,
        ];

        assert_eq!(
            CartSnapshot::from_priced_lines(&cart(), &priced, EUR),
            Err(CartError::CurrencyMismatch {
                expected: "EUR",
                actual: "GBP",
            })
        );

        Ok(())
    }

    #[test]
    fn service_type_uses_snake_case() -> TestResult {
        let service: ServiceType = serde_norway::from_str("dine_in")?;

        assert_eq!(service, ServiceType::DineIn);

        Ok(())
    }
}
