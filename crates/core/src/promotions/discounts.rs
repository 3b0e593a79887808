//! Discounts

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    cart::CartSnapshot,
    promotions::{BuyXGetY, Promotion, PromotionEffect},
};

/// Errors specific to discount calculations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage calculation could not be represented in minor units.
    #[error("percentage conversion overflowed")]
    PercentConversion,

    /// Amounts overflowed minor-unit arithmetic.
    #[error("discount arithmetic overflowed")]
    Overflow,
}

/// Discount produced by one promotion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discount {
    /// Amount taken off; the delivery fee for free-delivery effects
    pub amount: Money<'static, Currency>,

    /// The caller should zero the delivery fee instead of subtracting `amount`.
    pub free_delivery: bool,
}

impl Discount {
    fn off_subtotal(amount: i64, currency: &'static Currency) -> Self {
        Self {
            amount: Money::from_minor(amount, currency),
            free_delivery: false,
        }
    }

    /// Whether the discount has any effect.
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        self.amount.to_minor_units() > 0
    }
}

/// Compute the discount `promotion` gives on `cart`. Eligibility is not checked here.
///
/// - percentage: `floor(subtotal * clamp(value, 0, 100) / 100)`
/// - fixed: `value`, never more than the subtotal and never negative
/// - free delivery: the current delivery fee, flagged so the fee is zeroed
/// - buy-x-get-y: free units priced at the cheapest qualifying unit, capped at the
///   subtotal, with no credit for incomplete groups
///
/// # Errors
///
/// Returns a [`DiscountError`] when amounts overflow.
pub fn compute_discount(
    promotion: &Promotion,
    cart: &CartSnapshot,
) -> Result<Discount, DiscountError> {
    let subtotal = cart.subtotal().to_minor_units();
    let currency = cart.currency;

    match &promotion.effect {
        PromotionEffect::Percentage { value } => {
            let amount = percentage_of(subtotal, *value)?;

            Ok(Discount::off_subtotal(amount, currency))
        }
        PromotionEffect::Fixed { value } => {
            Ok(Discount::off_subtotal((*value).clamp(0, subtotal.max(0)), currency))
        }
        PromotionEffect::FreeDelivery => Ok(Discount {
            amount: cart.delivery_fee,
            free_delivery: true,
        }),
        PromotionEffect::Bxgy { bxgy } => {
            let amount = buy_x_get_y(promotion, *bxgy, cart)?;

            Ok(Discount::off_subtotal(amount.min(subtotal), currency))
        }
    }
}

fn percentage_of(subtotal: i64, percent: Decimal) -> Result<i64, DiscountError> {
    let percent = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

    Decimal::from(subtotal)
        .checked_mul(percent)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .and_then(|amount| amount.floor().to_i64())
        .ok_or(DiscountError::PercentConversion)
}

fn buy_x_get_y(
    promotion: &Promotion,
    bxgy: BuyXGetY,
    cart: &CartSnapshot,
) -> Result<i64, DiscountError> {
    if bxgy.buy_qty == 0 || bxgy.get_qty == 0 {
        return Ok(0);
    }

    let mut quantity: u64 = 0;
    let mut cheapest: Option<i64> = None;

    for line in cart
        .lines
        .iter()
        .filter(|line| promotion.rules.matches_line(line))
    {
        quantity = quantity.saturating_add(u64::from(line.quantity));

        let unit = line.unit_price.to_minor_units();

        cheapest = Some(cheapest.map_or(unit, |current| current.min(unit)));
    }

    let group = u64::from(bxgy.buy_qty) + u64::from(bxgy.get_qty);

    let Some(cheapest) = cheapest.filter(|_| quantity >= group) else {
        return Ok(0);
    };

    let free_units = (quantity / group)
        .checked_mul(u64::from(bxgy.get_qty))
        .and_then(|units| i64::try_from(units).ok())
        .ok_or(DiscountError::Overflow)?;

    free_units
        .checked_mul(cheapest.max(0))
        .ok_or(DiscountError::Overflow)
}
