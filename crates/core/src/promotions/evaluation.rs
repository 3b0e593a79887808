//! Promotion Evaluation

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use crate::{
    cart::CartSnapshot,
    ids::PromotionUuid,
    promotions::{
        EffectType, Promotion, PromotionError, compute_discount,
        matcher::{Usage, match_promotions},
        stacking::can_stack,
    },
};

/// A promotion accepted for a cart, with the amount it takes off.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDiscount {
    /// Promotion applied
    pub promotion: PromotionUuid,

    /// Promotion display name
    pub name: String,

    /// Coupon code, for coupon promotions
    pub code: Option<String>,

    /// Effect type
    pub effect_type: EffectType,

    /// Amount taken off. For free delivery this is the waived fee.
    pub amount: Money<'static, Currency>,

    /// The delivery fee is waived.
    pub free_delivery: bool,
}

/// Evaluate the promotion set against a cart and return the discounts that apply.
///
/// Eligible promotions are walked highest priority first. Discounts of zero are
/// dropped before stacking so they never occupy a slot; a promotion is then accepted
/// only if it and every accepted promotion allow each other. Discounts off the subtotal
/// are capped so their running sum never exceeds it. The result is advisory: nothing
/// is redeemed.
///
/// # Errors
///
/// - [`PromotionError::Lookup`]: usage collaborators could not be read.
/// - [`PromotionError::Discount`]: discount arithmetic failed.
pub fn evaluate_promotions(
    promotions: &[Promotion],
    cart: &CartSnapshot,
    now: Timestamp,
    usage: Usage<'_>,
) -> Result<Vec<AppliedDiscount>, PromotionError> {
    let eligible = match_promotions(promotions, cart, now, usage)?;

    let mut accepted: Vec<&Promotion> = Vec::with_capacity(eligible.len());
    let mut applied = Vec::with_capacity(eligible.len());
    let mut remaining = cart.subtotal().to_minor_units().max(0);

    for promotion in eligible {
        let discount = compute_discount(promotion, cart)?;

        if !discount.is_applicable() || !can_stack(promotion, &accepted) {
            continue;
        }

        let amount = if discount.free_delivery {
            discount.amount.to_minor_units()
        } else {
            discount.amount.to_minor_units().min(remaining)
        };

        if amount <= 0 {
            continue;
        }

        if !discount.free_delivery {
            remaining -= amount;
        }

        accepted.push(promotion);

        applied.push(AppliedDiscount {
            promotion: promotion.uuid,
            name: promotion.name.clone(),
            code: promotion.code.clone(),
            effect_type: promotion.effect_type(),
            amount: Money::from_minor(amount, cart.currency),
            free_delivery: discount.free_delivery,
        });
    }

    Ok(applied)
}
