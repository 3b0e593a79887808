//! Promotion Matching
//!
//! Filters a tenant's promotions down to those whose gates all pass for a cart. A
//! promotion failing any gate is excluded outright; nothing is partially applied.

use std::{
    cmp::Reverse,
    fmt::{self, Debug, Formatter},
};

use jiff::Timestamp;

use crate::{
    cart::CartSnapshot,
    lookups::{LookupError, OrderHistory, RedemptionCounts},
    promotions::{Promotion, PromotionKind},
};

/// Usage collaborators consulted by the first-order and usage-limit gates.
///
/// Counts are point-in-time: a concurrent checkout can redeem between this check and
/// the ledger write.
#[derive(Clone, Copy)]
pub struct Usage<'u> {
    /// Prior order counts
    pub orders: &'u dyn OrderHistory,

    /// Redemption counts
    pub redemptions: &'u dyn RedemptionCounts,
}

impl<'u> Usage<'u> {
    /// Bundle the usage collaborators.
    pub fn new(orders: &'u dyn OrderHistory, redemptions: &'u dyn RedemptionCounts) -> Self {
        Self {
            orders,
            redemptions,
        }
    }
}

impl Debug for Usage<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Usage").finish_non_exhaustive()
    }
}

/// The gate a promotion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExclusionReason {
    /// Switched off
    Inactive,
    /// Not published
    Unpublished,
    /// Coupon promotion whose code was not entered
    CouponNotEntered,
    /// Before `starts_at`
    NotStarted,
    /// After `ends_at`
    Expired,
    /// Cart service type not allowed
    ServiceTypeNotAllowed,
    /// Cart branch not allowed
    BranchNotAllowed,
    /// No line matches the item or category scope
    NoQualifyingLines,
    /// Subtotal below the minimum order
    BelowMinimumOrder,
    /// The gate needs a signed-in user
    SignedInUserRequired,
    /// User has ordered before
    NotFirstOrder,
    /// Global usage limit reached
    UsageLimitReached,
    /// Per-user limit reached
    PerUserLimitReached,
}

/// Outcome of checking one promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Every gate passed
    Eligible,

    /// A gate failed
    Excluded(ExclusionReason),
}

fn coupon_entered(promotion: &Promotion, cart: &CartSnapshot) -> bool {
    cart.coupon_codes
        .iter()
        .any(|code| promotion.matches_code(code))
}

/// Gates that only need the promotion, the cart and the clock.
fn static_gates(
    promotion: &Promotion,
    cart: &CartSnapshot,
    now: Timestamp,
) -> Option<ExclusionReason> {
    let rules = &promotion.rules;

    if !promotion.is_active {
        return Some(ExclusionReason::Inactive);
    }

    if !promotion.is_published {
        return Some(ExclusionReason::Unpublished);
    }

    if promotion.kind == PromotionKind::Coupon && !coupon_entered(promotion, cart) {
        return Some(ExclusionReason::CouponNotEntered);
    }

    if rules.starts_at.is_some_and(|starts_at| now < starts_at) {
        return Some(ExclusionReason::NotStarted);
    }

    if rules.ends_at.is_some_and(|ends_at| now > ends_at) {
        return Some(ExclusionReason::Expired);
    }

    if let Some(scope) = &rules.scope {
        if !scope.service_types.is_empty() && !scope.service_types.contains(&cart.service_type) {
            return Some(ExclusionReason::ServiceTypeNotAllowed);
        }

        if !scope.branch_ids.is_empty()
            && !cart
                .branch
                .is_some_and(|branch| scope.branch_ids.contains(&branch))
        {
            return Some(ExclusionReason::BranchNotAllowed);
        }

        if scope.restricts_lines() && !cart.lines.iter().any(|line| scope.matches_line(line)) {
            return Some(ExclusionReason::NoQualifyingLines);
        }
    }

    if rules
        .min_order
        .is_some_and(|min_order| cart.subtotal().to_minor_units() < min_order.amount)
    {
        return Some(ExclusionReason::BelowMinimumOrder);
    }

    None
}

/// Check every gate for one promotion.
///
/// # Errors
///
/// Returns a [`LookupError`] when order history or redemption counts cannot be read.
pub fn check_eligibility(
    promotion: &Promotion,
    cart: &CartSnapshot,
    now: Timestamp,
    usage: Usage<'_>,
) -> Result<Eligibility, LookupError> {
    if let Some(reason) = static_gates(promotion, cart, now) {
        return Ok(Eligibility::Excluded(reason));
    }

    let rules = &promotion.rules;

    if rules.first_order_only {
        let Some(user) = cart.user else {
            return Ok(Eligibility::Excluded(ExclusionReason::SignedInUserRequired));
        };

        if usage.orders.count_orders(user)? > 0 {
            return Ok(Eligibility::Excluded(ExclusionReason::NotFirstOrder));
        }
    }

    if let Some(limit) = rules.usage_limit
        && usage.redemptions.count_redemptions(promotion.uuid)? >= limit
    {
        return Ok(Eligibility::Excluded(ExclusionReason::UsageLimitReached));
    }

    if let Some(limit) = rules.per_user_limit {
        let Some(user) = cart.user else {
            return Ok(Eligibility::Excluded(ExclusionReason::SignedInUserRequired));
        };

        if usage
            .redemptions
            .count_user_redemptions(promotion.uuid, user)?
            >= limit
        {
            return Ok(Eligibility::Excluded(ExclusionReason::PerUserLimitReached));
        }
    }

    Ok(Eligibility::Eligible)
}

/// Eligible promotions for `cart`, highest priority first. Equal priorities keep their
/// input order.
///
/// # Errors
///
/// Returns a [`LookupError`] when order history or redemption counts cannot be read.
/// Lookup failures are never treated as "no promotions".
pub fn match_promotions<'p>(
    promotions: &'p [Promotion],
    cart: &CartSnapshot,
    now: Timestamp,
    usage: Usage<'_>,
) -> Result<Vec<&'p Promotion>, LookupError> {
    let mut ordered: Vec<&Promotion> = promotions.iter().collect();

    ordered.sort_by_key(|promotion| Reverse(promotion.priority));

    let mut eligible = Vec::with_capacity(ordered.len());

    for promotion in ordered {
        if check_eligibility(promotion, cart, now, usage)? == Eligibility::Eligible {
            eligible.push(promotion);
        }
    }

    Ok(eligible)
}
