//! Promotions
//!
//! Admin-authored promotions, the gates that decide whether one applies to a cart, the
//! discount each effect produces, and how several combine.

use std::str::FromStr;

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{CartError, CartSnapshotLine, ServiceType},
    ids::{BranchUuid, CatalogItemUuid, CategoryUuid, PromotionUuid},
    lookups::LookupError,
};

pub mod discounts;
pub mod evaluation;
pub mod matcher;
pub mod stacking;

pub use discounts::{Discount, DiscountError, compute_discount};
pub use evaluation::{AppliedDiscount, evaluate_promotions};
pub use matcher::{Eligibility, ExclusionReason, Usage, check_eligibility, match_promotions};
pub use stacking::StackingPolicy;

/// Errors raised while validating or evaluating promotions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromotionError {
    /// A coupon code does not resolve to a usable promotion.
    #[error("coupon `{0}` is not valid")]
    InvalidCoupon(String),

    /// A percentage effect lies outside `[0, 100]`.
    #[error("percentage {0} is outside 0..=100")]
    InvalidPercentage(Decimal),

    /// A buy-x-get-y effect has a quantity below 1.
    #[error("buy {buy_qty} get {get_qty} needs both quantities to be at least 1")]
    InvalidBuyXGetY {
        /// Units to buy
        buy_qty: u32,
        /// Units given free
        get_qty: u32,
    },

    /// A collaborator could not be read.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Cart totals could not be computed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl PromotionError {
    /// Stable machine code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            PromotionError::InvalidCoupon(_) => "invalidCoupon",
            PromotionError::InvalidPercentage(_) => "invalidPercentage",
            PromotionError::InvalidBuyXGetY { .. } => "invalidBuyXGetY",
            PromotionError::Lookup(_) => "lookupUnavailable",
            PromotionError::Discount(_) | PromotionError::Cart(_) => "amountOverflow",
        }
    }
}

/// A stored string that names no known promotion kind or stacking policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognised value `{0}`")]
pub struct ParseValueError(pub String);

/// How a promotion is triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    /// Considered for every cart
    #[default]
    Auto,

    /// Considered only when its code is entered
    Coupon,
}

impl PromotionKind {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PromotionKind::Auto => "auto",
            PromotionKind::Coupon => "coupon",
        }
    }
}

impl FromStr for PromotionKind {
    type Err = ParseValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(PromotionKind::Auto),
            "coupon" => Ok(PromotionKind::Coupon),
            other => Err(ParseValueError(other.to_string())),
        }
    }
}

/// Minimum cart subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinOrder {
    /// Threshold in minor units
    pub amount: i64,
}

/// Which carts and lines a promotion applies to. Empty lists do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionScope {
    /// Allowed fulfilment types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_types: Vec<ServiceType>,

    /// Allowed branches
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branch_ids: Vec<BranchUuid>,

    /// Qualifying items
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_ids: Vec<CatalogItemUuid>,

    /// Qualifying categories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_ids: Vec<CategoryUuid>,
}

impl PromotionScope {
    /// Whether the scope narrows which lines qualify.
    #[must_use]
    pub fn restricts_lines(&self) -> bool {
        !self.item_ids.is_empty() || !self.category_ids.is_empty()
    }

    /// Whether a line falls inside the scope's items or categories. Every line matches
    /// a scope without line restrictions.
    #[must_use]
    pub fn matches_line(&self, line: &CartSnapshotLine) -> bool {
        if !self.restricts_lines() {
            return true;
        }

        self.item_ids.contains(&line.catalog_item)
            || line
                .category_ids
                .iter()
                .any(|category| self.category_ids.contains(category))
    }
}

/// Eligibility rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionRules {
    /// Inclusive start; open when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<Timestamp>,

    /// Inclusive end; open when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<Timestamp>,

    /// Minimum subtotal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_order: Option<MinOrder>,

    /// Cart and line scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<PromotionScope>,

    /// Only for users without prior orders
    #[serde(default)]
    pub first_order_only: bool,

    /// Total redemptions allowed across all users
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u64>,

    /// Redemptions allowed per user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_user_limit: Option<u64>,
}

impl PromotionRules {
    /// Whether `now` falls inside the promotion window.
    #[must_use]
    pub fn is_within_window(&self, now: Timestamp) -> bool {
        self.starts_at.is_none_or(|starts_at| starts_at <= now)
            && self.ends_at.is_none_or(|ends_at| now <= ends_at)
    }

    /// Whether a line qualifies under the scope.
    #[must_use]
    pub fn matches_line(&self, line: &CartSnapshotLine) -> bool {
        self.scope
            .as_ref()
            .is_none_or(|scope| scope.matches_line(line))
    }
}

/// Buy-x-get-y quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyXGetY {
    /// Units that must be bought
    pub buy_qty: u32,

    /// Units given free per group
    pub get_qty: u32,
}

/// What a promotion does once it applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionEffect {
    /// Percent off the subtotal
    Percentage {
        /// Percent, expected in `[0, 100]`
        value: Decimal,
    },

    /// Fixed amount off the subtotal, in minor units
    Fixed {
        /// Amount in minor units
        value: i64,
    },

    /// Waive the delivery fee
    FreeDelivery,

    /// Buy x, get y free
    Bxgy {
        /// Quantities
        bxgy: BuyXGetY,
    },
}

/// Effect discriminant, used for stacking decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    /// [`PromotionEffect::Percentage`]
    Percentage,
    /// [`PromotionEffect::Fixed`]
    Fixed,
    /// [`PromotionEffect::FreeDelivery`]
    FreeDelivery,
    /// [`PromotionEffect::Bxgy`]
    Bxgy,
}

impl EffectType {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EffectType::Percentage => "percentage",
            EffectType::Fixed => "fixed",
            EffectType::FreeDelivery => "free_delivery",
            EffectType::Bxgy => "bxgy",
        }
    }
}

impl PromotionEffect {
    /// Discriminant of this effect.
    #[must_use]
    pub const fn effect_type(&self) -> EffectType {
        match self {
            PromotionEffect::Percentage { .. } => EffectType::Percentage,
            PromotionEffect::Fixed { .. } => EffectType::Fixed,
            PromotionEffect::FreeDelivery => EffectType::FreeDelivery,
            PromotionEffect::Bxgy { .. } => EffectType::Bxgy,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// A tenant promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Promotion identifier
    pub uuid: PromotionUuid,

    /// Display name
    pub name: String,

    /// Trigger kind
    #[serde(default)]
    pub kind: PromotionKind,

    /// Coupon code, for coupon promotions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Switched on by an admin
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Visible to customers
    #[serde(default = "default_true")]
    pub is_published: bool,

    /// Higher values are evaluated first
    #[serde(default)]
    pub priority: i32,

    /// Combination policy
    #[serde(default)]
    pub stacking_policy: StackingPolicy,

    /// Eligibility rules
    #[serde(default)]
    pub rules: PromotionRules,

    /// Effect
    pub effect: PromotionEffect,
}

impl Promotion {
    /// Effect discriminant
    #[must_use]
    pub const fn effect_type(&self) -> EffectType {
        self.effect.effect_type()
    }

    /// Whether `code` names this promotion, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        self.code
            .as_deref()
            .is_some_and(|own| own.trim().eq_ignore_ascii_case(code.trim()))
    }

    /// Reject effects that break the percentage and buy-x-get-y invariants.
    ///
    /// # Errors
    ///
    /// - [`PromotionError::InvalidPercentage`]: percentage outside `[0, 100]`.
    /// - [`PromotionError::InvalidBuyXGetY`]: a buy-x-get-y quantity below 1.
    pub fn validate(&self) -> Result<(), PromotionError> {
        match self.effect {
            PromotionEffect::Percentage { value }
                if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED =>
            {
                Err(PromotionError::InvalidPercentage(value))
            }
            PromotionEffect::Bxgy {
                bxgy: BuyXGetY { buy_qty, get_qty },
            } if buy_qty == 0 || get_qty == 0 => {
                Err(PromotionError::InvalidBuyXGetY { buy_qty, get_qty })
            }
            _ => Ok(()),
        }
    }
}

/// Resolve a coupon code to an active, published, in-window coupon promotion.
///
/// # Errors
///
/// Returns [`PromotionError::InvalidCoupon`] when no promotion qualifies.
pub fn resolve_coupon<'p>(
    promotions: &'p [Promotion],
    code: &str,
    now: Timestamp,
) -> Result<&'p Promotion, PromotionError> {
    promotions
        .iter()
        .filter(|promotion| promotion.kind == PromotionKind::Coupon)
        .filter(|promotion| promotion.is_active && promotion.is_published)
        .filter(|promotion| promotion.rules.is_within_window(now))
        .find(|promotion| promotion.matches_code(code))
        .ok_or_else(|| PromotionError::InvalidCoupon(code.trim().to_string()))
}
