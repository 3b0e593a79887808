//! Stacking

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::promotions::{EffectType, ParseValueError, Promotion};

/// Whether a promotion may combine with others on the same cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackingPolicy {
    /// Combines with nothing
    #[default]
    #[serde(rename = "none")]
    Exclusive,

    /// Combines only with promotions of a different effect type
    #[serde(rename = "with_different")]
    WithDifferent,

    /// Combines with any promotion
    #[serde(rename = "with_same")]
    WithSame,
}

impl StackingPolicy {
    /// Stable string form, matching the serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StackingPolicy::Exclusive => "none",
            StackingPolicy::WithDifferent => "with_different",
            StackingPolicy::WithSame => "with_same",
        }
    }

    /// Whether a promotion with this policy and effect `own` accepts a partner with
    /// effect `other`.
    #[must_use]
    pub fn allows(self, own: EffectType, other: EffectType) -> bool {
        match self {
            StackingPolicy::Exclusive => false,
            StackingPolicy::WithDifferent => own != other,
            StackingPolicy::WithSame => true,
        }
    }
}

impl FromStr for StackingPolicy {
    type Err = ParseValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(StackingPolicy::Exclusive),
            "with_different" => Ok(StackingPolicy::WithDifferent),
            "with_same" => Ok(StackingPolicy::WithSame),
            other => Err(ParseValueError(other.to_string())),
        }
    }
}

/// Whether `candidate` can join the already accepted promotions. Both sides of every
/// pairing must allow it.
#[must_use]
pub fn can_stack(candidate: &Promotion, accepted: &[&Promotion]) -> bool {
    let own = candidate.effect_type();

    accepted.iter().all(|other| {
        let theirs = other.effect_type();

        candidate.stacking_policy.allows(own, theirs) && other.stacking_policy.allows(theirs, own)
    })
}
