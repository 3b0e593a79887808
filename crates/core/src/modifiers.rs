//! Modifier Rules
//!
//! Cardinality and membership checks for modifier selections on a cart line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogItem;

/// A chosen modifier option on a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSelection {
    /// Group the option belongs to
    pub group_code: String,

    /// Chosen option
    pub option_code: String,

    /// Requested quantity; see [`ModifierSelection::quantity`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl ModifierSelection {
    /// A single unit of `option_code` in `group_code`.
    #[must_use]
    pub fn new(group_code: impl Into<String>, option_code: impl Into<String>) -> Self {
        Self {
            group_code: group_code.into(),
            option_code: option_code.into(),
            quantity: None,
        }
    }

    /// Set the requested quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Counted quantity: missing values count as 1 and anything below 1 is clamped to 1.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        let quantity = self.quantity.unwrap_or(1).max(1);

        u32::try_from(quantity).unwrap_or(u32::MAX)
    }
}

/// Modifier rule violations. The first violation found aborts pricing for the line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModifierError {
    /// A required group has no selections.
    #[error("modifier group `{group}` requires a selection")]
    RequiredMissing {
        /// Group code
        group: String,
    },

    /// Fewer selections than the group's minimum.
    #[error("modifier group `{group}` needs at least {min} selections, got {count}")]
    MinNotMet {
        /// Group code
        group: String,
        /// Effective minimum
        min: u32,
        /// Counted selections
        count: u64,
    },

    /// More selections than the group's maximum.
    #[error("modifier group `{group}` allows at most {max} selections, got {count}")]
    MaxExceeded {
        /// Group code
        group: String,
        /// Effective maximum
        max: u32,
        /// Counted selections
        count: u64,
    },

    /// A selection names an option the group does not offer.
    #[error("option `{option}` is not offered by modifier group `{group}`")]
    OptionInvalid {
        /// Group code
        group: String,
        /// Option code
        option: String,
    },

    /// A selection names a group the item does not have.
    #[error("modifier group `{0}` not found")]
    GroupNotFound(String),

    /// A priced selection names an option that cannot be found.
    #[error("modifier option `{option}` not found in group `{group}`")]
    OptionNotFound {
        /// Group code
        group: String,
        /// Option code
        option: String,
    },
}

impl ModifierError {
    /// Stable machine code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            ModifierError::RequiredMissing { .. } => "modifierRequiredMissing",
            ModifierError::MinNotMet { .. } => "modifierMinNotMet",
            ModifierError::MaxExceeded { .. } => "modifierMaxExceeded",
            ModifierError::OptionInvalid { .. } => "modifierOptionInvalid",
            ModifierError::GroupNotFound(_) => "modifierGroupNotFound",
            ModifierError::OptionNotFound { .. } => "modifierOptionNotFound",
        }
    }
}

/// Validate `selections` against every modifier group on `item`.
///
/// Each group's count is the sum of clamped selection quantities addressed to it. An
/// empty optional group passes regardless of its minimum; an empty required group fails
/// with [`ModifierError::RequiredMissing`]. Selections addressed to groups the item does
/// not have are left for the pricing stage.
///
/// # Errors
///
/// Returns the first [`ModifierError`] found, in group order.
pub fn validate_selections(
    item: &CatalogItem,
    selections: &[ModifierSelection],
) -> Result<(), ModifierError> {
    for group in &item.modifier_groups {
        let mut count: u64 = 0;

        for selection in selections
            .iter()
            .filter(|selection| selection.group_code == group.code)
        {
            if group.option(&selection.option_code).is_none() {
                return Err(ModifierError::OptionInvalid {
                    group: group.code.clone(),
                    option: selection.option_code.clone(),
                });
            }

            count = count.saturating_add(u64::from(selection.quantity()));
        }

        if count == 0 {
            if group.is_required {
                return Err(ModifierError::RequiredMissing {
                    group: group.code.clone(),
                });
            }

            continue;
        }

        let min = group.min_select();

        if count < u64::from(min) {
            return Err(ModifierError::MinNotMet {
                group: group.code.clone(),
                min,
                count,
            });
        }

        if let Some(max) = group.max_select()
            && count > u64::from(max)
        {
            return Err(ModifierError::MaxExceeded {
                group: group.code.clone(),
                max,
                count,
            });
        }
    }

    Ok(())
}
