//! Catalog
//!
//! Admin-authored catalog items, their variants and modifier groups. The engine only
//! reads these; they are stored as documents and mutated out of band.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    ids::{CatalogItemUuid, CategoryUuid},
    prices::PriceSource,
};

/// Locales a [`TranslatedLabel`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    /// English
    En,
    /// Spanish
    Es,
    /// Catalan
    Ca,
    /// French
    Fr,
    /// German
    De,
    /// Italian
    It,
}

/// A display string keyed by supported locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedLabel {
    /// English
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,

    /// Spanish
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub es: Option<String>,

    /// Catalan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca: Option<String>,

    /// French
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,

    /// German
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub de: Option<String>,

    /// Italian
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<String>,
}

impl TranslatedLabel {
    /// A label with only an English value.
    #[must_use]
    pub fn en(value: impl Into<String>) -> Self {
        Self {
            en: Some(value.into()),
            ..Self::default()
        }
    }

    /// Value for a locale, if present.
    #[must_use]
    pub fn get(&self, locale: Locale) -> Option<&str> {
        match locale {
            Locale::En => self.en.as_deref(),
            Locale::Es => self.es.as_deref(),
            Locale::Ca => self.ca.as_deref(),
            Locale::Fr => self.fr.as_deref(),
            Locale::De => self.de.as_deref(),
            Locale::It => self.it.as_deref(),
        }
    }

    /// Every present value, in locale order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        [&self.en, &self.es, &self.ca, &self.fr, &self.de, &self.it]
            .into_iter()
            .filter_map(Option::as_deref)
    }

    /// The first present value, preferring English.
    #[must_use]
    pub fn display(&self) -> &str {
        self.values().next().unwrap_or_default()
    }

    /// Whether no locale has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().next().is_none()
    }
}

/// A sellable thing, such as a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Item identifier
    pub uuid: CatalogItemUuid,

    /// Display name
    #[serde(default)]
    pub name: TranslatedLabel,

    /// Categories the item is filed under.
    #[serde(default)]
    pub category_ids: SmallVec<[CategoryUuid; 2]>,

    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Allergen codes
    #[serde(default)]
    pub allergens: Vec<String>,

    /// Dietary flags (vegan, gluten free, ...)
    #[serde(default)]
    pub dietary_flags: Vec<String>,

    /// Item-level prices, used when the item has no variants.
    #[serde(default)]
    pub prices: PriceSource,

    /// Purchasable variants
    #[serde(default)]
    pub variants: Vec<Variant>,

    /// Modifier groups
    #[serde(default)]
    pub modifier_groups: Vec<ModifierGroup>,
}

impl CatalogItem {
    /// Find a modifier group by code.
    #[must_use]
    pub fn modifier_group(&self, code: &str) -> Option<&ModifierGroup> {
        self.modifier_groups.iter().find(|group| group.code == code)
    }

    /// Every source the item's prices may come from.
    pub fn price_sources(&self) -> impl Iterator<Item = &PriceSource> {
        std::iter::once(&self.prices)
            .chain(self.variants.iter().map(|variant| &variant.prices))
            .chain(
                self.modifier_groups
                    .iter()
                    .flat_map(|group| group.options.iter().map(|option| &option.prices)),
            )
    }
}

/// A purchasable size or configuration of a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant code
    pub code: String,

    /// URL slug
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: TranslatedLabel,

    /// Size label ("Large", "0.5 l")
    #[serde(default)]
    pub size_label: TranslatedLabel,

    /// Whether this variant is picked when none is requested.
    #[serde(default)]
    pub is_default: bool,

    /// Whether the variant is currently sellable.
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Variant prices
    #[serde(default)]
    pub prices: PriceSource,
}

const fn default_active() -> bool {
    true
}

/// A named set of add-ons attachable to a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierGroup {
    /// Group code
    pub code: String,

    /// Display name
    #[serde(default)]
    pub name: TranslatedLabel,

    /// Whether at least one selection is mandatory.
    #[serde(default)]
    pub is_required: bool,

    /// Minimum number of selections; see [`ModifierGroup::min_select`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_select: Option<u32>,

    /// Maximum number of selections; unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_select: Option<u32>,

    /// Selectable options
    #[serde(default)]
    pub options: Vec<ModifierOption>,
}

impl ModifierGroup {
    /// Effective minimum selection count: the authored value, or 1 for required
    /// groups and 0 otherwise.
    #[must_use]
    pub fn min_select(&self) -> u32 {
        self.min_select.unwrap_or(u32::from(self.is_required))
    }

    /// Effective maximum selection count; `None` is unbounded.
    #[must_use]
    pub fn max_select(&self) -> Option<u32> {
        self.max_select
    }

    /// Find an option by code.
    #[must_use]
    pub fn option(&self, code: &str) -> Option<&ModifierOption> {
        self.options.iter().find(|option| option.code == code)
    }
}

/// A single add-on with its own price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierOption {
    /// Option code
    pub code: String,

    /// Display name
    #[serde(default)]
    pub name: TranslatedLabel,

    /// Option prices, looked up as surcharges.
    #[serde(default)]
    pub prices: PriceSource,
}
