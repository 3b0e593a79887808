//! Line Pricing
//!
//! Turns one cart line into a priced line: variant resolution, modifier validation,
//! base and deposit lookup, modifier surcharges and a frozen display snapshot.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    catalog::{CatalogItem, ModifierGroup, ModifierOption, TranslatedLabel, Variant},
    ids::{CatalogItemUuid, CategoryUuid},
    lookups::{Catalog, LookupError, PriceList},
    modifiers::{ModifierError, ModifierSelection, validate_selections},
    prices::{PriceKind, PriceSource, select_price},
    variants::{VariantError, resolve_variant},
};

/// Errors pricing a cart line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PricingError {
    /// The referenced catalog item does not exist for the tenant.
    #[error("catalog item {0} not found")]
    MenuItemNotFound(CatalogItemUuid),

    /// Several variants exist, none is default, and no code was supplied.
    #[error("a variant must be chosen for this item")]
    VariantRequired,

    /// The requested variant code matched no active variant.
    #[error("no active variant matches `{0}`")]
    VariantNotFound(String),

    /// Modifier selections violate the item's rules.
    #[error(transparent)]
    Modifier(#[from] ModifierError),

    /// A collaborator could not be read.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Amounts overflowed minor-unit arithmetic.
    #[error("price arithmetic overflowed")]
    Overflow,
}

impl From<VariantError> for PricingError {
    fn from(error: VariantError) -> Self {
        match error {
            VariantError::VariantRequired => PricingError::VariantRequired,
            VariantError::VariantNotFound(code) => PricingError::VariantNotFound(code),
        }
    }
}

impl PricingError {
    /// Stable machine code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            PricingError::MenuItemNotFound(_) => "menuItemNotFound",
            PricingError::VariantRequired => "variantRequired",
            PricingError::VariantNotFound(_) => "variantNotFound",
            PricingError::Modifier(error) => error.code(),
            PricingError::Lookup(_) => "lookupUnavailable",
            PricingError::Overflow => "amountOverflow",
        }
    }

    /// Whether the error is an infrastructure failure rather than a rejected request.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(self, PricingError::Lookup(_))
    }
}

const fn default_quantity() -> u32 {
    1
}

const fn default_deposit_included() -> bool {
    true
}

/// One requested line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Item being bought
    pub catalog_item: CatalogItemUuid,

    /// Requested variant code or label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_code: Option<String>,

    /// Chosen modifiers
    #[serde(default)]
    pub modifier_selections: Vec<ModifierSelection>,

    /// Units; see [`CartLine::quantity`].
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Whether deposits are charged on this line.
    #[serde(default = "default_deposit_included")]
    pub deposit_included: bool,
}

impl CartLine {
    /// A single unit of `catalog_item` with deposits included.
    #[must_use]
    pub fn new(catalog_item: CatalogItemUuid) -> Self {
        Self {
            catalog_item,
            variant_code: None,
            modifier_selections: Vec::new(),
            quantity: 1,
            deposit_included: true,
        }
    }

    /// Request a variant.
    #[must_use]
    pub fn with_variant(mut self, code: impl Into<String>) -> Self {
        self.variant_code = Some(code.into());
        self
    }

    /// Add a modifier selection.
    #[must_use]
    pub fn with_modifier(mut self, selection: ModifierSelection) -> Self {
        self.modifier_selections.push(selection);
        self
    }

    /// Set the number of units.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Leave deposits off this line.
    #[must_use]
    pub fn without_deposit(mut self) -> Self {
        self.deposit_included = false;
        self
    }

    /// Counted units, never below 1.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity.max(1)
    }
}

/// A priced modifier selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedModifier {
    /// Group code
    pub group_code: String,

    /// Option code
    pub option_code: String,

    /// Clamped selection quantity
    pub quantity: u32,

    /// Price of one unit of the option
    pub unit_price: Money<'static, Currency>,

    /// `unit_price * quantity`
    pub total: Money<'static, Currency>,
}

/// Per-unit price breakdown of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceComponents {
    /// Base price
    pub base: Money<'static, Currency>,

    /// Deposit, zero when not included
    pub deposit: Money<'static, Currency>,

    /// Sum of modifier totals
    pub modifiers_total: Money<'static, Currency>,

    /// Modifier detail
    pub modifiers: SmallVec<[PricedModifier; 4]>,
}

/// Display data of a modifier, frozen at pricing time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSnapshot {
    /// Group code
    pub group_code: String,

    /// Group display name
    pub group_name: TranslatedLabel,

    /// Option code
    pub option_code: String,

    /// Option display name
    pub option_name: TranslatedLabel,

    /// Clamped selection quantity
    pub quantity: u32,
}

/// Catalog display data, frozen at pricing time so historical orders do not change
/// when the catalog does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Item name
    pub name: TranslatedLabel,

    /// Resolved variant code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_code: Option<String>,

    /// Resolved variant name
    #[serde(default)]
    pub variant_name: TranslatedLabel,

    /// Resolved variant size label
    #[serde(default)]
    pub size_label: TranslatedLabel,

    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Allergen codes
    #[serde(default)]
    pub allergens: Vec<String>,

    /// Dietary flags
    #[serde(default)]
    pub dietary_flags: Vec<String>,

    /// Categories the item was filed under
    #[serde(default)]
    pub category_ids: SmallVec<[CategoryUuid; 2]>,

    /// Selected modifiers
    #[serde(default)]
    pub modifiers: Vec<ModifierSnapshot>,
}

/// A cart line with its resolved price.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    /// Item that was priced
    pub catalog_item: CatalogItemUuid,

    /// Units
    pub quantity: u32,

    /// `base + deposit + modifiers_total`
    pub unit_price: Money<'static, Currency>,

    /// Currency of every amount on the line
    pub currency: &'static Currency,

    /// Breakdown of `unit_price`
    pub components: PriceComponents,

    /// Frozen display data
    pub snapshot: LineSnapshot,
}

impl PricedLine {
    /// `unit_price * quantity`
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] when the total does not fit in minor units.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, PricingError> {
        let total = self
            .unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(PricingError::Overflow)?;

        Ok(Money::from_minor(total, self.currency))
    }
}

/// Resolves amounts from embedded entries or the external price list, tracking the
/// last external currency seen.
struct AmountResolver<'p, P: ?Sized> {
    price_list: &'p P,
    fallback_currency: &'static Currency,
    now: Timestamp,
    external_currency: Option<&'static Currency>,
}

impl<P: PriceList + ?Sized> AmountResolver<'_, P> {
    fn amount(
        &mut self,
        source: &PriceSource,
        kind: PriceKind,
        quantity: u32,
    ) -> Result<i64, LookupError> {
        if let Some(reference) = source.external_ref(kind) {
            let price = self
                .price_list
                .external_price(reference.price_list_item, self.fallback_currency)?;

            self.external_currency = Some(price.currency);

            return Ok(price.amount);
        }

        Ok(select_price(&source.entries, kind, quantity, self.now))
    }

    fn currency(&self) -> &'static Currency {
        self.external_currency.unwrap_or(self.fallback_currency)
    }
}

struct ModifierAmount<'i> {
    group: &'i ModifierGroup,
    option: &'i ModifierOption,
    quantity: u32,
    unit: i64,
    total: i64,
}

impl ModifierAmount<'_> {
    fn priced(&self, currency: &'static Currency) -> PricedModifier {
        PricedModifier {
            group_code: self.group.code.clone(),
            option_code: self.option.code.clone(),
            quantity: self.quantity,
            unit_price: Money::from_minor(self.unit, currency),
            total: Money::from_minor(self.total, currency),
        }
    }

    fn snapshot(&self) -> ModifierSnapshot {
        ModifierSnapshot {
            group_code: self.group.code.clone(),
            group_name: self.group.name.clone(),
            option_code: self.option.code.clone(),
            option_name: self.option.name.clone(),
            quantity: self.quantity,
        }
    }
}

fn price_modifiers<'i, P: PriceList + ?Sized>(
    item: &'i CatalogItem,
    selections: &[ModifierSelection],
    resolver: &mut AmountResolver<'_, P>,
) -> Result<(SmallVec<[ModifierAmount<'i>; 4]>, i64), PricingError> {
    let mut amounts = SmallVec::new();
    let mut sum: i64 = 0;

    for selection in selections {
        let group = item
            .modifier_group(&selection.group_code)
            .ok_or_else(|| ModifierError::GroupNotFound(selection.group_code.clone()))?;

        let option =
            group
                .option(&selection.option_code)
                .ok_or_else(|| ModifierError::OptionNotFound {
                    group: group.code.clone(),
                    option: selection.option_code.clone(),
                })?;

        let quantity = selection.quantity();
        let unit = resolver.amount(&option.prices, PriceKind::Surcharge, quantity)?;

        let total = unit
            .checked_mul(i64::from(quantity))
            .ok_or(PricingError::Overflow)?;

        sum = sum.checked_add(total).ok_or(PricingError::Overflow)?;

        amounts.push(ModifierAmount {
            group,
            option,
            quantity,
            unit,
            total,
        });
    }

    Ok((amounts, sum))
}

/// Price one cart line against its catalog item.
///
/// The result depends only on the inputs and `now`: the same line at the same instant
/// always yields the same price.
///
/// # Errors
///
/// - [`PricingError::VariantRequired`] / [`PricingError::VariantNotFound`]: variant
///   resolution failed.
/// - [`PricingError::Modifier`]: the first modifier rule violation.
/// - [`PricingError::Lookup`]: an external price record could not be read.
/// - [`PricingError::Overflow`]: amounts overflowed.
pub fn price_line<P: PriceList + ?Sized>(
    item: &CatalogItem,
    line: &CartLine,
    price_list: &P,
    fallback_currency: &'static Currency,
    now: Timestamp,
) -> Result<PricedLine, PricingError> {
    let variant = resolve_variant(&item.variants, line.variant_code.as_deref())?;

    validate_selections(item, &line.modifier_selections)?;

    let quantity = line.quantity();
    let source = variant.map_or(&item.prices, |variant| &variant.prices);

    let mut resolver = AmountResolver {
        price_list,
        fallback_currency,
        now,
        external_currency: None,
    };

    let base = resolver.amount(source, PriceKind::Base, quantity)?;

    let deposit = if line.deposit_included {
        resolver.amount(source, PriceKind::Deposit, quantity)?
    } else {
        0
    };

    let (modifiers, modifiers_total) =
        price_modifiers(item, &line.modifier_selections, &mut resolver)?;

    let unit_price = base
        .checked_add(deposit)
        .and_then(|amount| amount.checked_add(modifiers_total))
        .ok_or(PricingError::Overflow)?;

    let currency = resolver.currency();

    let components = PriceComponents {
        base: Money::from_minor(base, currency),
        deposit: Money::from_minor(deposit, currency),
        modifiers_total: Money::from_minor(modifiers_total, currency),
        modifiers: modifiers.iter().map(|amount| amount.priced(currency)).collect(),
    };

    Ok(PricedLine {
        catalog_item: item.uuid,
        quantity,
        unit_price: Money::from_minor(unit_price, currency),
        currency,
        components,
        snapshot: snapshot(
            item,
            variant,
            modifiers.iter().map(ModifierAmount::snapshot).collect(),
        ),
    })
}

fn snapshot(
    item: &CatalogItem,
    variant: Option<&Variant>,
    modifiers: Vec<ModifierSnapshot>,
) -> LineSnapshot {
    LineSnapshot {
        name: item.name.clone(),
        variant_code: variant.map(|variant| variant.code.clone()),
        variant_name: variant.map(|variant| variant.name.clone()).unwrap_or_default(),
        size_label: variant
            .map(|variant| variant.size_label.clone())
            .unwrap_or_default(),
        image: item.image.clone(),
        allergens: item.allergens.clone(),
        dietary_flags: item.dietary_flags.clone(),
        category_ids: item.category_ids.clone(),
        modifiers,
    }
}

/// Prices cart lines for one tenant against a price list.
#[derive(Debug)]
pub struct LineItemPricer<'p, P: ?Sized> {
    price_list: &'p P,
    fallback_currency: &'static Currency,
}

impl<'p, P: PriceList + ?Sized> LineItemPricer<'p, P> {
    /// Create a pricer; `fallback_currency` applies when no external price sets one.
    #[must_use]
    pub fn new(price_list: &'p P, fallback_currency: &'static Currency) -> Self {
        Self {
            price_list,
            fallback_currency,
        }
    }

    /// Currency used when no external price sets one.
    #[must_use]
    pub fn fallback_currency(&self) -> &'static Currency {
        self.fallback_currency
    }

    /// Price a line against an already-loaded catalog item.
    ///
    /// # Errors
    ///
    /// See [`price_line`].
    pub fn price(
        &self,
        item: &CatalogItem,
        line: &CartLine,
        now: Timestamp,
    ) -> Result<PricedLine, PricingError> {
        price_line(item, line, self.price_list, self.fallback_currency, now)
    }

    /// Look up the line's item in `catalog` and price it.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::MenuItemNotFound`] when the catalog has no such item,
    /// otherwise see [`price_line`].
    pub fn price_cart_line<C: Catalog + ?Sized>(
        &self,
        catalog: &C,
        line: &CartLine,
        now: Timestamp,
    ) -> Result<PricedLine, PricingError> {
        let item = catalog
            .catalog_item(line.catalog_item)?
            .ok_or(PricingError::MenuItemNotFound(line.catalog_item))?;

        self.price(item, line, now)
    }
}
