//! Fixtures
//!
//! Named YAML fixture sets used by tests and the quote demo. A set called `lunch` is
//! spread over `catalog/lunch.yml`, `price_lists/lunch.yml`, `promotions/lunch.yml`
//! and `carts/lunch.yml` below the base path.

use std::{collections::BTreeMap, fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::Cart,
    catalog::CatalogItem,
    ids::{CatalogItemUuid, PromotionUuid},
    lookups::{InMemoryCatalog, InMemoryPriceList, LookupError, PriceListRecord, find_currency},
    promotions::{Promotion, PromotionError},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown currency code
    #[error(transparent)]
    Currency(#[from] LookupError),

    /// Currency mismatch between catalog files
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No catalog loaded yet
    #[error("No catalog loaded yet; currency unknown")]
    NoCurrency,

    /// No cart loaded yet
    #[error("No cart loaded")]
    NoCart,

    /// Catalog item not found
    #[error("Catalog item not found: {0}")]
    ItemNotFound(String),

    /// Promotion not found
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Promotion failed validation
    #[error("Invalid promotion {key}: {source}")]
    InvalidPromotion {
        /// Fixture key of the promotion
        key: String,

        /// Validation failure
        source: PromotionError,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFixture {
    currency: String,
    items: BTreeMap<String, CatalogItem>,
}

#[derive(Debug, Deserialize)]
struct PriceListFixture {
    #[serde(default)]
    records: Vec<PriceListRecord>,
}

#[derive(Debug, Deserialize)]
struct PromotionsFixture {
    promotions: BTreeMap<String, Promotion>,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    catalog: InMemoryCatalog,
    price_list: InMemoryPriceList,
    promotions: Vec<Promotion>,
    cart: Option<Cart>,

    /// String key -> identifier mappings for lookups
    item_keys: FxHashMap<String, CatalogItemUuid>,
    promotion_keys: FxHashMap<String, PromotionUuid>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture reading from the crate's `fixtures` directory
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_path(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
    }

    /// Create a new empty fixture with custom base path
    #[must_use]
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: InMemoryCatalog::new(),
            price_list: InMemoryPriceList::new(),
            promotions: Vec::new(),
            cart: None,
            item_keys: FxHashMap::default(),
            promotion_keys: FxHashMap::default(),
            currency: None,
        }
    }

    fn read(&self, kind: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));

        Ok(fs::read_to_string(file_path)?)
    }

    /// Load catalog items from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, the currency is unknown, or
    /// it differs from a previously loaded catalog.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CatalogFixture = serde_norway::from_str(&self.read("catalog", name)?)?;
        let currency = find_currency(&fixture.currency)?;

        if let Some(existing) = self.currency
            && existing != currency
        {
            return Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            ));
        }

        self.currency = Some(currency);

        for (key, item) in fixture.items {
            self.item_keys.insert(key, item.uuid);
            self.catalog.insert(item);
        }

        Ok(self)
    }

    /// Load external price list records from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_price_list(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: PriceListFixture = serde_norway::from_str(&self.read("price_lists", name)?)?;

        for record in fixture.records {
            self.price_list.insert(record);
        }

        Ok(self)
    }

    /// Load promotions from a YAML fixture file. Every promotion is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a promotion is invalid.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: PromotionsFixture = serde_norway::from_str(&self.read("promotions", name)?)?;

        for (key, promotion) in fixture.promotions {
            if let Err(source) = promotion.validate() {
                return Err(FixtureError::InvalidPromotion { key, source });
            }

            self.promotion_keys.insert(key, promotion.uuid);
            self.promotions.push(promotion);
        }

        Ok(self)
    }

    /// Load the cart from a YAML fixture file, replacing any loaded cart
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        self.cart = Some(serde_norway::from_str(&self.read("carts", name)?)?);

        Ok(self)
    }

    /// Load a complete fixture set (catalog, price list, promotions and cart with the
    /// same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_catalog(name)?
            .load_price_list(name)?
            .load_promotions(name)?
            .load_cart(name)?;

        Ok(fixture)
    }

    /// Get a catalog item by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the item is not found.
    pub fn item(&self, key: &str) -> Result<&CatalogItem, FixtureError> {
        self.item_keys
            .get(key)
            .and_then(|uuid| self.catalog.get(*uuid))
            .ok_or_else(|| FixtureError::ItemNotFound(key.to_string()))
    }

    /// Get a promotion by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the promotion is not found.
    pub fn promotion(&self, key: &str) -> Result<&Promotion, FixtureError> {
        let uuid = self
            .promotion_keys
            .get(key)
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))?;

        self.promotions
            .iter()
            .find(|promotion| promotion.uuid == *uuid)
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// Loaded catalog
    #[must_use]
    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    /// Loaded price list
    #[must_use]
    pub fn price_list(&self) -> &InMemoryPriceList {
        &self.price_list
    }

    /// Loaded promotions, ordered by fixture key
    #[must_use]
    pub fn promotions(&self) -> &[Promotion] {
        &self.promotions
    }

    /// Mutable access to the loaded promotions, for tests that tweak a rule
    pub fn promotions_mut(&mut self) -> &mut Vec<Promotion> {
        &mut self.promotions
    }

    /// Loaded cart
    ///
    /// # Errors
    ///
    /// Returns an error if no cart has been loaded.
    pub fn cart(&self) -> Result<&Cart, FixtureError> {
        self.cart.as_ref().ok_or(FixtureError::NoCart)
    }

    /// Currency of the loaded catalog
    ///
    /// # Errors
    ///
    /// Returns an error if no catalog has been loaded.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
