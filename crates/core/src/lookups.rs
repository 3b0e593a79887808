//! Lookups
//!
//! Read-only collaborators the engine consumes: catalog items, external price lists,
//! order history and redemption counts. Implementations are tenant-scoped snapshots
//! loaded by the caller before the engine runs.

use rustc_hash::FxHashMap;
use rusty_money::iso::{self, Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    catalog::CatalogItem,
    ids::{CatalogItemUuid, PriceListItemUuid, PromotionUuid, UserUuid},
};

/// Failures reading from a collaborator.
///
/// These are infrastructure failures, never business outcomes: a missing price list
/// record is not a zero price.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// A referenced price list record does not exist.
    #[error("price list item {0} not found")]
    PriceListItemNotFound(PriceListItemUuid),

    /// A stored currency code is not a known ISO currency.
    #[error("unknown currency code `{0}`")]
    UnknownCurrency(String),

    /// The backing store could not answer.
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// Resolve an ISO currency code.
///
/// # Errors
///
/// Returns [`LookupError::UnknownCurrency`] when the code is not an ISO currency.
pub fn find_currency(code: &str) -> Result<&'static Currency, LookupError> {
    iso::find(code.trim()).ok_or_else(|| LookupError::UnknownCurrency(code.to_string()))
}

/// Catalog item lookup.
pub trait Catalog {
    /// Fetch an item, or `None` when it does not exist for the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog cannot be read.
    fn catalog_item(&self, item: CatalogItemUuid) -> Result<Option<&CatalogItem>, LookupError>;
}

/// Amount and currency read from an external price list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalPrice {
    /// Amount in minor units
    pub amount: i64,

    /// Currency of the amount
    pub currency: &'static Currency,
}

/// External price list lookup.
pub trait PriceList {
    /// Resolve a price list record. Records without a currency take `fallback_currency`.
    ///
    /// # Errors
    ///
    /// Returns an error when the record is missing or the price list cannot be read.
    fn external_price(
        &self,
        item: PriceListItemUuid,
        fallback_currency: &'static Currency,
    ) -> Result<ExternalPrice, LookupError>;
}

/// Prior order count lookup, used for first-order-only promotions.
pub trait OrderHistory {
    /// Number of orders the user has placed with the tenant.
    ///
    /// # Errors
    ///
    /// Returns an error when order history cannot be read.
    fn count_orders(&self, user: UserUuid) -> Result<u64, LookupError>;
}

/// Redemption count lookup, used for usage limits.
pub trait RedemptionCounts {
    /// Total redemptions of a promotion across all users.
    ///
    /// # Errors
    ///
    /// Returns an error when the ledger cannot be read.
    fn count_redemptions(&self, promotion: PromotionUuid) -> Result<u64, LookupError>;

    /// Redemptions of a promotion by one user.
    ///
    /// # Errors
    ///
    /// Returns an error when the ledger cannot be read.
    fn count_user_redemptions(
        &self,
        promotion: PromotionUuid,
        user: UserUuid,
    ) -> Result<u64, LookupError>;
}

/// In-memory catalog keyed by item UUID.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    items: FxHashMap<CatalogItemUuid, CatalogItem>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an item.
    pub fn insert(&mut self, item: CatalogItem) {
        self.items.insert(item.uuid, item);
    }

    /// Item by UUID
    #[must_use]
    pub fn get(&self, item: CatalogItemUuid) -> Option<&CatalogItem> {
        self.items.get(&item)
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<CatalogItem> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogItem>>(iter: I) -> Self {
        let mut catalog = Self::new();

        for item in iter {
            catalog.insert(item);
        }

        catalog
    }
}

impl Catalog for InMemoryCatalog {
    fn catalog_item(&self, item: CatalogItemUuid) -> Result<Option<&CatalogItem>, LookupError> {
        Ok(self.get(item))
    }
}

/// A stored price list record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceListRecord {
    /// Record identifier
    pub uuid: PriceListItemUuid,

    /// Amount in minor units
    pub amount: i64,

    /// ISO currency code; the caller's fallback currency applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// In-memory price list keyed by record UUID.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceList {
    records: FxHashMap<PriceListItemUuid, PriceListRecord>,
}

impl InMemoryPriceList {
    /// Create an empty price list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record.
    pub fn insert(&mut self, record: PriceListRecord) {
        self.records.insert(record.uuid, record);
    }
}

impl FromIterator<PriceListRecord> for InMemoryPriceList {
    fn from_iter<I: IntoIterator<Item = PriceListRecord>>(iter: I) -> Self {
        let mut price_list = Self::new();

        for record in iter {
            price_list.insert(record);
        }

        price_list
    }
}

impl PriceList for InMemoryPriceList {
    fn external_price(
        &self,
        item: PriceListItemUuid,
        fallback_currency: &'static Currency,
    ) -> Result<ExternalPrice, LookupError> {
        let record = self
            .records
            .get(&item)
            .ok_or(LookupError::PriceListItemNotFound(item))?;

        let currency = match record.currency.as_deref() {
            Some(code) => find_currency(code)?,
            None => fallback_currency,
        };

        Ok(ExternalPrice {
            amount: record.amount,
            currency,
        })
    }
}

/// Point-in-time usage figures for one user and a set of promotions.
#[derive(Debug, Clone, Default)]
pub struct UsageSnapshot {
    /// Prior orders by the user, when the user is known.
    pub prior_orders: u64,

    /// Total redemptions per promotion.
    pub redemptions: FxHashMap<PromotionUuid, u64>,

    /// Redemptions by the user per promotion.
    pub user_redemptions: FxHashMap<PromotionUuid, u64>,
}

impl OrderHistory for UsageSnapshot {
    fn count_orders(&self, _user: UserUuid) -> Result<u64, LookupError> {
        Ok(self.prior_orders)
    }
}

impl RedemptionCounts for UsageSnapshot {
    fn count_redemptions(&self, promotion: PromotionUuid) -> Result<u64, LookupError> {
        Ok(self.redemptions.get(&promotion).copied().unwrap_or(0))
    }

    fn count_user_redemptions(
        &self,
        promotion: PromotionUuid,
        _user: UserUuid,
    ) -> Result<u64, LookupError> {
        Ok(self.user_redemptions.get(&promotion).copied().unwrap_or(0))
    }
}
