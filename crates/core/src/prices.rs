//! Price Entries
//!
//! Time-bounded price entries attached to variants, items and modifier options, and the
//! selection rules that pick the single active entry for a lookup.

use std::cmp::Reverse;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::ids::PriceListItemUuid;

/// Kind of amount a price entry contributes to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceKind {
    /// Base price of a variant or item.
    Base,

    /// Refundable deposit (bottles, containers).
    Deposit,

    /// Extra charge for a modifier option.
    Surcharge,
}

impl PriceKind {
    /// Kinds to try, in order, when looking up this kind.
    ///
    /// Surcharge lookups fall back to base entries for older catalogs that priced
    /// modifier options with a base entry.
    #[must_use]
    pub const fn lookup_order(self) -> &'static [PriceKind] {
        match self {
            PriceKind::Base => &[PriceKind::Base],
            PriceKind::Deposit => &[PriceKind::Deposit],
            PriceKind::Surcharge => &[PriceKind::Surcharge, PriceKind::Base],
        }
    }

    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PriceKind::Base => "base",
            PriceKind::Deposit => "deposit",
            PriceKind::Surcharge => "surcharge",
        }
    }
}

/// Amount carried by a price entry, in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceValue {
    /// Amount in minor units (pence/cents).
    pub amount: i64,

    /// ISO currency code the amount was authored in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// A single, optionally time-bounded, price entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Price kind
    pub kind: PriceKind,

    /// Price value
    pub value: PriceValue,

    /// Minimum line quantity for this entry to apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_qty: Option<u32>,

    /// Inclusive start of the validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_from: Option<Timestamp>,

    /// Inclusive end of the validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_to: Option<Timestamp>,
}

impl PriceEntry {
    /// Create an unbounded entry of the given kind and amount.
    #[must_use]
    pub fn new(kind: PriceKind, amount: i64) -> Self {
        Self {
            kind,
            value: PriceValue {
                amount,
                currency: None,
            },
            min_qty: None,
            active_from: None,
            active_to: None,
        }
    }

    /// Restrict the entry to a validity window.
    #[must_use]
    pub fn active_between(mut self, from: Option<Timestamp>, to: Option<Timestamp>) -> Self {
        self.active_from = from;
        self.active_to = to;
        self
    }

    /// Require a minimum quantity.
    #[must_use]
    pub fn with_min_qty(mut self, min_qty: u32) -> Self {
        self.min_qty = Some(min_qty);
        self
    }

    /// Whether `now` falls inside the entry's window. Absent bounds are open.
    #[must_use]
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.active_from.is_none_or(|from| from <= now)
            && self.active_to.is_none_or(|to| now <= to)
    }

    /// Whether the entry's quantity tier is reachable with `quantity`.
    #[must_use]
    pub fn applies_to_quantity(&self, quantity: u32) -> bool {
        self.min_qty.is_none_or(|min_qty| min_qty <= quantity)
    }
}

/// Reference to an amount held in an external price list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalPriceRef {
    /// Kind of amount the referenced record provides.
    pub kind: PriceKind,

    /// Referenced price list record.
    pub price_list_item: PriceListItemUuid,
}

/// Where the amounts for a priceable thing come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSource {
    /// Embedded price entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<PriceEntry>,

    /// External price list references; these take precedence over embedded entries.
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub external: SmallVec<[ExternalPriceRef; 1]>,
}

impl PriceSource {
    /// A source made of embedded entries only.
    #[must_use]
    pub fn from_entries(entries: Vec<PriceEntry>) -> Self {
        Self {
            entries,
            external: SmallVec::new(),
        }
    }

    /// A source backed by a single external price list record.
    #[must_use]
    pub fn external(kind: PriceKind, price_list_item: PriceListItemUuid) -> Self {
        let mut external = SmallVec::new();

        external.push(ExternalPriceRef {
            kind,
            price_list_item,
        });

        Self {
            entries: Vec::new(),
            external,
        }
    }

    /// The external reference that serves a lookup for `kind`, following the kind's
    /// preference order.
    #[must_use]
    pub fn external_ref(&self, kind: PriceKind) -> Option<&ExternalPriceRef> {
        kind.lookup_order().iter().find_map(|candidate| {
            self.external
                .iter()
                .find(|reference| reference.kind == *candidate)
        })
    }

    /// Every price list record this source may read.
    pub fn price_list_items(&self) -> impl Iterator<Item = PriceListItemUuid> + '_ {
        self.external.iter().map(|reference| reference.price_list_item)
    }
}

/// Select the active entry for `kind` at `now`.
///
/// The kind's preference order is tried one step at a time: an exact-kind match always
/// wins over a fallback kind. Within a step, entries outside their window or above the
/// requested quantity are discarded, then the highest `min_qty` wins, ties broken by the
/// most recent `active_from`. Remaining ties keep the first entry in list order.
#[must_use]
pub fn select_entry(
    entries: &[PriceEntry],
    kind: PriceKind,
    quantity: u32,
    now: Timestamp,
) -> Option<&PriceEntry> {
    kind.lookup_order().iter().find_map(|candidate| {
        entries
            .iter()
            .filter(|entry| entry.kind == *candidate)
            .filter(|entry| entry.is_active_at(now) && entry.applies_to_quantity(quantity))
            .min_by_key(|entry| Reverse((entry.min_qty.unwrap_or(0), entry.active_from)))
    })
}

/// Amount of the active entry for `kind` at `now`, or zero when none qualifies.
#[must_use]
pub fn select_price(entries: &[PriceEntry], kind: PriceKind, quantity: u32, now: Timestamp) -> i64 {
    select_entry(entries, kind, quantity, now).map_or(0, |entry| entry.value.amount)
}
