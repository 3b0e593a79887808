//! Typed Uuids

use std::{
    cmp::Ordering,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    hash::{Hash, Hasher},
    marker::PhantomData,
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Marker types that keep identifiers of different entities apart.
pub mod markers {
    /// Tenant marker
    #[derive(Debug)]
    pub enum Tenant {}

    /// Catalog item marker
    #[derive(Debug)]
    pub enum CatalogItem {}

    /// Category marker
    #[derive(Debug)]
    pub enum Category {}

    /// Branch marker
    #[derive(Debug)]
    pub enum Branch {}

    /// Price list item marker
    #[derive(Debug)]
    pub enum PriceListItem {}

    /// Promotion marker
    #[derive(Debug)]
    pub enum Promotion {}

    /// Order marker
    #[derive(Debug)]
    pub enum Order {}

    /// User marker
    #[derive(Debug)]
    pub enum User {}

    /// Redemption marker
    #[derive(Debug)]
    pub enum Redemption {}
}

/// Tenant UUID
pub type TenantUuid = TypedUuid<markers::Tenant>;

/// Catalog Item UUID
pub type CatalogItemUuid = TypedUuid<markers::CatalogItem>;

/// Category UUID
pub type CategoryUuid = TypedUuid<markers::Category>;

/// Branch UUID
pub type BranchUuid = TypedUuid<markers::Branch>;

/// Price List Item UUID
pub type PriceListItemUuid = TypedUuid<markers::PriceListItem>;

/// Promotion UUID
pub type PromotionUuid = TypedUuid<markers::Promotion>;

/// Order UUID
pub type OrderUuid = TypedUuid<markers::Order>;

/// User UUID
pub type UserUuid = TypedUuid<markers::User>;

/// Redemption UUID
pub type RedemptionUuid = TypedUuid<markers::Redemption>;

/// A [`Uuid`] tagged with the entity it identifies.
pub struct TypedUuid<T>(Uuid, PhantomData<T>);

impl<T> TypedUuid<T> {
    /// Generate a new time-ordered (v7) identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::from_uuid(Uuid::now_v7())
    }

    /// Wrap an existing [`Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    /// Unwrap into the untyped [`Uuid`].
    #[must_use]
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl<T> Default for TypedUuid<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TypedUuid<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedUuid<T> {}

impl<T> Debug for TypedUuid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Debug::fmt(&self.0, f)
    }
}

impl<T> Display for TypedUuid<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl<T> PartialEq for TypedUuid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for TypedUuid<T> {}

impl<T> Hash for TypedUuid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> PartialOrd for TypedUuid<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedUuid<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> From<Uuid> for TypedUuid<T> {
    fn from(value: Uuid) -> Self {
        Self::from_uuid(value)
    }
}

impl<T> From<TypedUuid<T>> for Uuid {
    fn from(value: TypedUuid<T>) -> Self {
        value.into_uuid()
    }
}

impl<T> FromStr for TypedUuid<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T> Serialize for TypedUuid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for TypedUuid<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_ids_are_distinct() {
        assert_ne!(PromotionUuid::new(), PromotionUuid::new());
    }

    #[test]
    fn round_trips_through_untyped_uuid() {
        let uuid = Uuid::now_v7();
        let order = OrderUuid::from_uuid(uuid);

        assert_eq!(order.into_uuid(), uuid);
        assert_eq!(Uuid::from(order), uuid);
    }

    #[test]
    fn parses_from_string() -> TestResult {
        let item: CatalogItemUuid = "0190f3a2-7b1c-7c3e-9a51-5b0e6d7f8a90".parse()?;

        assert_eq!(item.to_string(), "0190f3a2-7b1c-7c3e-9a51-5b0e6d7f8a90");

        Ok(())
    }

    #[test]
    fn deserializes_from_plain_uuid_string() -> TestResult {
        let branch: BranchUuid = serde_norway::from_str("0190f3a2-7b1c-7c3e-9a51-5b0e6d7f8a91")?;

        assert_eq!(branch.to_string(), "0190f3a2-7b1c-7c3e-9a51-5b0e6d7f8a91");

        Ok(())
    }
}
