//! Pricebook prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartSnapshot, CartSnapshotLine, ServiceType},
    catalog::{CatalogItem, Locale, ModifierGroup, ModifierOption, TranslatedLabel, Variant},
    fixtures::{Fixture, FixtureError},
    ids::{
        BranchUuid, CatalogItemUuid, CategoryUuid, OrderUuid, PriceListItemUuid, PromotionUuid,
        RedemptionUuid, TenantUuid, TypedUuid, UserUuid,
    },
    lookups::{
        Catalog, ExternalPrice, InMemoryCatalog, InMemoryPriceList, LookupError, OrderHistory,
        PriceList, PriceListRecord, RedemptionCounts, UsageSnapshot, find_currency,
    },
    modifiers::{ModifierError, ModifierSelection, validate_selections},
    prices::{PriceEntry, PriceKind, PriceSource, select_entry, select_price},
    pricing::{CartLine, LineItemPricer, PricedLine, PricingError, price_line},
    promotions::{
        AppliedDiscount, BuyXGetY, Discount, DiscountError, EffectType, Eligibility,
        ExclusionReason, MinOrder, ParseValueError, Promotion, PromotionEffect, PromotionError,
        PromotionKind, PromotionRules, PromotionScope, StackingPolicy, Usage,
        check_eligibility, compute_discount, evaluate_promotions, match_promotions,
        resolve_coupon,
    },
    quote::{Quote, QuoteError, Quoter},
    redemptions::{
        InMemoryLedger, NewRedemption, Redemption, RedemptionLedger, RedemptionOutcome,
    },
    variants::{VariantError, resolve_variant},
};
