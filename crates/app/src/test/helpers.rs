//! Test Helpers

use pricebook::{
    catalog::{CatalogItem, TranslatedLabel},
    ids::{CatalogItemUuid, PromotionUuid},
    prices::{PriceEntry, PriceKind, PriceSource},
    promotions::{Promotion, PromotionEffect, PromotionKind, PromotionRules, StackingPolicy},
};

/// A plain item with a single base price and no variants or modifiers.
pub(crate) fn catalog_item(name: &str, base: i64) -> CatalogItem {
    CatalogItem {
        uuid: CatalogItemUuid::new(),
        name: TranslatedLabel::en(name),
        category_ids: smallvec::smallvec![],
        image: None,
        allergens: Vec::new(),
        dietary_flags: Vec::new(),
        prices: PriceSource::from_entries(vec![PriceEntry::new(PriceKind::Base, base)]),
        variants: Vec::new(),
        modifier_groups: Vec::new(),
    }
}

/// An active, published automatic promotion.
pub(crate) fn auto_promotion(name: &str, priority: i32, effect: PromotionEffect) -> Promotion {
    Promotion {
        uuid: PromotionUuid::new(),
        name: name.to_string(),
        kind: PromotionKind::Auto,
        code: None,
        is_active: true,
        is_published: true,
        priority,
        stacking_policy: StackingPolicy::Exclusive,
        rules: PromotionRules::default(),
        effect,
    }
}

/// An active, published coupon promotion named after its code.
pub(crate) fn coupon(code: &str, effect: PromotionEffect) -> Promotion {
    Promotion {
        kind: PromotionKind::Coupon,
        code: Some(code.to_string()),
        ..auto_promotion(code, 0, effect)
    }
}
