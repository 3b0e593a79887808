//! Promotion evaluation properties

use jiff::Timestamp;
use pricebook::{
    cart::{Cart, CartSnapshot, ServiceType},
    catalog::{CatalogItem, TranslatedLabel},
    ids::{CatalogItemUuid, CategoryUuid, PromotionUuid, UserUuid},
    lookups::{InMemoryPriceList, UsageSnapshot},
    prices::{PriceEntry, PriceKind, PriceSource},
    pricing::{CartLine, PricedLine, price_line},
    promotions::{
        BuyXGetY, Eligibility, ExclusionReason, Promotion, PromotionEffect, PromotionKind,
        PromotionRules, PromotionScope, StackingPolicy, Usage, check_eligibility,
        compute_discount, evaluate_promotions,
    },
};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::EUR};
use smallvec::smallvec;
use testresult::TestResult;

fn promotion(effect: PromotionEffect) -> Promotion {
    Promotion {
        uuid: PromotionUuid::new(),
        name: "Test promotion".to_string(),
        kind: PromotionKind::Auto,
        code: None,
        is_active: true,
        is_published: true,
        priority: 0,
        stacking_policy: StackingPolicy::Exclusive,
        rules: PromotionRules::default(),
        effect,
    }
}

fn priced(unit: i64, quantity: u32, category: CategoryUuid) -> TestResult<PricedLine> {
    let item = CatalogItem {
        uuid: CatalogItemUuid::new(),
        name: TranslatedLabel::en("Slice"),
        category_ids: smallvec![category],
        image: None,
        allergens: Vec::new(),
        dietary_flags: Vec::new(),
        prices: PriceSource::from_entries(vec![PriceEntry::new(PriceKind::Base, unit)]),
        variants: Vec::new(),
        modifier_groups: Vec::new(),
    };

    let line = CartLine::new(item.uuid).with_quantity(quantity);

    Ok(price_line(&item, &line, &InMemoryPriceList::new(), EUR, Timestamp::now())?)
}

fn snapshot(lines: &[PricedLine], user: Option<UserUuid>) -> TestResult<CartSnapshot> {
    let cart = Cart {
        service_type: ServiceType::Pickup,
        branch: None,
        user,
        coupon_codes: Vec::new(),
        delivery_fee: 0,
        lines: Vec::new(),
    };

    Ok(CartSnapshot::from_priced_lines(&cart, lines, EUR)?)
}

fn bxgy(category: CategoryUuid) -> Promotion {
    let mut promotion = promotion(PromotionEffect::Bxgy {
        bxgy: BuyXGetY {
            buy_qty: 2,
            get_qty: 1,
        },
    });

    promotion.rules.scope = Some(PromotionScope {
        category_ids: vec![category],
        ..PromotionScope::default()
    });

    promotion
}

#[test]
fn percentage_of_999_floors() -> TestResult {
    let cart = snapshot(&[priced(999, 1, CategoryUuid::new())?], None)?;
    let promotion = promotion(PromotionEffect::Percentage {
        value: Decimal::from(10),
    });

    assert_eq!(compute_discount(&promotion, &cart)?.amount, Money::from_minor(99, EUR));

    Ok(())
}

#[test]
fn fixed_discount_larger_than_subtotal_equals_subtotal() -> TestResult {
    let category = CategoryUuid::new();

    for subtotal in [1, 250, 4_999] {
        let cart = snapshot(&[priced(subtotal, 1, category)?], None)?;
        let promotion = promotion(PromotionEffect::Fixed {
            value: subtotal + 1,
        });

        assert_eq!(
            compute_discount(&promotion, &cart)?.amount,
            Money::from_minor(subtotal, EUR)
        );
    }

    Ok(())
}

#[test]
fn bxgy_counts_complete_groups_only() -> TestResult {
    let pizza = CategoryUuid::new();

    for (quantity, expected) in [(2, 0), (3, 800), (5, 800), (6, 1_600)] {
        let cart = snapshot(&[priced(800, quantity, pizza)?], None)?;

        assert_eq!(
            compute_discount(&bxgy(pizza), &cart)?.amount,
            Money::from_minor(expected, EUR),
            "quantity {quantity}"
        );
    }

    Ok(())
}

#[test]
fn bxgy_gives_away_the_cheapest_matching_unit() -> TestResult {
    let pizza = CategoryUuid::new();

    let cart = snapshot(
        &[
            priced(1_200, 1, pizza)?,
            priced(900, 1, pizza)?,
            priced(1_000, 1, pizza)?,
            priced(100, 5, CategoryUuid::new())?,
        ],
        None,
    )?;

    assert_eq!(compute_discount(&bxgy(pizza), &cart)?.amount, Money::from_minor(900, EUR));

    Ok(())
}

#[test]
fn first_order_promotions_need_a_new_signed_in_user() -> TestResult {
    let mut welcome = promotion(PromotionEffect::Fixed { value: 500 });
    welcome.rules.first_order_only = true;

    let lines = [priced(2_000, 1, CategoryUuid::new())?];
    let now = Timestamp::now();

    let newcomer = UsageSnapshot::default();
    let regular = UsageSnapshot {
        prior_orders: 3,
        ..UsageSnapshot::default()
    };

    let guest_cart = snapshot(&lines, None)?;
    let user_cart = snapshot(&lines, Some(UserUuid::new()))?;

    assert_eq!(
        check_eligibility(&welcome, &guest_cart, now, Usage::new(&newcomer, &newcomer))?,
        Eligibility::Excluded(ExclusionReason::SignedInUserRequired)
    );
    assert_eq!(
        check_eligibility(&welcome, &user_cart, now, Usage::new(&newcomer, &newcomer))?,
        Eligibility::Eligible
    );
    assert_eq!(
        check_eligibility(&welcome, &user_cart, now, Usage::new(&regular, &regular))?,
        Eligibility::Excluded(ExclusionReason::NotFirstOrder)
    );

    Ok(())
}

#[test]
fn evaluation_never_discounts_below_zero() -> TestResult {
    let cart = snapshot(&[priced(700, 1, CategoryUuid::new())?], None)?;
    let usage = UsageSnapshot::default();

    let mut promotions = Vec::new();

    for priority in 0..4 {
        let mut stackable = promotion(PromotionEffect::Fixed { value: 300 });
        stackable.priority = priority;
        stackable.stacking_policy = StackingPolicy::WithSame;
        promotions.push(stackable);
    }

    let usage = Usage::new(&usage, &usage);
    let applied = evaluate_promotions(&promotions, &cart, Timestamp::now(), usage)?;

    let total: i64 = applied
        .iter()
        .map(|discount| discount.amount.to_minor_units())
        .sum();

    assert_eq!(total, 700);
    assert_eq!(applied.len(), 3);

    Ok(())
}
