//! Line pricing properties

use jiff::{SignedDuration, Timestamp};
use pricebook::{
    catalog::{CatalogItem, ModifierGroup, ModifierOption, TranslatedLabel, Variant},
    ids::CatalogItemUuid,
    lookups::InMemoryPriceList,
    modifiers::{ModifierError, ModifierSelection},
    prices::{PriceEntry, PriceKind, PriceSource, select_price},
    pricing::{CartLine, PricingError, price_line},
};
use rusty_money::{Money, iso::EUR};
use testresult::TestResult;

fn item(variants: Vec<Variant>, modifier_groups: Vec<ModifierGroup>) -> CatalogItem {
    CatalogItem {
        uuid: CatalogItemUuid::new(),
        name: TranslatedLabel::en("Lemonade"),
        category_ids: Default::default(),
        image: Some("https://cdn.example.test/lemonade.png".to_string()),
        allergens: Vec::new(),
        dietary_flags: vec!["vegan".to_string()],
        prices: PriceSource::default(),
        variants,
        modifier_groups,
    }
}

fn variant(code: &str, entries: Vec<PriceEntry>) -> Variant {
    Variant {
        code: code.to_string(),
        slug: None,
        name: TranslatedLabel::en(code),
        size_label: TranslatedLabel::default(),
        is_default: false,
        is_active: true,
        prices: PriceSource::from_entries(entries),
    }
}

fn toppings(is_required: bool) -> ModifierGroup {
    let option = |code: &str| ModifierOption {
        code: code.to_string(),
        name: TranslatedLabel::en(code),
        prices: PriceSource::from_entries(vec![PriceEntry::new(PriceKind::Surcharge, 50)]),
    };

    ModifierGroup {
        code: "toppings".to_string(),
        name: TranslatedLabel::en("Toppings"),
        is_required,
        min_select: Some(1),
        max_select: Some(2),
        options: vec![option("mint"), option("ginger"), option("lime")],
    }
}

#[test]
fn single_variant_with_deposit_prices_at_120() -> TestResult {
    let item = item(
        vec![variant(
            "bottle",
            vec![
                PriceEntry::new(PriceKind::Base, 100),
                PriceEntry::new(PriceKind::Deposit, 20),
            ],
        )],
        Vec::new(),
    );

    let priced = price_line(
        &item,
        &CartLine::new(item.uuid),
        &InMemoryPriceList::new(),
        EUR,
        Timestamp::now(),
    )?;

    assert_eq!(priced.unit_price, Money::from_minor(120, EUR));
    assert_eq!(priced.components.base, Money::from_minor(100, EUR));
    assert_eq!(priced.components.deposit, Money::from_minor(20, EUR));
    assert_eq!(priced.snapshot.variant_code.as_deref(), Some("bottle"));
    assert_eq!(priced.snapshot.dietary_flags, vec!["vegan".to_string()]);

    Ok(())
}

#[test]
fn disjoint_windows_only_ever_select_the_current_entry() -> TestResult {
    let noon = Timestamp::from_second(1_750_000_000)?;
    let hour = SignedDuration::from_hours(1);

    let entries = vec![
        PriceEntry::new(PriceKind::Base, 300)
            .active_between(Some(noon - hour * 3), Some(noon - hour)),
        PriceEntry::new(PriceKind::Base, 200).active_between(Some(noon), Some(noon + hour)),
        PriceEntry::new(PriceKind::Base, 100).active_between(Some(noon + hour * 2), None),
    ];

    for _ in 0..10 {
        assert_eq!(select_price(&entries, PriceKind::Base, 1, noon), 200);
    }

    assert_eq!(select_price(&entries, PriceKind::Base, 1, noon - hour * 2), 300);
    assert_eq!(select_price(&entries, PriceKind::Base, 1, noon + hour * 3), 100);

    Ok(())
}

#[test]
fn modifier_cardinality_for_min_one_max_two() -> TestResult {
    let select = |count: usize| -> CartLine {
        let mut line = CartLine::new(CatalogItemUuid::new());

        for code in ["mint", "ginger", "lime"].into_iter().take(count) {
            line = line.with_modifier(ModifierSelection::new("toppings", code));
        }

        line
    };

    let price = |item: &CatalogItem, count: usize| {
        let mut line = select(count);
        line.catalog_item = item.uuid;

        price_line(item, &line, &InMemoryPriceList::new(), EUR, Timestamp::now())
    };

    let base = vec![PriceEntry::new(PriceKind::Base, 300)];
    let required = item(vec![variant("glass", base.clone())], vec![toppings(true)]);
    let optional = item(vec![variant("glass", base)], vec![toppings(false)]);

    assert!(matches!(
        price(&required, 0),
        Err(PricingError::Modifier(ModifierError::RequiredMissing { .. }))
    ));
    assert!(price(&optional, 0).is_ok());

    assert_eq!(price(&required, 1)?.unit_price, Money::from_minor(350, EUR));
    assert_eq!(price(&required, 2)?.unit_price, Money::from_minor(400, EUR));

    let too_many = price(&required, 3);

    assert!(matches!(
        too_many,
        Err(PricingError::Modifier(ModifierError::MaxExceeded { max: 2, count: 3, .. }))
    ));
    assert_eq!(too_many.map_err(|error| error.code()).err(), Some("modifierMaxExceeded"));

    Ok(())
}

#[test]
fn several_variants_without_default_need_a_code() -> TestResult {
    let item = item(
        vec![
            variant("small", vec![PriceEntry::new(PriceKind::Base, 200)]),
            variant("large", vec![PriceEntry::new(PriceKind::Base, 300)]),
        ],
        Vec::new(),
    );

    let price_list = InMemoryPriceList::new();
    let now = Timestamp::now();

    let missing = price_line(&item, &CartLine::new(item.uuid), &price_list, EUR, now);

    assert_eq!(missing.map_err(|error| error.code()).err(), Some("variantRequired"));

    let unknown = price_line(
        &item,
        &CartLine::new(item.uuid).with_variant("medium"),
        &price_list,
        EUR,
        now,
    );

    assert!(matches!(unknown, Err(PricingError::VariantNotFound(code)) if code == "medium"));

    let large = price_line(
        &item,
        &CartLine::new(item.uuid).with_variant("LARGE"),
        &price_list,
        EUR,
        now,
    )?;

    assert_eq!(large.unit_price, Money::from_minor(300, EUR));

    Ok(())
}
