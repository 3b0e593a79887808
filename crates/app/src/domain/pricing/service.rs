//! Pricing Service

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use pricebook::{
    cart::{Cart, CartSnapshot},
    ids::{CatalogItemUuid, PriceListItemUuid, PromotionUuid, TenantUuid, UserUuid},
    lookups::{InMemoryCatalog, InMemoryPriceList, PriceListRecord, UsageSnapshot},
    pricing::{CartLine, LineItemPricer, PricedLine},
    promotions::{AppliedDiscount, Promotion, Usage, evaluate_promotions},
    quote::{Quote, Quoter},
};
use rusty_money::iso::Currency;
use sqlx::{Postgres, Transaction};
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::{
        catalog::repository::PgCatalogRepository, orders::repository::PgOrdersRepository,
        price_lists::repository::PgPriceListsRepository, pricing::PricingServiceError,
        promotions::repository::PgPromotionsRepository,
        redemptions::repository::PgRedemptionsRepository,
    },
};

/// Everything the engine reads for one request, fetched up front.
#[derive(Debug)]
struct Prefetched {
    catalog: InMemoryCatalog,
    price_list: InMemoryPriceList,
    promotions: Vec<Promotion>,
    usage: UsageSnapshot,
}

#[derive(Debug, Clone)]
pub struct PgPricingService {
    db: Db,
    fallback_currency: &'static Currency,
    catalog: PgCatalogRepository,
    price_lists: PgPriceListsRepository,
    orders: PgOrdersRepository,
    promotions: PgPromotionsRepository,
    redemptions: PgRedemptionsRepository,
}

impl PgPricingService {
    #[must_use]
    pub fn new(db: Db, fallback_currency: &'static Currency) -> Self {
        Self {
            db,
            fallback_currency,
            catalog: PgCatalogRepository::new(),
            price_lists: PgPriceListsRepository::new(),
            orders: PgOrdersRepository::new(),
            promotions: PgPromotionsRepository::new(),
            redemptions: PgRedemptionsRepository::new(),
        }
    }

    async fn load_catalog(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        lines: &[CartLine],
    ) -> Result<(InMemoryCatalog, InMemoryPriceList), PricingServiceError> {
        let mut items: Vec<CatalogItemUuid> = lines.iter().map(|line| line.catalog_item).collect();

        items.sort_unstable();
        items.dedup();

        let catalog: InMemoryCatalog = self
            .catalog
            .get_catalog_items(tx, &items)
            .await?
            .into_iter()
            .map(|record| record.item)
            .collect();

        let mut references: Vec<PriceListItemUuid> = items
            .iter()
            .filter_map(|uuid| catalog.get(*uuid))
            .flat_map(|item| item.price_sources())
            .flat_map(|source| source.price_list_items())
            .collect();

        references.sort_unstable();
        references.dedup();

        let price_list = if references.is_empty() {
            InMemoryPriceList::new()
        } else {
            self.price_lists
                .get_price_list_items(tx, &references)
                .await?
                .into_iter()
                .map(PriceListRecord::from)
                .collect()
        };

        debug!(
            catalog_items = catalog.len(),
            price_list_items = references.len(),
            "loaded catalog"
        );

        Ok((catalog, price_list))
    }

    async fn load_promotions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: Option<UserUuid>,
    ) -> Result<(Vec<Promotion>, UsageSnapshot), PricingServiceError> {
        let promotions: Vec<Promotion> = self
            .promotions
            .list_active_promotions(tx)
            .await?
            .into_iter()
            .map(|record| record.promotion)
            .collect();

        let mut usage = UsageSnapshot::default();

        if promotions.is_empty() {
            return Ok((promotions, usage));
        }

        let uuids: Vec<PromotionUuid> = promotions.iter().map(|promotion| promotion.uuid).collect();

        usage.redemptions = self.redemptions.count_redemptions(tx, &uuids).await?;

        if let Some(user) = user {
            usage.prior_orders = self.orders.count_orders(tx, user).await?;
            usage.user_redemptions = self
                .redemptions
                .count_user_redemptions(tx, &uuids, user)
                .await?;
        }

        debug!(
            promotions = promotions.len(),
            prior_orders = usage.prior_orders,
            "loaded promotions"
        );

        Ok((promotions, usage))
    }

    async fn prefetch(
        &self,
        tenant: TenantUuid,
        lines: &[CartLine],
        user: Option<UserUuid>,
        with_promotions: bool,
    ) -> Result<Prefetched, PricingServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let (catalog, price_list) = if lines.is_empty() {
            (InMemoryCatalog::new(), InMemoryPriceList::new())
        } else {
            self.load_catalog(&mut tx, lines).await?
        };

        let (promotions, usage) = if with_promotions {
            self.load_promotions(&mut tx, user).await?
        } else {
            (Vec::new(), UsageSnapshot::default())
        };

        tx.commit().await?;

        Ok(Prefetched {
            catalog,
            price_list,
            promotions,
            usage,
        })
    }
}

#[async_trait]
impl PricingService for PgPricingService {
    #[tracing::instrument(
        name = "pricing.service.price_line",
        skip(self, line),
        fields(
            tenant_uuid = %tenant,
            catalog_item_uuid = %line.catalog_item,
            unit_price = tracing::field::Empty
        ),
        err
    )]
    async fn price_line(
        &self,
        tenant: TenantUuid,
        line: CartLine,
        now: Timestamp,
    ) -> Result<PricedLine, PricingServiceError> {
        let prefetched = self
            .prefetch(tenant, std::slice::from_ref(&line), None, false)
            .await?;

        let pricer = LineItemPricer::new(&prefetched.price_list, self.fallback_currency);
        let priced = pricer.price_cart_line(&prefetched.catalog, &line, now)?;

        Span::current().record("unit_price", tracing::field::display(priced.unit_price));

        debug!("priced line");

        Ok(priced)
    }

    #[tracing::instrument(
        name = "pricing.service.quote",
        skip(self, cart),
        fields(
            tenant_uuid = %tenant,
            lines = cart.lines.len(),
            discounts = tracing::field::Empty,
            rejected_coupons = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn quote(
        &self,
        tenant: TenantUuid,
        cart: Cart,
        now: Timestamp,
    ) -> Result<Quote, PricingServiceError> {
        let prefetched = self.prefetch(tenant, &cart.lines, cart.user, true).await?;

        let quote = build_quote(&prefetched, &cart, self.fallback_currency, now)?;

        let span = Span::current();

        span.record("discounts", quote.discounts().len());
        span.record("rejected_coupons", quote.rejected_coupons().len());
        span.record("total", tracing::field::display(quote.total()));

        info!("quoted cart");

        Ok(quote)
    }

    #[tracing::instrument(
        name = "pricing.service.evaluate_promotions",
        skip(self, cart),
        fields(tenant_uuid = %tenant, discounts = tracing::field::Empty),
        err
    )]
    async fn evaluate_promotions(
        &self,
        tenant: TenantUuid,
        cart: CartSnapshot,
        now: Timestamp,
    ) -> Result<Vec<AppliedDiscount>, PricingServiceError> {
        let prefetched = self.prefetch(tenant, &[], cart.user, true).await?;

        let discounts = evaluate(&prefetched, &cart, now)?;

        Span::current().record("discounts", discounts.len());

        debug!("evaluated promotions");

        Ok(discounts)
    }
}

fn build_quote(
    prefetched: &Prefetched,
    cart: &Cart,
    fallback_currency: &'static Currency,
    now: Timestamp,
) -> Result<Quote, PricingServiceError> {
    let usage = Usage::new(&prefetched.usage, &prefetched.usage);
    let quoter = Quoter::new(
        &prefetched.catalog,
        &prefetched.price_list,
        &prefetched.promotions,
        fallback_currency,
    );

    Ok(quoter.quote(cart, usage, now)?)
}

fn evaluate(
    prefetched: &Prefetched,
    cart: &CartSnapshot,
    now: Timestamp,
) -> Result<Vec<AppliedDiscount>, PricingServiceError> {
    let usage = Usage::new(&prefetched.usage, &prefetched.usage);

    Ok(evaluate_promotions(&prefetched.promotions, cart, now, usage)?)
}

/// Prices carts for one tenant.
///
/// Reads happen in a single tenant transaction that is committed before any price is
/// computed, so a quote reflects one consistent view of the catalog and usage counts.
/// Quotes are advisory: nothing here records a redemption.
#[automock]
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Price a single cart line.
    async fn price_line(
        &self,
        tenant: TenantUuid,
        line: CartLine,
        now: Timestamp,
    ) -> Result<PricedLine, PricingServiceError>;

    /// Price every line of a cart and apply the tenant's promotions.
    async fn quote(
        &self,
        tenant: TenantUuid,
        cart: Cart,
        now: Timestamp,
    ) -> Result<Quote, PricingServiceError>;

    /// Evaluate the tenant's promotions against an already-priced cart.
    async fn evaluate_promotions(
        &self,
        tenant: TenantUuid,
        cart: CartSnapshot,
        now: Timestamp,
    ) -> Result<Vec<AppliedDiscount>, PricingServiceError>;
}

#[cfg(test)]
mod tests {
    use pricebook::{
        fixtures::Fixture,
        ids::OrderUuid,
        pricing::PricingError,
        promotions::{EffectType, PromotionEffect},
        quote::QuoteError,
        redemptions::NewRedemption,
    };
    use rusty_money::{Money, iso::EUR};
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::{
        domain::{
            catalog::CatalogService, price_lists::PriceListsService,
            promotions::PromotionsService, redemptions::RedemptionsService,
        },
        test::{TestContext, helpers::auto_promotion},
    };

    use super::*;

    const MARGHERITA_PRICE: &str = "0195e3a0-3000-7000-8000-000000000001";

    async fn seed_lunch(ctx: &TestContext, fixture: &Fixture) -> TestResult {
        for key in ["burger", "cola", "margherita"] {
            ctx.catalog
                .create_catalog_item(ctx.tenant_uuid, fixture.item(key)?.clone())
                .await?;
        }

        ctx.price_lists
            .create_price_list_item(
                ctx.tenant_uuid,
                PriceListRecord {
                    uuid: PriceListItemUuid::from_uuid(Uuid::parse_str(MARGHERITA_PRICE)?),
                    amount: 1_100,
                    currency: Some("EUR".to_string()),
                },
            )
            .await?;

        for promotion in fixture.promotions() {
            ctx.promotions
                .create_promotion(ctx.tenant_uuid, promotion.clone())
                .await?;
        }

        Ok(())
    }

    #[tokio::test]
    async fn quotes_the_lunch_cart_from_storage() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = Fixture::from_set("lunch")?;

        seed_lunch(&ctx, &fixture).await?;

        let quote = ctx
            .pricing
            .quote(ctx.tenant_uuid, fixture.cart()?.clone(), Timestamp::now())
            .await?;

        assert_eq!(quote.lines().len(), 3);
        assert_eq!(quote.subtotal(), Money::from_minor(3_575, EUR));
        assert_eq!(quote.discount_total(), Money::from_minor(357, EUR));
        assert_eq!(quote.delivery_fee(), Money::from_minor(0, EUR));
        assert_eq!(quote.total(), Money::from_minor(3_218, EUR));
        assert!(quote.rejected_coupons().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn unknown_coupon_codes_are_returned_with_the_quote() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = Fixture::from_set("lunch")?;

        seed_lunch(&ctx, &fixture).await?;

        let mut cart = fixture.cart()?.clone();

        cart.coupon_codes.push("NOPE".to_string());

        let quote = ctx
            .pricing
            .quote(ctx.tenant_uuid, cart, Timestamp::now())
            .await?;

        assert_eq!(quote.rejected_coupons(), ["NOPE".to_string()]);
        assert_eq!(quote.total(), Money::from_minor(3_218, EUR));

        Ok(())
    }

    #[tokio::test]
    async fn price_line_uses_stored_price_list_items() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = Fixture::from_set("lunch")?;

        seed_lunch(&ctx, &fixture).await?;

        let margherita = fixture.item("margherita")?.uuid;

        let priced = ctx
            .pricing
            .price_line(ctx.tenant_uuid, CartLine::new(margherita), Timestamp::now())
            .await?;

        assert_eq!(priced.unit_price, Money::from_minor(1_100, EUR));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_items_are_reported() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .pricing
            .price_line(
                ctx.tenant_uuid,
                CartLine::new(CatalogItemUuid::new()),
                Timestamp::now(),
            )
            .await;

        assert!(
            matches!(
                result,
                Err(PricingServiceError::Pricing(PricingError::MenuItemNotFound(_)))
            ),
            "expected MenuItemNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn items_of_other_tenants_are_not_priced() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = Fixture::from_set("lunch")?;
        let other = ctx.create_tenant("Other Tenant").await;

        seed_lunch(&ctx, &fixture).await?;

        let result = ctx
            .pricing
            .quote(other, fixture.cart()?.clone(), Timestamp::now())
            .await;

        assert!(
            matches!(
                result,
                Err(PricingServiceError::Quote(QuoteError::Pricing(
                    PricingError::MenuItemNotFound(_)
                )))
            ),
            "expected MenuItemNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn exhausted_usage_limits_drop_the_promotion() -> TestResult {
        let ctx = TestContext::new().await;
        let mut fixture = Fixture::from_set("lunch")?;

        for promotion in fixture.promotions_mut() {
            if promotion.code.is_some() {
                promotion.rules.usage_limit = Some(1);
            }
        }

        seed_lunch(&ctx, &fixture).await?;

        let coupon = fixture.promotion("lunch_coupon")?.uuid;
        let order: OrderUuid = ctx.create_order(None).await;

        ctx.redemptions
            .redeem(
                ctx.tenant_uuid,
                NewRedemption {
                    promotion: coupon,
                    order,
                    user: None,
                    amount: Money::from_minor(357, EUR),
                },
            )
            .await?;

        let quote = ctx
            .pricing
            .quote(ctx.tenant_uuid, fixture.cart()?.clone(), Timestamp::now())
            .await?;

        assert!(quote.discounts().iter().all(|discount| discount.promotion != coupon));
        assert_eq!(quote.discount_total(), Money::from_minor(0, EUR));
        assert_eq!(quote.total(), Money::from_minor(3_575, EUR));

        Ok(())
    }

    #[tokio::test]
    async fn first_order_promotions_stop_after_an_order() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = Fixture::from_set("lunch")?;
        let user = UserUuid::new();

        seed_lunch(&ctx, &fixture).await?;

        let mut welcome = auto_promotion("Welcome", 50, PromotionEffect::Fixed { value: 500 });
        welcome.rules.first_order_only = true;

        ctx.promotions
            .create_promotion(ctx.tenant_uuid, welcome.clone())
            .await?;

        let mut cart = fixture.cart()?.clone();
        cart.user = Some(user);

        let before = ctx
            .pricing
            .quote(ctx.tenant_uuid, cart.clone(), Timestamp::now())
            .await?;

        assert!(before.discounts().iter().any(|discount| discount.promotion == welcome.uuid));

        ctx.create_order(Some(user)).await;

        let after = ctx
            .pricing
            .quote(ctx.tenant_uuid, cart, Timestamp::now())
            .await?;

        assert!(after.discounts().iter().all(|discount| discount.promotion != welcome.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn evaluate_promotions_reads_stored_promotions() -> TestResult {
        let ctx = TestContext::new().await;
        let fixture = Fixture::from_set("lunch")?;

        seed_lunch(&ctx, &fixture).await?;

        let quote = ctx
            .pricing
            .quote(ctx.tenant_uuid, fixture.cart()?.clone(), Timestamp::now())
            .await?;

        let snapshot = CartSnapshot::from_priced_lines(fixture.cart()?, quote.lines(), EUR)?;

        let discounts = ctx
            .pricing
            .evaluate_promotions(ctx.tenant_uuid, snapshot, Timestamp::now())
            .await?;

        let types: Vec<EffectType> = discounts
            .iter()
            .map(|discount| discount.effect_type)
            .collect();

        assert_eq!(types, vec![EffectType::FreeDelivery, EffectType::Percentage]);
        assert_eq!(discounts, quote.discounts());

        Ok(())
    }

    #[tokio::test]
    async fn mocked_pricing_service_reports_engine_errors() {
        let mut service = MockPricingService::new();

        service
            .expect_price_line()
            .returning(|_, _, _| Err(PricingError::VariantRequired.into()));

        let result = service
            .price_line(
                TenantUuid::new(),
                CartLine::new(CatalogItemUuid::new()),
                Timestamp::now(),
            )
            .await;

        assert!(matches!(result, Err(ref error) if error.code() == "variantRequired"));
    }
}
