//! Price Lists Service

use async_trait::async_trait;
use mockall::automock;
use pricebook::{
    ids::{PriceListItemUuid, TenantUuid},
    lookups::{ExternalPrice, PriceListRecord, find_currency},
};
use rusty_money::iso::Currency;
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::price_lists::{
        PriceListsServiceError, records::PriceListItemRecord, repository::PgPriceListsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgPriceListsService {
    db: Db,
    repository: PgPriceListsRepository,
}

impl PgPriceListsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgPriceListsRepository::new(),
        }
    }
}

#[async_trait]
impl PriceListsService for PgPriceListsService {
    #[tracing::instrument(
        name = "price_lists.service.create_price_list_item",
        skip(self, record),
        fields(tenant_uuid = %tenant, price_list_item_uuid = %record.uuid),
        err
    )]
    async fn create_price_list_item(
        &self,
        tenant: TenantUuid,
        record: PriceListRecord,
    ) -> Result<PriceListItemRecord, PriceListsServiceError> {
        if let Some(code) = record.currency.as_deref() {
            find_currency(code)?;
        }

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let created = self.repository.create_price_list_item(&mut tx, record).await?;

        tx.commit().await?;

        info!("created price list item");

        Ok(created)
    }

    #[tracing::instrument(
        name = "price_lists.service.get_external_price",
        skip(self, fallback_currency),
        fields(
            tenant_uuid = %tenant,
            price_list_item_uuid = %item,
            currency = tracing::field::Empty
        ),
        err
    )]
    async fn get_external_price(
        &self,
        tenant: TenantUuid,
        item: PriceListItemUuid,
        fallback_currency: &'static Currency,
    ) -> Result<ExternalPrice, PriceListsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.get_price_list_item(&mut tx, item).await?;

        tx.commit().await?;

        let currency = match record.currency.as_deref() {
            Some(code) => find_currency(code)?,
            None => fallback_currency,
        };

        Span::current().record("currency", currency.iso_alpha_code);

        debug!(amount = record.amount, "resolved external price");

        Ok(ExternalPrice {
            amount: record.amount,
            currency,
        })
    }
}

#[automock]
#[async_trait]
pub trait PriceListsService: Send + Sync {
    /// Store a price list record for the tenant.
    async fn create_price_list_item(
        &self,
        tenant: TenantUuid,
        record: PriceListRecord,
    ) -> Result<PriceListItemRecord, PriceListsServiceError>;

    /// Resolve a price list record. Records without a currency take `fallback_currency`;
    /// a missing record is [`PriceListsServiceError::NotFound`], never a zero price.
    async fn get_external_price(
        &self,
        tenant: TenantUuid,
        item: PriceListItemUuid,
        fallback_currency: &'static Currency,
    ) -> Result<ExternalPrice, PriceListsServiceError>;
}
