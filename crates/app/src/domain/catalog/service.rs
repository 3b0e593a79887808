//! Catalog Service

use async_trait::async_trait;
use mockall::automock;
use pricebook::{
    catalog::CatalogItem,
    ids::{CatalogItemUuid, TenantUuid},
};
use tracing::{debug, info};

use crate::{
    database::Db,
    domain::catalog::{
        CatalogServiceError, records::CatalogItemRecord, repository::PgCatalogRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogService {
    db: Db,
    repository: PgCatalogRepository,
}

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCatalogRepository::new(),
        }
    }
}

#[async_trait]
impl CatalogService for PgCatalogService {
    #[tracing::instrument(
        name = "catalog.service.create_catalog_item",
        skip(self, item),
        fields(tenant_uuid = %tenant, catalog_item_uuid = %item.uuid),
        err
    )]
    async fn create_catalog_item(
        &self,
        tenant: TenantUuid,
        item: CatalogItem,
    ) -> Result<CatalogItemRecord, CatalogServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.create_catalog_item(&mut tx, &item).await?;

        tx.commit().await?;

        info!("created catalog item");

        Ok(record)
    }

    #[tracing::instrument(
        name = "catalog.service.get_catalog_item",
        skip(self),
        fields(tenant_uuid = %tenant, catalog_item_uuid = %item),
        err
    )]
    async fn get_catalog_item(
        &self,
        tenant: TenantUuid,
        item: CatalogItemUuid,
    ) -> Result<Option<CatalogItem>, CatalogServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.get_catalog_item(&mut tx, item).await?;

        tx.commit().await?;

        debug!(found = record.is_some(), "looked up catalog item");

        Ok(record.map(|record| record.item))
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Store a catalog item for the tenant.
    async fn create_catalog_item(
        &self,
        tenant: TenantUuid,
        item: CatalogItem,
    ) -> Result<CatalogItemRecord, CatalogServiceError>;

    /// Fetch a catalog item, or `None` when the tenant has no such item.
    async fn get_catalog_item(
        &self,
        tenant: TenantUuid,
        item: CatalogItemUuid,
    ) -> Result<Option<CatalogItem>, CatalogServiceError>;
}

#[cfg(test)]
mod tests {
    use pricebook::prices::PriceKind;
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::catalog_item};

    use super::*;

    #[tokio::test]
    async fn created_items_round_trip_through_the_document_column() -> TestResult {
        let ctx = TestContext::new().await;
        let item = catalog_item("Margherita", 1_100);

        let record = ctx
            .catalog
            .create_catalog_item(ctx.tenant_uuid, item.clone())
            .await?;

        assert_eq!(record.uuid, item.uuid);
        assert!(record.deleted_at.is_none());

        let fetched = ctx.catalog.get_catalog_item(ctx.tenant_uuid, item.uuid).await?;

        assert_eq!(fetched.as_ref(), Some(&item));
        assert_eq!(
            fetched.and_then(|item| item.prices.entries.first().map(|entry| entry.kind)),
            Some(PriceKind::Base)
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_items_are_none() -> TestResult {
        let ctx = TestContext::new().await;

        let fetched = ctx
            .catalog
            .get_catalog_item(ctx.tenant_uuid, CatalogItemUuid::new())
            .await?;

        assert!(fetched.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn items_are_invisible_to_other_tenants() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.create_tenant("Other Tenant").await;
        let item = catalog_item("Burger", 950);

        ctx.catalog
            .create_catalog_item(ctx.tenant_uuid, item.clone())
            .await?;

        let fetched = ctx.catalog.get_catalog_item(other, item.uuid).await?;

        assert!(fetched.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_items_return_already_exists() -> TestResult {
        let ctx = TestContext::new().await;
        let item = catalog_item("Burger", 950);

        ctx.catalog
            .create_catalog_item(ctx.tenant_uuid, item.clone())
            .await?;

        let result = ctx.catalog.create_catalog_item(ctx.tenant_uuid, item).await;

        assert!(
            matches!(result, Err(CatalogServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }
}
