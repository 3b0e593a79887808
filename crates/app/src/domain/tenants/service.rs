//! Tenants service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;
use tracing::info;

use crate::domain::tenants::{
    data::NewTenant, errors::TenantsServiceError, records::TenantRecord,
    repository::PgTenantsRepository,
};

#[derive(Debug, Clone)]
pub struct PgTenantsService {
    repository: PgTenantsRepository,
}

impl PgTenantsService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgTenantsRepository::new(pool),
        }
    }
}

#[async_trait]
impl TenantsService for PgTenantsService {
    #[tracing::instrument(
        name = "tenants.service.create_tenant",
        skip(self, tenant),
        fields(tenant_uuid = %tenant.uuid),
        err
    )]
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError> {
        let record = self.repository.create_tenant(tenant).await?;

        info!("created tenant");

        Ok(record)
    }
}

#[automock]
#[async_trait]
/// Tenant persistence operations.
pub trait TenantsService: Send + Sync {
    /// Creates a new tenant.
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError>;
}
