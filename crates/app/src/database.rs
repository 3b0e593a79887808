//! Tenant-scoped database access
//!
//! Every pricebook table carries a `tenant_uuid` and a row-level security policy that
//! compares it with `current_tenant_uuid()`. That function reads the transaction-local
//! setting written here, so services only ever see their tenant's catalog, prices,
//! orders, promotions and redemptions.

use pricebook::ids::TenantUuid;
use sqlx::{PgPool, Postgres, Transaction, migrate::MigrateError, postgres::PgPoolOptions, query};
use tracing::debug;

/// Transaction-local setting read by `current_tenant_uuid()`.
pub const TENANT_SETTING: &str = "app.current_tenant_uuid";

const SET_TENANT_SQL: &str = "SELECT set_config($1, $2, true)";

const MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a transaction bound to `tenant`. The setting is dropped on commit or
    /// rollback, so pooled connections never leak a tenant into the next caller.
    ///
    /// # Errors
    ///
    /// Returns an error when the transaction cannot be started or scoped.
    pub async fn begin_tenant_transaction(
        &self,
        tenant: TenantUuid,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_TENANT_SQL)
            .bind(TENANT_SETTING)
            .bind(tenant.to_string())
            .execute(&mut *tx)
            .await?;

        debug!(tenant_uuid = %tenant, "opened tenant transaction");

        Ok(tx)
    }

    /// Apply the pricebook schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error when a migration fails or the history does not match.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}
