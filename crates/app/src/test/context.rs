//! Test context for service-level integration tests.

use jiff::Timestamp;
use pricebook::ids::{OrderUuid, TenantUuid, UserUuid};
use rusty_money::iso::EUR;
use sqlx::{Connection, PgConnection, PgPool, query};

use crate::{
    database::Db,
    domain::{
        catalog::PgCatalogService,
        orders::{OrdersService, PgOrdersService, data::NewOrder},
        price_lists::PgPriceListsService,
        pricing::PgPricingService,
        promotions::PgPromotionsService,
        redemptions::PgRedemptionsService,
        tenants::{PgTenantsService, TenantsService, data::NewTenant},
    },
};

use super::db::TestDb;

/// Name of the non-superuser app role used for RLS testing.
const APP_ROLE: &str = "pricebook_app_test";
const APP_ROLE_PASSWORD: &str = "pricebook_app_test_pass";

pub struct TestContext {
    pub db: TestDb,
    pub tenant_uuid: TenantUuid,
    pub catalog: PgCatalogService,
    pub price_lists: PgPriceListsService,
    pub orders: PgOrdersService,
    pub promotions: PgPromotionsService,
    pub redemptions: PgRedemptionsService,
    pub pricing: PgPricingService,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;

        // Build a non-superuser app pool so RLS policies are enforced.
        // The superuser pool is only used for administrative setup (tenant creation).
        let app_pool = Self::setup_app_pool(&test_db).await;
        let db = Db::new(app_pool);

        let tenant_uuid = TenantUuid::new();

        PgTenantsService::new(test_db.pool().clone())
            .create_tenant(NewTenant {
                uuid: tenant_uuid,
                name: "Test Tenant".to_string(),
            })
            .await
            .expect("Failed to create default test tenant");

        Self {
            catalog: PgCatalogService::new(db.clone()),
            price_lists: PgPriceListsService::new(db.clone()),
            orders: PgOrdersService::new(db.clone()),
            promotions: PgPromotionsService::new(db.clone()),
            redemptions: PgRedemptionsService::new(db.clone()),
            pricing: PgPricingService::new(db, EUR),
            tenant_uuid,
            db: test_db,
        }
    }

    /// Create an additional tenant for RLS isolation tests.
    pub async fn create_tenant(&self, name: &str) -> TenantUuid {
        let uuid = TenantUuid::new();

        PgTenantsService::new(self.db.pool().clone())
            .create_tenant(NewTenant {
                uuid,
                name: name.to_string(),
            })
            .await
            .expect("Failed to create test tenant");

        uuid
    }

    /// Place an order for the default tenant, for a user or a guest.
    pub async fn create_order(&self, user: Option<UserUuid>) -> OrderUuid {
        let uuid = OrderUuid::new();

        self.orders
            .create_order(
                self.tenant_uuid,
                NewOrder {
                    uuid,
                    user,
                    placed_at: Timestamp::now(),
                },
            )
            .await
            .expect("Failed to create test order");

        uuid
    }

    /// Connect as a restricted role so row-level security applies.
    ///
    /// Superusers bypass RLS even with `FORCE ROW LEVEL SECURITY`. The role is
    /// server-wide and created once; parallel tests racing on it is expected.
    async fn setup_app_pool(test_db: &TestDb) -> PgPool {
        let superuser_url = &test_db.superuser_url;
        let server_url = match superuser_url.rsplit_once('/') {
            Some((base, _)) => format!("{base}/postgres"),
            None => superuser_url.clone(),
        };

        let mut server = PgConnection::connect(&server_url)
            .await
            .expect("Failed to connect to postgres database for role setup");

        let created = query(&format!(
            "CREATE ROLE {APP_ROLE} WITH LOGIN PASSWORD '{APP_ROLE_PASSWORD}' \
             NOSUPERUSER NOCREATEDB NOCREATEROLE"
        ))
        .execute(&mut server)
        .await;

        match created {
            Ok(_) => {}
            // duplicate_object, or unique_violation when two CREATE ROLEs race
            Err(sqlx::Error::Database(ref error))
                if matches!(error.code().as_deref(), Some("42710" | "23505")) => {}
            Err(error) => panic!("Failed to create app role: {error}"),
        }

        query(&format!(
            "GRANT CONNECT ON DATABASE \"{}\" TO {APP_ROLE}",
            test_db.name
        ))
        .execute(&mut server)
        .await
        .expect("Failed to grant CONNECT on test database");

        server
            .close()
            .await
            .expect("Failed to close server connection");

        let mut database = PgConnection::connect(superuser_url)
            .await
            .expect("Failed to connect to test database for privilege setup");

        for grant in [
            format!("GRANT USAGE ON SCHEMA public TO {APP_ROLE}"),
            format!(
                "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public \
                 TO {APP_ROLE}"
            ),
        ] {
            query(&grant)
                .execute(&mut database)
                .await
                .expect("Failed to grant privileges to app role");
        }

        database
            .close()
            .await
            .expect("Failed to close test database connection");

        let app_url = superuser_url.replacen(
            "pricebook_test:pricebook_test_password",
            &format!("{APP_ROLE}:{APP_ROLE_PASSWORD}"),
            1,
        );

        PgPool::connect(&app_url)
            .await
            .expect("Failed to create app pool")
    }
}
