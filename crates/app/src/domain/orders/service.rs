//! Orders Service

use async_trait::async_trait;
use mockall::automock;
use pricebook::ids::{TenantUuid, UserUuid};
use tracing::{debug, info};

use crate::{
    database::Db,
    domain::orders::{
        OrdersServiceError, data::NewOrder, records::OrderRecord, repository::PgOrdersRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(tenant_uuid = %tenant, order_uuid = %order.uuid),
        err
    )]
    async fn create_order(
        &self,
        tenant: TenantUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.create_order(&mut tx, order).await?;

        tx.commit().await?;

        info!("created order");

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.count_orders",
        skip(self),
        fields(tenant_uuid = %tenant, user_uuid = %user),
        err
    )]
    async fn count_orders(
        &self,
        tenant: TenantUuid,
        user: UserUuid,
    ) -> Result<u64, OrdersServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let count = self.repository.count_orders(&mut tx, user).await?;

        tx.commit().await?;

        debug!(count, "counted orders");

        Ok(count)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Record a placed order.
    async fn create_order(
        &self,
        tenant: TenantUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Number of orders the user has placed with the tenant.
    async fn count_orders(
        &self,
        tenant: TenantUuid,
        user: UserUuid,
    ) -> Result<u64, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use pricebook::ids::OrderUuid;
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    fn order(user: Option<UserUuid>) -> NewOrder {
        NewOrder {
            uuid: OrderUuid::new(),
            user,
            placed_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn count_orders_only_counts_the_users_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let user = UserUuid::new();

        assert_eq!(ctx.orders.count_orders(ctx.tenant_uuid, user).await?, 0);

        ctx.orders.create_order(ctx.tenant_uuid, order(Some(user))).await?;
        ctx.orders.create_order(ctx.tenant_uuid, order(Some(user))).await?;
        ctx.orders
            .create_order(ctx.tenant_uuid, order(Some(UserUuid::new())))
            .await?;
        ctx.orders.create_order(ctx.tenant_uuid, order(None)).await?;

        assert_eq!(ctx.orders.count_orders(ctx.tenant_uuid, user).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn count_orders_is_tenant_scoped() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.create_tenant("Other Tenant").await;
        let user = UserUuid::new();

        ctx.orders.create_order(ctx.tenant_uuid, order(Some(user))).await?;

        assert_eq!(ctx.orders.count_orders(other, user).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn guest_orders_have_no_user() -> TestResult {
        let ctx = TestContext::new().await;

        let record = ctx.orders.create_order(ctx.tenant_uuid, order(None)).await?;

        assert!(record.user.is_none());

        Ok(())
    }
}
