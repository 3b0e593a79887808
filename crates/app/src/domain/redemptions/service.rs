//! Redemptions Service

use async_trait::async_trait;
use mockall::automock;
use pricebook::{
    ids::{PromotionUuid, TenantUuid, UserUuid},
    redemptions::{NewRedemption, RedemptionOutcome},
};
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::redemptions::{RedemptionsServiceError, repository::PgRedemptionsRepository},
};

#[derive(Debug, Clone)]
pub struct PgRedemptionsService {
    db: Db,
    repository: PgRedemptionsRepository,
}

impl PgRedemptionsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgRedemptionsRepository::new(),
        }
    }
}

#[async_trait]
impl RedemptionsService for PgRedemptionsService {
    #[tracing::instrument(
        name = "redemptions.service.redeem",
        skip(self, redemption),
        fields(
            tenant_uuid = %tenant,
            promotion_uuid = %redemption.promotion,
            order_uuid = %redemption.order,
            redemption_uuid = tracing::field::Empty,
            duplicate = tracing::field::Empty
        ),
        err
    )]
    async fn redeem(
        &self,
        tenant: TenantUuid,
        redemption: NewRedemption,
    ) -> Result<RedemptionOutcome, RedemptionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let created = self.repository.create_redemption(&mut tx, &redemption).await?;

        let outcome = match created {
            Some(record) => RedemptionOutcome::Recorded(record.into_redemption()?),
            None => {
                let existing = self
                    .repository
                    .get_redemption(&mut tx, redemption.promotion, redemption.order)
                    .await?;

                RedemptionOutcome::Duplicate(existing.into_redemption()?)
            }
        };

        tx.commit().await?;

        let span = Span::current();

        span.record(
            "redemption_uuid",
            tracing::field::display(outcome.redemption().uuid),
        );

        span.record("duplicate", outcome.is_duplicate());

        if outcome.is_duplicate() {
            info!("duplicate redemption ignored");
        } else {
            info!("recorded promotion redemption");
        }

        Ok(outcome)
    }

    #[tracing::instrument(
        name = "redemptions.service.count_redemptions",
        skip(self),
        fields(tenant_uuid = %tenant, promotion_uuid = %promotion),
        err
    )]
    async fn count_redemptions(
        &self,
        tenant: TenantUuid,
        promotion: PromotionUuid,
    ) -> Result<u64, RedemptionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let counts = self.repository.count_redemptions(&mut tx, &[promotion]).await?;

        tx.commit().await?;

        let count = counts.get(&promotion).copied().unwrap_or(0);

        debug!(count, "counted redemptions");

        Ok(count)
    }

    #[tracing::instrument(
        name = "redemptions.service.count_user_redemptions",
        skip(self),
        fields(tenant_uuid = %tenant, promotion_uuid = %promotion, user_uuid = %user),
        err
    )]
    async fn count_user_redemptions(
        &self,
        tenant: TenantUuid,
        promotion: PromotionUuid,
        user: UserUuid,
    ) -> Result<u64, RedemptionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let counts = self
            .repository
            .count_user_redemptions(&mut tx, &[promotion], user)
            .await?;

        tx.commit().await?;

        let count = counts.get(&promotion).copied().unwrap_or(0);

        debug!(count, "counted user redemptions");

        Ok(count)
    }
}

/// Durable redemption ledger.
///
/// Usage limits are checked when promotions are evaluated, not here, so two concurrent
/// checkouts can both pass a limit check and both redeem.
#[automock]
#[async_trait]
pub trait RedemptionsService: Send + Sync {
    /// Record that a promotion was applied to an order. Recording the same promotion
    /// and order again returns the stored row unchanged.
    async fn redeem(
        &self,
        tenant: TenantUuid,
        redemption: NewRedemption,
    ) -> Result<RedemptionOutcome, RedemptionsServiceError>;

    /// Total redemptions of a promotion.
    async fn count_redemptions(
        &self,
        tenant: TenantUuid,
        promotion: PromotionUuid,
    ) -> Result<u64, RedemptionsServiceError>;

    /// Redemptions of a promotion by one user.
    async fn count_user_redemptions(
        &self,
        tenant: TenantUuid,
        promotion: PromotionUuid,
        user: UserUuid,
    ) -> Result<u64, RedemptionsServiceError>;
}
