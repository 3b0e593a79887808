//! Promotions Service

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use pricebook::{
    ids::TenantUuid,
    promotions::{Promotion, PromotionError, resolve_coupon},
};
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::promotions::{
        PromotionsServiceError, records::PromotionRecord, repository::PgPromotionsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgPromotionsService {
    db: Db,
    repository: PgPromotionsRepository,
}

impl PgPromotionsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgPromotionsRepository::new(),
        }
    }
}

#[async_trait]
impl PromotionsService for PgPromotionsService {
    #[tracing::instrument(
        name = "promotions.service.create_promotion",
        skip(self, promotion),
        fields(
            tenant_uuid = %tenant,
            promotion_uuid = %promotion.uuid,
            promotion_kind = promotion.kind.as_str(),
            effect_type = promotion.effect_type().as_str()
        ),
        err
    )]
    async fn create_promotion(
        &self,
        tenant: TenantUuid,
        promotion: Promotion,
    ) -> Result<PromotionRecord, PromotionsServiceError> {
        if let Err(error) = promotion.validate() {
            debug!(code = error.code(), %error, "rejected invalid promotion");

            return Err(PromotionsServiceError::InvalidData);
        }

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let record = self.repository.create_promotion(&mut tx, &promotion).await?;

        tx.commit().await?;

        info!("created promotion");

        Ok(record)
    }

    #[tracing::instrument(
        name = "promotions.service.list_active_promotions",
        skip(self),
        fields(tenant_uuid = %tenant, promotion_count = tracing::field::Empty),
        err
    )]
    async fn list_active_promotions(
        &self,
        tenant: TenantUuid,
    ) -> Result<Vec<Promotion>, PromotionsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let records = self.repository.list_active_promotions(&mut tx).await?;

        tx.commit().await?;

        Span::current().record("promotion_count", records.len());

        Ok(records.into_iter().map(|record| record.promotion).collect())
    }

    #[tracing::instrument(
        name = "promotions.service.resolve_coupon",
        skip(self, code),
        fields(tenant_uuid = %tenant, promotion_uuid = tracing::field::Empty),
        err
    )]
    async fn resolve_coupon(
        &self,
        tenant: TenantUuid,
        code: String,
        now: Timestamp,
    ) -> Result<Promotion, PromotionsServiceError> {
        let promotions = self.list_active_promotions(tenant).await?;

        let promotion = resolve_coupon(&promotions, &code, now).map_err(|error| match error {
            PromotionError::InvalidCoupon(code) => PromotionsServiceError::InvalidCoupon(code),
            _ => PromotionsServiceError::InvalidData,
        })?;

        Span::current().record("promotion_uuid", tracing::field::display(promotion.uuid));

        Ok(promotion.clone())
    }
}

#[automock]
#[async_trait]
pub trait PromotionsService: Send + Sync {
    /// Store a promotion after checking its effect is well formed.
    async fn create_promotion(
        &self,
        tenant: TenantUuid,
        promotion: Promotion,
    ) -> Result<PromotionRecord, PromotionsServiceError>;

    /// Active, published promotions, highest priority first.
    async fn list_active_promotions(
        &self,
        tenant: TenantUuid,
    ) -> Result<Vec<Promotion>, PromotionsServiceError>;

    /// Resolve a coupon code entered at checkout.
    async fn resolve_coupon(
        &self,
        tenant: TenantUuid,
        code: String,
        now: Timestamp,
    ) -> Result<Promotion, PromotionsServiceError>;
}
