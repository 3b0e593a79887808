//! Redemptions Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use pricebook::{
    ids::{OrderUuid, PromotionUuid, RedemptionUuid, TenantUuid, UserUuid},
    redemptions::NewRedemption,
};
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::redemptions::records::RedemptionRecord;

const CREATE_REDEMPTION_SQL: &str = include_str!("sql/create_redemption.sql");
const GET_REDEMPTION_SQL: &str = include_str!("sql/get_redemption.sql");
const COUNT_REDEMPTIONS_SQL: &str = include_str!("sql/count_redemptions.sql");
const COUNT_USER_REDEMPTIONS_SQL: &str = include_str!("sql/count_user_redemptions.sql");

/// Redemption counts keyed by promotion.
pub(crate) type RedemptionCountMap = FxHashMap<PromotionUuid, u64>;

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRedemptionsRepository;

impl PgRedemptionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert a redemption unless the order already redeemed the promotion, in which
    /// case `None` is returned and nothing is written.
    pub(crate) async fn create_redemption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        redemption: &NewRedemption,
    ) -> Result<Option<RedemptionRecord>, sqlx::Error> {
        query_as::<Postgres, RedemptionRecord>(CREATE_REDEMPTION_SQL)
            .bind(RedemptionUuid::new().into_uuid())
            .bind(redemption.promotion.into_uuid())
            .bind(redemption.user.map(UserUuid::into_uuid))
            .bind(redemption.order.into_uuid())
            .bind(redemption.amount.to_minor_units())
            .bind(redemption.amount.currency().iso_alpha_code)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_redemption(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: PromotionUuid,
        order: OrderUuid,
    ) -> Result<RedemptionRecord, sqlx::Error> {
        query_as::<Postgres, RedemptionRecord>(GET_REDEMPTION_SQL)
            .bind(promotion.into_uuid())
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn count_redemptions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotions: &[PromotionUuid],
    ) -> Result<RedemptionCountMap, sqlx::Error> {
        let rows: Vec<(Uuid, i64)> = query_as(COUNT_REDEMPTIONS_SQL)
            .bind(to_uuids(promotions))
            .fetch_all(&mut **tx)
            .await?;

        to_count_map(rows)
    }

    pub(crate) async fn count_user_redemptions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotions: &[PromotionUuid],
        user: UserUuid,
    ) -> Result<RedemptionCountMap, sqlx::Error> {
        let rows: Vec<(Uuid, i64)> = query_as(COUNT_USER_REDEMPTIONS_SQL)
            .bind(to_uuids(promotions))
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        to_count_map(rows)
    }
}

fn to_uuids(promotions: &[PromotionUuid]) -> Vec<Uuid> {
    promotions.iter().map(|promotion| promotion.into_uuid()).collect()
}

fn to_count_map(rows: Vec<(Uuid, i64)>) -> Result<RedemptionCountMap, sqlx::Error> {
    rows.into_iter()
        .map(|(promotion, count)| {
            let count = u64::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
                index: "redemptions".to_string(),
                source: Box::new(e),
            })?;

            Ok((PromotionUuid::from_uuid(promotion), count))
        })
        .collect()
}

impl<'r> FromRow<'r, PgRow> for RedemptionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: RedemptionUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            promotion: PromotionUuid::from_uuid(row.try_get("promotion_uuid")?),
            user: row
                .try_get::<Option<Uuid>, _>("user_uuid")?
                .map(UserUuid::from_uuid),
            order: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            amount: row.try_get("amount")?,
            currency: row.try_get("currency")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
