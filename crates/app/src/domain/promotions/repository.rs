//! Promotions Repository

use std::str::FromStr;

use jiff_sqlx::Timestamp as SqlxTimestamp;
use pricebook::{
    ids::PromotionUuid,
    promotions::{Promotion, PromotionEffect, PromotionKind, PromotionRules, StackingPolicy},
};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, types::Json};

use crate::domain::promotions::records::PromotionRecord;

const COLUMN_KIND: &str = "kind";
const COLUMN_STACKING_POLICY: &str = "stacking_policy";

const CREATE_PROMOTION_SQL: &str = include_str!("sql/create_promotion.sql");
const LIST_ACTIVE_PROMOTIONS_SQL: &str = include_str!("sql/list_active_promotions.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPromotionsRepository;

impl PgPromotionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_promotion(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        promotion: &Promotion,
    ) -> Result<PromotionRecord, sqlx::Error> {
        query_as::<Postgres, PromotionRecord>(CREATE_PROMOTION_SQL)
            .bind(promotion.uuid.into_uuid())
            .bind(&promotion.name)
            .bind(promotion.kind.as_str())
            .bind(promotion.code.as_deref())
            .bind(promotion.is_active)
            .bind(promotion.is_published)
            .bind(promotion.priority)
            .bind(promotion.stacking_policy.as_str())
            .bind(Json(&promotion.rules))
            .bind(Json(&promotion.effect))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_active_promotions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<PromotionRecord>, sqlx::Error> {
        query_as::<Postgres, PromotionRecord>(LIST_ACTIVE_PROMOTIONS_SQL)
            .fetch_all(&mut **tx)
            .await
    }
}

fn try_parse_column<T>(row: &PgRow, column: &'static str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    row.try_get::<String, _>(column)?
        .parse()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

impl<'r> FromRow<'r, PgRow> for PromotionRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let Json(rules) = row.try_get::<Json<PromotionRules>, _>("rules")?;
        let Json(effect) = row.try_get::<Json<PromotionEffect>, _>("effect")?;

        Ok(Self {
            promotion: Promotion {
                uuid: PromotionUuid::from_uuid(row.try_get("uuid")?),
                name: row.try_get("name")?,
                kind: try_parse_column::<PromotionKind>(row, COLUMN_KIND)?,
                code: row.try_get("code")?,
                is_active: row.try_get("is_active")?,
                is_published: row.try_get("is_published")?,
                priority: row.try_get("priority")?,
                stacking_policy: try_parse_column::<StackingPolicy>(row, COLUMN_STACKING_POLICY)?,
                rules,
                effect,
            },
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
