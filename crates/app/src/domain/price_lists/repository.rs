//! Price Lists Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use pricebook::{ids::PriceListItemUuid, lookups::PriceListRecord};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::price_lists::records::PriceListItemRecord;

const CREATE_PRICE_LIST_ITEM_SQL: &str = include_str!("sql/create_price_list_item.sql");
const GET_PRICE_LIST_ITEM_SQL: &str = include_str!("sql/get_price_list_item.sql");
const GET_PRICE_LIST_ITEMS_SQL: &str = include_str!("sql/get_price_list_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPriceListsRepository;

impl PgPriceListsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_price_list_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: PriceListRecord,
    ) -> Result<PriceListItemRecord, sqlx::Error> {
        query_as::<Postgres, PriceListItemRecord>(CREATE_PRICE_LIST_ITEM_SQL)
            .bind(record.uuid.into_uuid())
            .bind(record.amount)
            .bind(record.currency)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_price_list_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: PriceListItemUuid,
    ) -> Result<PriceListItemRecord, sqlx::Error> {
        query_as::<Postgres, PriceListItemRecord>(GET_PRICE_LIST_ITEM_SQL)
            .bind(item.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_price_list_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[PriceListItemUuid],
    ) -> Result<Vec<PriceListItemRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = items.iter().map(|item| item.into_uuid()).collect();

        query_as::<Postgres, PriceListItemRecord>(GET_PRICE_LIST_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for PriceListItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PriceListItemUuid::from_uuid(row.try_get("uuid")?),
            amount: row.try_get("amount")?,
            currency: row.try_get("currency")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
