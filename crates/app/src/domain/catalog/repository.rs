//! Catalog Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use pricebook::{catalog::CatalogItem, ids::CatalogItemUuid};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, types::Json};
use uuid::Uuid;

use crate::domain::catalog::records::CatalogItemRecord;

const CREATE_CATALOG_ITEM_SQL: &str = include_str!("sql/create_catalog_item.sql");
const GET_CATALOG_ITEM_SQL: &str = include_str!("sql/get_catalog_item.sql");
const GET_CATALOG_ITEMS_SQL: &str = include_str!("sql/get_catalog_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_catalog_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &CatalogItem,
    ) -> Result<CatalogItemRecord, sqlx::Error> {
        query_as::<Postgres, CatalogItemRecord>(CREATE_CATALOG_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(Json(item))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_catalog_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: CatalogItemUuid,
    ) -> Result<Option<CatalogItemRecord>, sqlx::Error> {
        query_as::<Postgres, CatalogItemRecord>(GET_CATALOG_ITEM_SQL)
            .bind(item.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_catalog_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[CatalogItemUuid],
    ) -> Result<Vec<CatalogItemRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = items.iter().map(|item| item.into_uuid()).collect();

        query_as::<Postgres, CatalogItemRecord>(GET_CATALOG_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CatalogItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let uuid = CatalogItemUuid::from_uuid(row.try_get("uuid")?);
        let Json(mut item) = row.try_get::<Json<CatalogItem>, _>("document")?;

        // The column is authoritative over the copy embedded in the document.
        item.uuid = uuid;

        Ok(Self {
            uuid,
            item,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
