//! Per-test PostgreSQL databases inside one shared container.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};

const SUPERUSER: &str = "pricebook_test";
const SUPERUSER_PASSWORD: &str = "pricebook_test_password";

const RESERVED_NAMES: [&str; 15] = [
    "user", "table", "select", "insert", "update", "delete", "drop", "create", "alter", "index",
    "database", "schema", "role", "grant", "revoke",
];

/// Database names are interpolated into DDL, so only plain identifiers are accepted.
fn validate_database_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 63 {
        return Err("database name must be 1-63 characters long".to_string());
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err("database name must start with a letter or underscore".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return Err("database name may only contain letters, digits, `_` and `$`".to_string());
    }

    if RESERVED_NAMES
        .iter()
        .any(|word| name.eq_ignore_ascii_case(word))
    {
        return Err(format!("database name '{name}' is a reserved word"));
    }

    Ok(())
}

static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> =
    Lazy::new(OnceCell::new);

static CLEANUP_SENDER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(SUPERUSER)
        .with_password(SUPERUSER_PASSWORD)
        .with_db_name(SUPERUSER)
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

async fn start_cleanup_task() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if let Err(err) = drop_database(&name).await {
                eprintln!("Failed to drop test database '{name}': {err}");
            }
        }
    });

    sender
}

async fn server_url(database: &str) -> Option<String> {
    let container = POSTGRES_CONTAINER.get()?;
    let port = container.get_host_port_ipv4(5432).await.ok()?;
    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    Some(format!(
        "postgresql://{SUPERUSER}:{SUPERUSER_PASSWORD}@{host}:{port}/{database}"
    ))
}

async fn drop_database(name: &str) -> Result<(), sqlx::Error> {
    if validate_database_name(name).is_err() {
        return Ok(());
    }

    let Some(url) = server_url("postgres").await else {
        return Ok(());
    };

    let mut conn = PgConnection::connect(&url).await?;

    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\""))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

/// A freshly migrated database owned by one test.
///
/// Services commit their own transactions, so isolation comes from giving every test
/// its own database. The database is dropped in the background once the value is.
#[derive(Debug, Clone)]
pub struct TestDb {
    /// Superuser pool
    pub pool: PgPool,

    /// Database name
    pub name: String,

    /// URL `pool` was connected with; [`super::TestContext`] swaps in the app role.
    pub(super) superuser_url: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = CLEANUP_SENDER.get() {
            let _ = sender.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub async fn new() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("System clock is before the Unix epoch")
            .as_nanos();

        let thread_id = std::thread::current().id();

        let name =
            format!("pricebook_test_{nanos}_{thread_id:?}").replace([':', ' ', '(', ')'], "");

        validate_database_name(&name).expect("Generated an invalid database name");

        CLEANUP_SENDER.get_or_init(start_cleanup_task).await;
        POSTGRES_CONTAINER.get_or_init(start_container).await;

        let admin_url = server_url("postgres")
            .await
            .expect("PostgreSQL container has no mapped port");

        let mut conn = PgConnection::connect(&admin_url)
            .await
            .expect("Failed to connect to postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close admin connection");

        let database_url = server_url(&name)
            .await
            .expect("PostgreSQL container has no mapped port");

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to create pool for test database");

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations on test database");

        Self {
            pool,
            name,
            superuser_url: database_url,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_database_name("pricebook_test_1").is_ok());
        assert!(validate_database_name("_leading_underscore").is_ok());
        assert!(validate_database_name("with$dollar").is_ok());
    }

    #[test]
    fn rejects_unsafe_names() {
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name(&"a".repeat(64)).is_err());
        assert!(validate_database_name("1starts_with_digit").is_err());
        assert!(validate_database_name("has-hyphen").is_err());
        assert!(validate_database_name("has\"quote").is_err());
        assert!(validate_database_name("SELECT").is_err());
    }

    #[tokio::test]
    async fn migrations_create_the_pricing_tables() {
        let test_db = TestDb::new().await;

        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name = ANY($1)",
        )
        .bind(vec![
            "tenants",
            "catalog_items",
            "price_list_items",
            "orders",
            "promotions",
            "promotion_redemptions",
        ])
        .fetch_one(test_db.pool())
        .await
        .expect("Failed to query information schema");

        assert_eq!(count, 6);
    }
}
