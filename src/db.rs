use std::time::Duration;

use anyhow::Result;
use sea_orm::{DatabaseConnection, SqlxPostgresConnector};
use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

/// Create the bounded connection pool. Requests beyond `max_connections` wait
/// for a free connection until the acquire timeout.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Pool that connects on first use. Used by router tests that never reach the store.
pub fn create_lazy_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy(database_url)?;
    Ok(pool)
}

/// SeaORM connection sharing the sqlx pool.
pub fn orm_from_pool(pool: &DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone())
}

pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
