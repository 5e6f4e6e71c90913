use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use thiserror::Error;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().build(manager)?;

    // Run pending migrations on startup
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run database migrations: {}", e))?;

    Ok(pool)
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::PoolError),

    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Database task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Run blocking diesel work on the blocking thread pool.
pub async fn with_conn<T, F>(pool: &Arc<DbPool>, f: F) -> Result<T, DbError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<T, DbError> {
        let mut conn = pool.get()?;
        Ok(f(&mut conn)?)
    })
    .await?
}
