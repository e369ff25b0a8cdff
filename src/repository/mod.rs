//! Repository layer for database operations

pub mod books;
pub mod search;

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{config::DatabaseConfig, error::AppResult};

/// Open a connection pool using the configured options
pub async fn connect(config: &DatabaseConfig) -> Result<Pool<Postgres>, sqlx::Error> {
    match config.url.as_deref().filter(|u| !u.is_empty()) {
        Some(_) => tracing::info!("Connecting to database from configured URL"),
        None => tracing::info!(
            "Connecting to database: {}",
            config.redacted_connection_string()
        ),
    }

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(config.connect_options()?)
        .await
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create the schema if it does not exist yet
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
        Ok(())
    }

    /// Drop the books table and the migration ledger so the next `migrate`
    /// starts from scratch
    pub async fn teardown(&self) -> AppResult<()> {
        sqlx::query("DROP TABLE IF EXISTS books")
            .execute(&self.pool)
            .await?;
        sqlx::query("DROP TABLE IF EXISTS _sqlx_migrations")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove every row, deleted or not. Ids keep increasing afterwards.
    pub async fn clear(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM books")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
