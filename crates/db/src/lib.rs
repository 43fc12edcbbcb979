use std::{str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use thiserror::Error;
use tracing::info;

pub mod models;

pub const IN_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
pub enum DBServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Owns the SQLite pool. Cloning shares the pool.
#[derive(Clone, Debug)]
pub struct DBService {
    pub pool: SqlitePool,
}

impl DBService {
    pub async fn new(database_url: &str) -> Result<Self, DBServiceError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        // An in-memory database lives as long as its connection, so it gets
        // exactly one connection that is never recycled.
        let pool = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!(database_url = %database_url, "Database ready");
        Ok(Self { pool })
    }

    pub async fn new_in_memory() -> Result<Self, DBServiceError> {
        Self::new(IN_MEMORY_URL).await
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
