
pub mod models;
pub mod queries;

use std::path::Path;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

use crate::config::PoolConfig;
use crate::{Result, StoreError};

pub type DbPool = Pool<Sqlite>;

/// Owned handle to the bounded connection pool. The pool is the only shared
/// mutable resource in the store; every component borrows it through this
/// handle rather than a process-wide global.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (creating if missing) the database at `database_url` and run
    /// migrations. Base connections ride out idle periods; connections opened
    /// beyond `pool_size` are closed once idle rather than pooled.
    pub async fn new<P: AsRef<Path>>(database_url: P, pool_config: &PoolConfig) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(pool_config.pool_size)
            .max_connections(pool_config.pool_size + pool_config.max_overflow)
            .acquire_timeout(Duration::from_secs(pool_config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(pool_config.idle_timeout_secs))
            .connect_with(options)
            .await?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Check out a connection, failing with `PoolExhausted` when no slot frees
    /// within the configured acquire timeout. The returned connection goes
    /// back to the pool on drop on every exit path.
    #[inline]
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(StoreError::from)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to run schema migration: {e}")))?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path, pool_config: &PoolConfig) -> Result<Self> {
        let db_path = config_dir.join("docstore.db");

        std::fs::create_dir_all(config_dir)?;

        Self::new(db_path, pool_config).await
    }

    /// Round-trip a trivial statement to verify the backend is reachable.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    /// Tear the pool down, closing all connections.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connections closed");
    }
}
