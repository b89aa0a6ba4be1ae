//! Database connection lifecycle
//!
//! Process-scoped pool with an explicit connect/close lifecycle. The pool is
//! sized at startup from configuration; connections are returned on every
//! exit path by sqlx's RAII guards, and an open transaction that is dropped
//! without a commit rolls back.

pub mod models;
pub mod repository;

pub use repository::Repository;

use crate::config::DatabaseConfig;
use crate::errors::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    /// Open the bounded connection pool described by the configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    /// Run embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("migration failed: {}", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ping the database (readiness probe)
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool; subsequent acquires fail with a typed pool-closed
    /// error rather than hanging.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
