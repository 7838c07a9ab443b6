//! Database connection and repositories

pub mod assets;
pub mod orm;
pub mod projects;
pub mod schema_sync;
pub mod sqlite_helpers;

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use assets::{Asset, AssetAddress, AssetRepository};
pub use orm::{FilterCondition, Operator, Pagination, QueryEngine, QueryError};
pub use projects::{CreateProject, Project, ProjectRepository, UpdateProject};
pub use schema_sync::{
    SchemaSyncResult, sync_all_entity_schemas, sync_entity_schema, validate_entity_schema,
};

/// `status` value of a live row
pub const ACTIVE_STATUS: i64 = 1;

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new database connection pool
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = url
            .parse::<SqliteConnectOptions>()
            .with_context(|| format!("Invalid database URL {}", url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Create a new database connection pool with retry logic.
    /// Retries every `retry_interval` until `timeout` has elapsed.
    pub async fn connect_with_retry(
        url: &str,
        max_connections: u32,
        retry_interval: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        let started = tokio::time::Instant::now();
        loop {
            match Self::connect(url, max_connections).await {
                Ok(db) => return Ok(db),
                Err(e) if started.elapsed() + retry_interval < timeout => {
                    tracing::warn!(
                        error = %e,
                        retry_in_secs = retry_interval.as_secs(),
                        "Database connection failed, retrying"
                    );
                    tokio::time::sleep(retry_interval).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a query engine sharing this pool
    pub fn engine(&self) -> QueryEngine<SqlitePool> {
        QueryEngine::new(self.pool.clone())
    }

    /// Get an asset repository
    pub fn assets(&self, url_prefix: &str) -> AssetRepository<SqlitePool> {
        AssetRepository::new(self.engine(), url_prefix)
    }

    /// Get a project repository
    pub fn projects(&self) -> ProjectRepository<SqlitePool> {
        ProjectRepository::new(self.engine())
    }

    /// Create missing entity tables and validate their layout
    pub async fn sync_schemas(&self) -> Result<SchemaSyncResult> {
        let result = sync_all_entity_schemas(&self.pool).await;
        if let Some(first) = result.errors.first() {
            anyhow::bail!(
                "{} entity table(s) failed validation, first: {}",
                result.errors.len(),
                first
            );
        }
        Ok(result)
    }

    /// Close the pool, waiting for connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
