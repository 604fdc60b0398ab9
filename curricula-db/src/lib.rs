//! Database layer for curricula
//!
//! Provides SQLite persistence for the course catalog, academic plan
//! versions, program requirements and share links.

pub mod error;
pub mod repos;
pub mod store;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use curricula_core::DatabaseSettings;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use tracing::debug;

pub use error::{Error, Result};
pub use repos::{CatalogRepository, PlanRepository, RequirementRepository, ShareRepository};
pub use store::SqliteStore;

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect using configured settings and bring the schema up to date
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let db_path = &settings.path;

        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
            .create_if_missing(true)
            .foreign_keys(true)
            // Writers from other connections or processes wait for the lock
            .busy_timeout(Duration::from_secs(5))
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        debug!(path = %db_path.display(), "Opened database");
        Ok(db)
    }

    /// Open a database file with default pool settings
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        Self::connect(&DatabaseSettings {
            path: db_path.as_ref().to_path_buf(),
            ..DatabaseSettings::default()
        })
        .await
    }

    /// Run embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn catalog(&self) -> CatalogRepository<'_> {
        CatalogRepository::new(&self.pool)
    }

    pub fn plans(&self) -> PlanRepository<'_> {
        PlanRepository::new(&self.pool)
    }

    pub fn requirements(&self) -> RequirementRepository<'_> {
        RequirementRepository::new(&self.pool)
    }

    pub fn shares(&self) -> ShareRepository<'_> {
        ShareRepository::new(&self.pool)
    }

    /// A cloneable handle implementing the core store traits
    pub fn store(&self) -> SqliteStore {
        SqliteStore::new(self.clone())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }
}
