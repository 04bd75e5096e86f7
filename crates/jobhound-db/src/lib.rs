//! JobHound database layer.
//!
//! `SQLite` persistence for job postings and crawl run history, built
//! on `SQLx` with embedded migrations.
//!
//! # Example
//!
//! ```ignore
//! use jobhound_db::Database;
//!
//! let db = Database::open("jobhound.db").await?;
//! db.run_migrations().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod crawl_runs;
pub mod error;
pub mod jobs;
pub mod migrations;

pub use crawl_runs::{CrawlRunRecord, SourceCrawlRecord};
pub use error::{DatabaseError, Result};
pub use jobs::JobStats;

use jobhound_core::JobPosting;
use jobhound_crawler::{JobStore, SaveOutcome, StoreError};

/// High-level database handle: connection pool plus migrations.
#[derive(Debug)]
pub struct Database {
    pool: sqlx::Pool<sqlx::Sqlite>,
}

impl Database {
    /// Open (or create) the database at the given path. Use `:memory:`
    /// for an in-memory database.
    pub async fn open(path: &str) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Run all pending migrations. Call once after opening.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Current schema version (number of applied migrations).
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Reference to the underlying `SQLx` pool for direct queries.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

#[async_trait::async_trait]
impl JobStore for Database {
    async fn exists_by_url(&self, url: &str) -> std::result::Result<bool, StoreError> {
        jobs::exists_by_url(&self.pool, url)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn save(&self, job: &JobPosting) -> std::result::Result<SaveOutcome, StoreError> {
        let inserted = jobs::insert_job(&self.pool, job)
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(if inserted {
            SaveOutcome::Inserted
        } else {
            SaveOutcome::Duplicate
        })
    }
}
