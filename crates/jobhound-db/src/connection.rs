//! Database connection management.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::error::{DatabaseError, Result};

/// Open a `SQLite` connection pool at the given path.
///
/// Creates the file if it does not exist. Use `:memory:` for an
/// in-memory database.
pub async fn open_pool(path: &str) -> Result<Pool<Sqlite>> {
    let connect_options = SqliteConnectOptions::from_str(path)
        .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::Open(format!("failed to connect: {e}")))?;

    tracing::info!("Database pool created at {}", path);
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_pool() {
        let pool = open_pool(":memory:").await.expect("open pool");
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .expect("probe query");
    }

    #[tokio::test]
    async fn test_open_file_pool_creates_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("jobhound.db");
        let path_str = path.to_str().expect("utf-8 path");

        let pool = open_pool(path_str).await.expect("open pool");
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .expect("probe query");
        assert!(path.exists());
    }
}
