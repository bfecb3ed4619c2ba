//! SQLite connection pool for reference data and estimates
//!
//! - WAL mode for concurrent reads while an estimate is written
//! - Embedded migrations from `./migrations`

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Open a pool for `database_url` (e.g. "sqlite:./data/estimates.db")
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    ensure_parent_dir(database_url)?;

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30))
        .foreign_keys(true)
        .pragma("synchronous", "NORMAL");

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database at {}", database_url))?;

    Ok(pool)
}

/// Single-connection in-memory pool with the schema applied.
///
/// The connection is never recycled, so the database lives as long as the pool.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .context("Failed to open in-memory database")?;

    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Create the directory holding a file-backed database
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");

    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_pool_has_schema() {
        let pool = connect_in_memory().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cost_estimates")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("estimates.db");
        let url = format!("sqlite:{}", db_path.display());

        let pool = connect(&url, 2).await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert!(db_path.exists());
    }
}
