//! Database initialization

use crate::{Error, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Open (or create) the SQLite database at `db_path`
///
/// The pool holds a single connection: association updates are applied one
/// video at a time and must never interleave on the storage handle.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    if db_path.as_os_str().is_empty() {
        return Err(Error::InvalidInput("Empty database path".to_string()));
    }

    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    Ok(pool)
}

/// Open an existing database without write access
///
/// Never creates the file; a missing database is [`Error::NotFound`].
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!("Database {}", db_path.display())));
    }

    let db_url = format!("sqlite://{}?mode=ro", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&db_url)
        .await?;

    info!("Opened database read-only: {}", db_path.display());
    Ok(pool)
}
