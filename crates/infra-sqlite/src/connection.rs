// SQLite Connection Pool Setup

use crate::map_sqlx_error;
use csvjob_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Create SQLite connection pool with WAL mode
///
/// Workers in several processes may share one file, so writers wait on the
/// busy timeout instead of failing immediately.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::Config(format!("Invalid database URL '{}': {}", database_url, e)))?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)
}
