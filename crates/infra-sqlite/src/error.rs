// sqlx error mapping

use csvjob_core::error::AppError;

/// Convert sqlx::Error to AppError::Database with structured information
pub fn map_sqlx_error(err: sqlx::Error) -> AppError {
    AppError::Database(describe(&err))
}

/// Same description, reported as a ledger failure
pub(crate) fn map_ledger_error(err: sqlx::Error) -> AppError {
    AppError::Ledger(describe(&err))
}

/// Same description, reported as a queue failure
pub(crate) fn map_queue_error(err: sqlx::Error) -> AppError {
    AppError::Queue(describe(&err))
}

fn describe(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "2067" | "1555" => {
                    format!("Unique constraint violation: {} ({})", db_err.message(), code)
                }
                "5" => format!("Database locked (SQLITE_BUSY): {}", db_err.message()),
                "13" => format!("Database full: {}", db_err.message()),
                other => format!("Database error [{}]: {}", other, db_err.message()),
            },
            None => format!("Database error: {}", db_err.message()),
        },
        sqlx::Error::RowNotFound => "Row not found".to_string(),
        sqlx::Error::ColumnNotFound(col) => format!("Column not found: {}", col),
        sqlx::Error::PoolTimedOut => "Connection pool timed out".to_string(),
        // Connection, pool, protocol errors
        other => other.to_string(),
    }
}
