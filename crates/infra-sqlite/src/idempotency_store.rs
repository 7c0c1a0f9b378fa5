// SQLite IdempotencyStore Implementation (IDP_MODE=DURABLE)

use crate::error::map_ledger_error;
use async_trait::async_trait;
use csvjob_core::config::validate_identifier;
use csvjob_core::domain::{JobId, LedgerStatus, ObjectLocation};
use csvjob_core::error::{AppError, Result};
use csvjob_core::port::{IdempotencyStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
const STATUS_COMPLETED: &str = "COMPLETED";

/// Ledger rows keyed by job id in a configurable table
///
/// Acquire is a single conditional insert; the primary key is the arbiter
/// between concurrent workers.
pub struct SqliteIdempotencyStore {
    pool: SqlitePool,
    table: String,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteIdempotencyStore {
    /// # Errors
    /// - AppError::Config if `table` is not a plain identifier
    pub fn new(
        pool: SqlitePool,
        table: impl Into<String>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Result<Self> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self {
            pool,
            table,
            time_provider,
        })
    }

    /// Create the ledger table if missing
    pub async fn init(&self) -> Result<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                job_id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                checksum TEXT,
                output_bucket TEXT,
                output_key TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            self.table
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(map_ledger_error)?;

        info!(table = %self.table, "Ledger table ready");
        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[derive(sqlx::FromRow)]
struct LedgerRow {
    status: String,
    checksum: Option<String>,
    output_bucket: Option<String>,
    output_key: Option<String>,
}

impl LedgerRow {
    fn into_status(self, job_id: &JobId) -> Result<LedgerStatus> {
        match self.status.as_str() {
            STATUS_IN_PROGRESS => Ok(LedgerStatus::InProgress {
                checksum: self.checksum,
            }),
            STATUS_COMPLETED => {
                let (Some(checksum), Some(bucket), Some(key)) =
                    (self.checksum, self.output_bucket, self.output_key)
                else {
                    return Err(AppError::Ledger(format!(
                        "Completed entry {} is missing checksum or output",
                        job_id
                    )));
                };
                Ok(LedgerStatus::Completed {
                    checksum,
                    output: ObjectLocation::new(bucket, key)?,
                })
            }
            other => Err(AppError::Ledger(format!(
                "Unknown ledger status '{}' for {}",
                other, job_id
            ))),
        }
    }
}

#[async_trait]
impl IdempotencyStore for SqliteIdempotencyStore {
    async fn try_acquire(&self, job_id: &JobId, checksum: Option<&str>) -> Result<bool> {
        let now = self.time_provider.now_millis();
        let sql = format!(
            r#"
            INSERT INTO {} (job_id, status, checksum, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(job_id) DO NOTHING
            "#,
            self.table
        );

        let result = sqlx::query(&sql)
            .bind(job_id.to_string())
            .bind(STATUS_IN_PROGRESS)
            .bind(checksum)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_ledger_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn status(&self, job_id: &JobId) -> Result<LedgerStatus> {
        let sql = format!(
            "SELECT status, checksum, output_bucket, output_key FROM {} WHERE job_id = ?",
            self.table
        );

        let row: Option<LedgerRow> = sqlx::query_as(&sql)
            .bind(job_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_ledger_error)?;

        match row {
            Some(row) => row.into_status(job_id),
            None => Ok(LedgerStatus::Absent),
        }
    }

    async fn complete(
        &self,
        job_id: &JobId,
        checksum: &str,
        output: &ObjectLocation,
    ) -> Result<()> {
        let now = self.time_provider.now_millis();
        let sql = format!(
            r#"
            INSERT INTO {} (job_id, status, checksum, output_bucket, output_key, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(job_id) DO UPDATE SET
                status = excluded.status,
                checksum = excluded.checksum,
                output_bucket = excluded.output_bucket,
                output_key = excluded.output_key,
                updated_at = excluded.updated_at
            "#,
            self.table
        );

        sqlx::query(&sql)
            .bind(job_id.to_string())
            .bind(STATUS_COMPLETED)
            .bind(checksum)
            .bind(output.bucket())
            .bind(output.key())
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_ledger_error)?;

        Ok(())
    }
}
