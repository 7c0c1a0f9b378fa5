// SQLite JobQueue Implementation

use crate::error::map_queue_error;
use async_trait::async_trait;
use csvjob_core::domain::JobMessage;
use csvjob_core::error::{AppError, Result};
use csvjob_core::port::{Delivery, JobQueue, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Durable at-least-once queue in a single SQLite table
///
/// `receive` hides claimed rows for the visibility timeout; rows that are
/// not acked in time become visible again with a higher receive count.
pub struct SqliteJobQueue {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
    visibility_timeout_ms: i64,
}

impl SqliteJobQueue {
    pub fn new(
        pool: SqlitePool,
        time_provider: Arc<dyn TimeProvider>,
        visibility_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            time_provider,
            visibility_timeout_ms: visibility_timeout.as_millis() as i64,
        }
    }

    /// Messages currently visible to `receive`
    pub async fn visible_count(&self) -> Result<i64> {
        let now = self.time_provider.now_millis();
        sqlx::query_scalar("SELECT COUNT(*) FROM job_queue WHERE visible_at <= ?")
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(map_queue_error)
    }

    /// Every unacked message, visible or in flight
    pub async fn total_count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM job_queue")
            .fetch_one(&self.pool)
            .await
            .map_err(map_queue_error)
    }
}

/// Receipts carry the receive count so a stale handle cannot ack a newer claim
fn encode_receipt(id: i64, receive_count: i64) -> String {
    format!("{}.{}", id, receive_count)
}

fn decode_receipt(receipt: &str) -> Result<(i64, i64)> {
    receipt
        .split_once('.')
        .and_then(|(id, count)| Some((id.parse().ok()?, count.parse().ok()?)))
        .ok_or_else(|| AppError::Queue(format!("Invalid receipt handle: {}", receipt)))
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn send(&self, message: &JobMessage) -> Result<()> {
        let body = message.to_json()?;
        let now = self.time_provider.now_millis();

        sqlx::query(
            r#"
            INSERT INTO job_queue (body, enqueued_at, visible_at, receive_count)
            VALUES (?, ?, ?, 0)
            "#,
        )
        .bind(&body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_queue_error)?;

        debug!(job_id = %message.job_id, "Message enqueued");
        Ok(())
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>> {
        let now = self.time_provider.now_millis();
        let hidden_until = now + self.visibility_timeout_ms;

        // Single statement: SQLite serializes writers, so two receivers can
        // never claim the same row
        let mut rows: Vec<(i64, String, i64)> = sqlx::query_as(
            r#"
            UPDATE job_queue
            SET visible_at = ?, receive_count = receive_count + 1
            WHERE id IN (
                SELECT id FROM job_queue
                WHERE visible_at <= ?
                ORDER BY id ASC
                LIMIT ?
            )
            RETURNING id, body, receive_count
            "#,
        )
        .bind(hidden_until)
        .bind(now)
        .bind(max_messages as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_queue_error)?;

        // RETURNING order is unspecified
        rows.sort_by_key(|(id, _, _)| *id);

        Ok(rows
            .into_iter()
            .map(|(id, body, receive_count)| Delivery {
                receipt: encode_receipt(id, receive_count),
                body,
                receive_count: receive_count as u32,
            })
            .collect())
    }

    async fn ack(&self, receipt: &str) -> Result<()> {
        let (id, receive_count) = decode_receipt(receipt)?;

        let result = sqlx::query("DELETE FROM job_queue WHERE id = ? AND receive_count = ?")
            .bind(id)
            .bind(receive_count)
            .execute(&self.pool)
            .await
            .map_err(map_queue_error)?;

        if result.rows_affected() == 0 {
            // Redelivered to someone else after the timeout; they will ack it
            debug!(receipt, "Stale receipt, message not deleted");
        }
        Ok(())
    }
}
