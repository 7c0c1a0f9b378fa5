// Idempotency Coordinator - acquire / check / complete over the ledger

use crate::domain::{IdempotencyKey, LedgerStatus, ObjectLocation};
use crate::error::Result;
use crate::port::IdempotencyStore;
use std::sync::Arc;
use tracing::debug;

/// Coordinates effectively-once processing through a pluggable ledger
///
/// The lock is identity-scoped: a worker cannot know the content checksum
/// before it has won the right to read the file. Checksums attached later
/// refine completion matching only.
pub struct IdempotencyCoordinator {
    store: Arc<dyn IdempotencyStore>,
}

impl IdempotencyCoordinator {
    pub fn new(store: Arc<dyn IdempotencyStore>) -> Self {
        Self { store }
    }

    /// True only for a `Completed` entry whose checksum matches the key's
    ///
    /// A key without checksum matches any completed entry. A completed entry
    /// with a different checksum reports "not completed" for this key.
    pub async fn is_completed(&self, key: &IdempotencyKey) -> Result<bool> {
        let status = self.store.status(key.job_id()).await?;
        let completed = match (&status, key.checksum()) {
            (LedgerStatus::Completed { .. }, None) => true,
            (LedgerStatus::Completed { checksum, .. }, Some(expected)) => checksum == expected,
            _ => false,
        };
        debug!(
            idempotency_key = %key,
            ledger_status = %status,
            completed,
            "Checked ledger completion"
        );
        Ok(completed)
    }

    /// Single-winner lock: true iff this caller moved the entry out of `Absent`
    pub async fn try_acquire(&self, key: &IdempotencyKey) -> Result<bool> {
        let acquired = self
            .store
            .try_acquire(key.job_id(), key.checksum())
            .await?;
        debug!(idempotency_key = %key, acquired, "Ledger acquire attempted");
        Ok(acquired)
    }

    /// Mark the job `Completed`; call only after the output is durably written
    pub async fn mark_completed(
        &self,
        key: &IdempotencyKey,
        output: &ObjectLocation,
        checksum: &str,
    ) -> Result<()> {
        self.store.complete(key.job_id(), checksum, output).await?;
        debug!(idempotency_key = %key, output = %output, "Ledger entry completed");
        Ok(())
    }

    /// Raw ledger state, for operators
    pub async fn status(&self, key: &IdempotencyKey) -> Result<LedgerStatus> {
        self.store.status(key.job_id()).await
    }
}
