// Idempotency Ledger Port (conditional-write key-value store)

use crate::domain::{JobId, LedgerStatus, ObjectLocation};
use crate::error::Result;
use async_trait::async_trait;

/// Persistent ledger keyed by job identity
///
/// Every operation must be atomic at the storage layer. In particular
/// `try_acquire` is a conditional insert, never read-then-write.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// `Absent -> InProgress`, storing `checksum` if given
    ///
    /// Returns true iff this call created the entry.
    async fn try_acquire(&self, job_id: &JobId, checksum: Option<&str>) -> Result<bool>;

    /// Current entry state
    async fn status(&self, job_id: &JobId) -> Result<LedgerStatus>;

    /// Unconditionally set `Completed` with checksum and output location
    async fn complete(&self, job_id: &JobId, checksum: &str, output: &ObjectLocation)
        -> Result<()>;
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

pub mod memory {
    use super::*;
    use std::collections::hash_map::Entry;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Process-local ledger (IDP_MODE=IN_MEMORY)
    #[derive(Default)]
    pub struct InMemoryIdempotencyStore {
        entries: Mutex<HashMap<JobId, LedgerStatus>>,
        complete_calls: Mutex<usize>,
    }

    impl InMemoryIdempotencyStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of an entry without going through the async port
        pub fn entry(&self, job_id: &JobId) -> LedgerStatus {
            self.entries
                .lock()
                .unwrap()
                .get(job_id)
                .cloned()
                .unwrap_or(LedgerStatus::Absent)
        }

        /// Number of `complete` calls served so far
        pub fn complete_calls(&self) -> usize {
            *self.complete_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl IdempotencyStore for InMemoryIdempotencyStore {
        async fn try_acquire(&self, job_id: &JobId, checksum: Option<&str>) -> Result<bool> {
            let mut entries = self.entries.lock().unwrap();
            match entries.entry(*job_id) {
                Entry::Occupied(_) => Ok(false),
                Entry::Vacant(slot) => {
                    slot.insert(LedgerStatus::InProgress {
                        checksum: checksum.map(str::to_string),
                    });
                    Ok(true)
                }
            }
        }

        async fn status(&self, job_id: &JobId) -> Result<LedgerStatus> {
            Ok(self.entry(job_id))
        }

        async fn complete(
            &self,
            job_id: &JobId,
            checksum: &str,
            output: &ObjectLocation,
        ) -> Result<()> {
            self.entries.lock().unwrap().insert(
                *job_id,
                LedgerStatus::Completed {
                    checksum: checksum.to_string(),
                    output: output.clone(),
                },
            );
            *self.complete_calls.lock().unwrap() += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryIdempotencyStore;
    use super::*;

    #[tokio::test]
    async fn test_single_winner_acquire() {
        let store = InMemoryIdempotencyStore::new();
        let job_id = JobId::new_random();

        assert!(store.try_acquire(&job_id, None).await.unwrap());
        assert!(!store.try_acquire(&job_id, None).await.unwrap());
        assert_eq!(
            store.status(&job_id).await.unwrap(),
            LedgerStatus::InProgress { checksum: None }
        );
    }

    #[tokio::test]
    async fn test_complete_is_terminal_for_acquire() {
        let store = InMemoryIdempotencyStore::new();
        let job_id = JobId::new_random();
        let output = ObjectLocation::output_for("out", &job_id).unwrap();

        store.try_acquire(&job_id, Some("c0ffee")).await.unwrap();
        store.complete(&job_id, "c0ffee", &output).await.unwrap();

        assert!(!store.try_acquire(&job_id, None).await.unwrap());
        assert!(store.status(&job_id).await.unwrap().is_completed());
        assert_eq!(store.complete_calls(), 1);
    }
}
