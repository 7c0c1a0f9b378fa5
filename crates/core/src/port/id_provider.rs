// ID Provider Port (for deterministic testing)

use crate::domain::JobId;

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique job ID
    fn generate_id(&self) -> JobId;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> JobId {
        JobId::new_random()
    }
}

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out a scripted sequence of IDs, then falls back to random ones
    pub struct FixedIdProvider {
        ids: Mutex<VecDeque<JobId>>,
    }

    impl FixedIdProvider {
        pub fn new(ids: impl IntoIterator<Item = JobId>) -> Self {
            Self {
                ids: Mutex::new(ids.into_iter().collect()),
            }
        }
    }

    impl IdProvider for FixedIdProvider {
        fn generate_id(&self) -> JobId {
            self.ids
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(JobId::new_random)
        }
    }
}
