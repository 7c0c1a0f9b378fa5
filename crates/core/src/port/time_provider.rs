// Time Provider Port (for testability)

use chrono::{DateTime, Utc};

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Current time in milliseconds since epoch
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use chrono::Duration;
    use std::sync::Mutex;

    /// Deterministic clock that advances by a fixed step on every read
    pub struct SteppingTimeProvider {
        current: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingTimeProvider {
        pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                current: Mutex::new(start),
                step,
            }
        }

        /// Frozen clock
        pub fn fixed(at: DateTime<Utc>) -> Self {
            Self::new(at, Duration::zero())
        }

        pub fn advance(&self, by: Duration) {
            let mut current = self.current.lock().unwrap();
            *current += by;
        }
    }

    impl TimeProvider for SteppingTimeProvider {
        fn now(&self) -> DateTime<Utc> {
            let mut current = self.current.lock().unwrap();
            let now = *current;
            *current = now + self.step;
            now
        }
    }
}
