// Worker constants
use std::time::Duration;

/// Sleep duration when the queue returned nothing (100ms)
pub const IDLE_SLEEP_DURATION: Duration = Duration::from_millis(100);

/// Sleep duration after a failed receive before polling again (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Messages requested per receive call
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// How long a received message stays hidden before redelivery (5 minutes)
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(300);
