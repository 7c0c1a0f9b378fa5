// Application Layer - Use Cases and Business Logic

pub mod create_job;
pub mod idempotency;
pub mod process_job;
pub mod summarizer;
pub mod worker;

// Re-exports
pub use create_job::CreateJobService;
pub use idempotency::IdempotencyCoordinator;
pub use process_job::{JobContext, ProcessJobService, ProcessOutcome};
pub use summarizer::summarize;
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken, Worker};
