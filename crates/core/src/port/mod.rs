// Port Layer - Interfaces for external collaborators

pub mod id_provider; // For deterministic testing
pub mod idempotency_store;
pub mod job_queue;
pub mod metrics;
pub mod object_storage;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use idempotency_store::IdempotencyStore;
pub use job_queue::{Delivery, JobQueue};
pub use metrics::{Metrics, Tags};
pub use object_storage::{ByteStream, ObjectMetadata, ObjectStorage, CONTENT_TYPE_JSON};
pub use time_provider::TimeProvider;
