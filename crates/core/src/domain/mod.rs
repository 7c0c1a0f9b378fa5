// Domain Layer - Pure business types

pub mod error;
pub mod job_id;
pub mod ledger;
pub mod location;
pub mod message;
pub mod result;

// Re-exports
pub use error::DomainError;
pub use job_id::JobId;
pub use ledger::{IdempotencyKey, LedgerStatus};
pub use location::{output_key_for, ObjectLocation};
pub use message::JobMessage;
pub use result::{JobStatus, ProcessingResult, ProcessingSummary};
