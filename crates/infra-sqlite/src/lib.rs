// csvjob Infrastructure - SQLite Adapters
// Implements: JobQueue (durable, visibility timeout), IdempotencyStore (conditional insert)

mod connection;
mod error;
mod idempotency_store;
mod job_queue;
mod migration;

pub use connection::create_pool;
pub use error::map_sqlx_error;
pub use idempotency_store::SqliteIdempotencyStore;
pub use job_queue::SqliteJobQueue;
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
