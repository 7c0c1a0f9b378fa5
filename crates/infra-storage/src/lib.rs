// csvjob Infrastructure - Object Storage Adapters
// Implements: ObjectStorage for the local filesystem and S3-compatible stores

mod local;
mod s3;

pub use local::LocalObjectStorage;
pub use s3::{S3Config, S3ObjectStorage};
