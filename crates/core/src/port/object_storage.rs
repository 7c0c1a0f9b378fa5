// Object Storage Port (get / put / head by location)

use crate::domain::ObjectLocation;
use crate::error::Result;
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Readable byte stream over a stored object; dropping it releases the source
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Content type of result artifacts
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Object metadata returned by `head`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub size_bytes: u64,
}

/// Durable object storage
///
/// Implementations:
/// - InMemoryObjectStorage: process-local map (local runner, tests)
/// - LocalObjectStorage / S3ObjectStorage: csvjob-infra-storage
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Open a read stream on the object
    ///
    /// # Errors
    /// - AppError::NotFound if the object does not exist
    async fn get(&self, location: &ObjectLocation) -> Result<ByteStream>;

    /// Write the object, replacing any previous content
    async fn put(&self, location: &ObjectLocation, bytes: Vec<u8>, content_type: &str)
        -> Result<()>;

    /// Probe object metadata without reading the body
    async fn head(&self, location: &ObjectLocation) -> Result<ObjectMetadata>;
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

pub mod memory {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct StoredObject {
        bytes: Vec<u8>,
        content_type: String,
    }

    /// In-memory object storage keyed by location
    #[derive(Default)]
    pub struct InMemoryObjectStorage {
        objects: Mutex<HashMap<ObjectLocation, StoredObject>>,
        put_count: Mutex<usize>,
    }

    impl InMemoryObjectStorage {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed an object without counting it as a put
        pub fn insert(&self, location: ObjectLocation, bytes: impl Into<Vec<u8>>) {
            self.objects.lock().unwrap().insert(
                location,
                StoredObject {
                    bytes: bytes.into(),
                    content_type: "application/octet-stream".to_string(),
                },
            );
        }

        pub fn object(&self, location: &ObjectLocation) -> Option<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(location)
                .map(|o| o.bytes.clone())
        }

        pub fn content_type(&self, location: &ObjectLocation) -> Option<String> {
            self.objects
                .lock()
                .unwrap()
                .get(location)
                .map(|o| o.content_type.clone())
        }

        /// Number of `put` calls served so far
        pub fn put_count(&self) -> usize {
            *self.put_count.lock().unwrap()
        }

        fn stored(&self, location: &ObjectLocation) -> Result<StoredObject> {
            self.objects
                .lock()
                .unwrap()
                .get(location)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Object not found: {}", location)))
        }
    }

    #[async_trait]
    impl ObjectStorage for InMemoryObjectStorage {
        async fn get(&self, location: &ObjectLocation) -> Result<ByteStream> {
            let stored = self.stored(location)?;
            Ok(Box::new(Cursor::new(stored.bytes)))
        }

        async fn put(
            &self,
            location: &ObjectLocation,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<()> {
            self.objects.lock().unwrap().insert(
                location.clone(),
                StoredObject {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );
            *self.put_count.lock().unwrap() += 1;
            Ok(())
        }

        async fn head(&self, location: &ObjectLocation) -> Result<ObjectMetadata> {
            let stored = self.stored(location)?;
            Ok(ObjectMetadata {
                size_bytes: stored.bytes.len() as u64,
            })
        }
    }
}
