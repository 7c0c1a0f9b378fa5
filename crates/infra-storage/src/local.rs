// Local filesystem ObjectStorage (STORAGE_BACKEND=LOCAL)

use async_trait::async_trait;
use csvjob_core::domain::ObjectLocation;
use csvjob_core::error::{AppError, Result};
use csvjob_core::port::{ByteStream, ObjectMetadata, ObjectStorage};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Objects live at `<root>/<bucket>/<key>`
///
/// Writes go to a sibling temp file and are renamed into place, so readers
/// never observe a partially written object.
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location, refusing anything that could escape the root
    pub fn path_for(&self, location: &ObjectLocation) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for part in [location.bucket(), location.key()] {
            for component in Path::new(part).components() {
                match component {
                    Component::Normal(segment) => path.push(segment),
                    Component::CurDir => {}
                    _ => {
                        return Err(AppError::Validation(format!(
                            "Object location escapes storage root: {}",
                            location
                        )))
                    }
                }
            }
        }
        Ok(path)
    }
}

fn map_io_error(err: std::io::Error, location: &ObjectLocation) -> AppError {
    if err.kind() == ErrorKind::NotFound {
        AppError::NotFound(format!("Object {} does not exist", location))
    } else {
        AppError::Storage(format!("{}: {}", location, err))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn get(&self, location: &ObjectLocation) -> Result<ByteStream> {
        let path = self.path_for(location)?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| map_io_error(e, location))?;
        Ok(Box::new(file))
    }

    async fn put(&self, location: &ObjectLocation, body: Vec<u8>, content_type: &str) -> Result<()> {
        let path = self.path_for(location)?;
        let parent = path
            .parent()
            .ok_or_else(|| AppError::Storage(format!("No parent directory for {}", location)))?;
        fs::create_dir_all(parent)
            .await
            .map_err(|e| map_io_error(e, location))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("object");
        let tmp = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp, &body).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(map_io_error(e, location));
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(map_io_error(e, location));
        }

        debug!(
            location = %location,
            size_bytes = body.len(),
            content_type,
            "Object written"
        );
        Ok(())
    }

    async fn head(&self, location: &ObjectLocation) -> Result<ObjectMetadata> {
        let path = self.path_for(location)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| map_io_error(e, location))?;
        if !metadata.is_file() {
            return Err(AppError::NotFound(format!("Object {} does not exist", location)));
        }
        Ok(ObjectMetadata {
            size_bytes: metadata.len(),
        })
    }
}
