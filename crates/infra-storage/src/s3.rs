// S3 ObjectStorage (STORAGE_BACKEND=S3)

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream as S3ByteStream;
use aws_sdk_s3::Client;
use csvjob_core::config::AppConfig;
use csvjob_core::domain::ObjectLocation;
use csvjob_core::error::{AppError, Result};
use csvjob_core::port::{ByteStream, ObjectMetadata, ObjectStorage};
use tracing::{debug, info, instrument};

/// Connection settings for an S3-compatible endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub region: String,
    /// Custom endpoint (MinIO, localstack); implies path-style addressing
    pub endpoint: Option<String>,
}

impl S3Config {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            region: config.aws_region.clone(),
            endpoint: config.s3_endpoint.clone(),
        }
    }

    pub fn force_path_style(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Credentials come from the default AWS provider chain
#[derive(Clone)]
pub struct S3ObjectStorage {
    client: Client,
}

impl S3ObjectStorage {
    pub async fn new(config: S3Config) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style())
            .build();

        info!(
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            "S3 storage client initialized"
        );
        Self {
            client: Client::from_conf(s3_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn storage_error(action: &str, location: &ObjectLocation, err: impl std::error::Error) -> AppError {
    AppError::Storage(format!(
        "Failed to {} s3://{}: {}",
        action,
        location,
        DisplayErrorContext(err)
    ))
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    #[instrument(skip_all, fields(location = %location))]
    async fn get(&self, location: &ObjectLocation) -> Result<ByteStream> {
        let response = self
            .client
            .get_object()
            .bucket(location.bucket())
            .key(location.key())
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    AppError::NotFound(format!("Object {} does not exist", location))
                } else {
                    storage_error("get", location, e)
                }
            })?;

        // Streamed; the body is never buffered whole
        Ok(Box::new(Box::pin(response.body.into_async_read())))
    }

    #[instrument(skip_all, fields(location = %location, size_bytes = body.len()))]
    async fn put(&self, location: &ObjectLocation, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(location.bucket())
            .key(location.key())
            .content_type(content_type)
            .body(S3ByteStream::from(body))
            .send()
            .await
            .map_err(|e| storage_error("put", location, e))?;

        debug!("Object written");
        Ok(())
    }

    #[instrument(skip_all, fields(location = %location))]
    async fn head(&self, location: &ObjectLocation) -> Result<ObjectMetadata> {
        let response = self
            .client
            .head_object()
            .bucket(location.bucket())
            .key(location.key())
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    AppError::NotFound(format!("Object {} does not exist", location))
                } else {
                    storage_error("head", location, e)
                }
            })?;

        Ok(ObjectMetadata {
            size_bytes: response.content_length().unwrap_or(0).max(0) as u64,
        })
    }
}
