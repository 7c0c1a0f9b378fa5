//! Adapter selection from `AppConfig`

use anyhow::{Context, Result};
use csvjob_core::application::worker::constants::DEFAULT_VISIBILITY_TIMEOUT;
use csvjob_core::application::ProcessJobService;
use csvjob_core::config::{AppConfig, IdempotencyBackend, StorageBackend};
use csvjob_core::port::idempotency_store::memory::InMemoryIdempotencyStore;
use csvjob_core::port::metrics::TracingMetrics;
use csvjob_core::port::{IdempotencyStore, ObjectStorage, TimeProvider};
use csvjob_infra_sqlite::{create_pool, run_migrations, SqliteIdempotencyStore, SqliteJobQueue};
use csvjob_infra_storage::{LocalObjectStorage, S3Config, S3ObjectStorage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// `STORAGE_ROOT` with `~` expanded
pub fn storage_root(config: &AppConfig) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&config.storage_root).into_owned())
}

/// Expand `~` inside a `sqlite://~/...` URL
pub fn expand_database_url(url: &str) -> String {
    match url.strip_prefix("sqlite://") {
        Some(path) => format!("sqlite://{}", shellexpand::tilde(path)),
        None => url.to_string(),
    }
}

pub async fn build_storage(config: &AppConfig) -> Result<Arc<dyn ObjectStorage>> {
    match config.storage_backend {
        StorageBackend::Local => {
            let root = storage_root(config);
            info!(root = %root.display(), "Using local object storage");
            Ok(Arc::new(LocalObjectStorage::new(root)))
        }
        StorageBackend::S3 => {
            let storage = S3ObjectStorage::new(S3Config::from_app_config(config)).await;
            Ok(Arc::new(storage))
        }
    }
}

pub async fn build_ledger(
    config: &AppConfig,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<Arc<dyn IdempotencyStore>> {
    match config.idempotency_backend {
        IdempotencyBackend::InMemory => {
            warn!("IDP_MODE=IN_MEMORY: duplicates are only suppressed within this process");
            Ok(Arc::new(InMemoryIdempotencyStore::new()))
        }
        IdempotencyBackend::Durable => {
            let table = config.require_ledger_table()?;
            let url = expand_database_url(config.ledger_database_url()?);
            info!(database_url = %url, table, "Using durable ledger");

            let pool = create_pool(&url)
                .await
                .context("Ledger pool creation failed")?;
            let store = SqliteIdempotencyStore::new(pool, table, time_provider)?;
            store.init().await.context("Ledger table creation failed")?;
            Ok(Arc::new(store))
        }
    }
}

pub async fn build_queue(
    config: &AppConfig,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<Arc<SqliteJobQueue>> {
    let url = expand_database_url(config.require_job_queue_url()?);
    info!(database_url = %url, "Opening job queue");

    let pool = create_pool(&url).await.context("Queue pool creation failed")?;
    run_migrations(&pool).await.context("Queue migration failed")?;
    Ok(Arc::new(SqliteJobQueue::new(
        pool,
        time_provider,
        DEFAULT_VISIBILITY_TIMEOUT,
    )))
}

pub async fn build_processor(
    config: &AppConfig,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<ProcessJobService> {
    let storage = build_storage(config).await?;
    let ledger = build_ledger(config, time_provider.clone()).await?;
    Ok(ProcessJobService::new(
        storage,
        ledger,
        Arc::new(TracingMetrics),
        time_provider,
        config.exclude_header,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvjob_core::domain::JobId;
    use csvjob_core::port::time_provider::SystemTimeProvider;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, String)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        AppConfig::from_map(&vars).unwrap()
    }

    #[test]
    fn test_expand_database_url() {
        assert_eq!(expand_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            expand_database_url("sqlite:///tmp/q.db"),
            "sqlite:///tmp/q.db"
        );
        assert!(!expand_database_url("sqlite://~/q.db").contains('~'));
    }

    #[tokio::test]
    async fn test_durable_ledger_is_shared_through_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
        let config = config(&[
            ("IDP_MODE", "DURABLE".to_string()),
            ("LEDGER_DATABASE_URL", url),
            ("LEDGER_TABLE_NAME", "job_ledger".to_string()),
        ]);

        let first = build_ledger(&config, Arc::new(SystemTimeProvider)).await.unwrap();
        let second = build_ledger(&config, Arc::new(SystemTimeProvider)).await.unwrap();

        let job_id = JobId::new_random();
        assert!(first.try_acquire(&job_id, None).await.unwrap());
        assert!(!second.try_acquire(&job_id, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_durable_ledger_requires_table() {
        let config = config(&[("IDP_MODE", "DURABLE".to_string())]);
        assert!(build_ledger(&config, Arc::new(SystemTimeProvider))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_queue_requires_url() {
        let config = config(&[]);
        let err = build_queue(&config, Arc::new(SystemTimeProvider))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("JOB_QUEUE_URL"));
    }

    #[tokio::test]
    async fn test_local_storage_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&[("STORAGE_ROOT", dir.path().display().to_string())]);
        assert_eq!(storage_root(&config), dir.path());
        assert!(build_storage(&config).await.is_ok());
    }
}
