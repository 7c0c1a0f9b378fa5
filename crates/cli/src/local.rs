// Local end-to-end run over in-memory adapters

use anyhow::{Context, Result};
use csvjob_core::application::{CreateJobService, ProcessJobService};
use csvjob_core::domain::{JobMessage, ObjectLocation};
use csvjob_core::port::id_provider::UuidProvider;
use csvjob_core::port::idempotency_store::memory::InMemoryIdempotencyStore;
use csvjob_core::port::job_queue::memory::InMemoryJobQueue;
use csvjob_core::port::metrics::NoopMetrics;
use csvjob_core::port::object_storage::memory::InMemoryObjectStorage;
use csvjob_core::port::time_provider::SystemTimeProvider;
use csvjob_core::port::TimeProvider;
use std::path::Path;
use std::sync::Arc;

pub const LOCAL_INPUT_BUCKET: &str = "local-input";
pub const LOCAL_OUTPUT_BUCKET: &str = "local-output";

/// Seed the file, create a job, take it off the queue, process it and
/// return the result document
pub async fn run_local(path: &Path, output_bucket: &str, exclude_header: bool) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("File not found: {}", path.display()))?;
    let key = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?;

    let storage = Arc::new(InMemoryObjectStorage::new());
    let queue = Arc::new(InMemoryJobQueue::new());
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);

    let input = ObjectLocation::new(LOCAL_INPUT_BUCKET, key)?;
    storage.insert(input.clone(), bytes);

    let creator = CreateJobService::new(
        queue.clone(),
        Arc::new(UuidProvider),
        time_provider.clone(),
        output_bucket,
    )?;
    let job_id = creator.create_job(&input).await?;

    let body = queue.poll().context("No job message created")?;
    let message = JobMessage::from_json(&body)?;

    let processor = ProcessJobService::new(
        storage.clone(),
        Arc::new(InMemoryIdempotencyStore::new()),
        Arc::new(NoopMetrics),
        time_provider,
        exclude_header,
    );
    processor.process(&message).await?;

    let output = ObjectLocation::output_for(output_bucket, &job_id)?;
    let document = storage
        .object(&output)
        .with_context(|| format!("No result written to {}", output))?;
    Ok(String::from_utf8(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvjob_core::domain::{JobStatus, ProcessingResult};
    use std::io::Write;

    fn csv_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[tokio::test]
    async fn test_processes_file_and_returns_result_json() {
        let file = csv_file(b"a,b\n1,2\n");

        let json = run_local(file.path(), LOCAL_OUTPUT_BUCKET, false).await.unwrap();
        let result: ProcessingResult = serde_json::from_str(&json).unwrap();

        assert_eq!(result.input_bucket, LOCAL_INPUT_BUCKET);
        assert_eq!(result.output_bucket, LOCAL_OUTPUT_BUCKET);
        assert_eq!(result.output_key, format!("output/{}.json", result.job_id));
        assert_eq!(result.total_lines, 2);
        assert_eq!(result.file_size_bytes, 8);
        assert_eq!(result.status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_exclude_header() {
        let file = csv_file(b"a,b\n1,2\n3,4\n");
        let json = run_local(file.path(), LOCAL_OUTPUT_BUCKET, true).await.unwrap();
        let result: ProcessingResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result.total_lines, 2);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = run_local(Path::new("/nonexistent/data.csv"), LOCAL_OUTPUT_BUCKET, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[tokio::test]
    async fn test_non_csv_rejected() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"hello").unwrap();
        assert!(run_local(file.path(), LOCAL_OUTPUT_BUCKET, false)
            .await
            .is_err());
    }
}
