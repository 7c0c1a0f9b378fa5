//! Shared harness: SQLite queue + SQLite ledger + filesystem storage in a temp dir

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use csvjob_core::application::{CreateJobService, ProcessJobService, Worker};
use csvjob_core::domain::{JobId, JobMessage, ObjectLocation};
use csvjob_core::port::id_provider::UuidProvider;
use csvjob_core::port::metrics::mocks::RecordingMetrics;
use csvjob_core::port::time_provider::mocks::SteppingTimeProvider;
use csvjob_core::port::ObjectStorage;
use csvjob_infra_sqlite::{create_pool, run_migrations, SqliteIdempotencyStore, SqliteJobQueue};
use csvjob_infra_storage::LocalObjectStorage;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const INPUT_BUCKET: &str = "uploads";
pub const OUTPUT_BUCKET: &str = "results";
pub const VISIBILITY_TIMEOUT: Duration = Duration::from_secs(60);

pub struct Pipeline {
    pub dir: TempDir,
    pub clock: Arc<SteppingTimeProvider>,
    pub queue: Arc<SqliteJobQueue>,
    pub ledger: Arc<SqliteIdempotencyStore>,
    pub storage: Arc<LocalObjectStorage>,
    pub metrics: Arc<RecordingMetrics>,
}

impl Pipeline {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("csvjob.db").display());
        let pool = create_pool(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let clock = Arc::new(SteppingTimeProvider::fixed(
            Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap(),
        ));
        let queue = Arc::new(SqliteJobQueue::new(
            pool.clone(),
            clock.clone(),
            VISIBILITY_TIMEOUT,
        ));
        let ledger =
            Arc::new(SqliteIdempotencyStore::new(pool, "job_ledger", clock.clone()).unwrap());
        ledger.init().await.unwrap();
        let storage = Arc::new(LocalObjectStorage::new(dir.path().join("objects")));

        Self {
            dir,
            clock,
            queue,
            ledger,
            storage,
            metrics: Arc::new(RecordingMetrics::new()),
        }
    }

    pub fn processor(&self, exclude_header: bool) -> Arc<ProcessJobService> {
        Arc::new(ProcessJobService::new(
            self.storage.clone(),
            self.ledger.clone(),
            self.metrics.clone(),
            self.clock.clone(),
            exclude_header,
        ))
    }

    pub fn worker(&self) -> Worker {
        Worker::new(self.queue.clone(), self.processor(false))
    }

    pub fn creator(&self) -> CreateJobService {
        CreateJobService::new(
            self.queue.clone(),
            Arc::new(UuidProvider),
            self.clock.clone(),
            OUTPUT_BUCKET,
        )
        .unwrap()
    }

    /// Store an input object the way an upload would
    pub async fn upload(&self, key: &str, body: &[u8]) -> ObjectLocation {
        let location = ObjectLocation::new(INPUT_BUCKET, key).unwrap();
        self.storage
            .put(&location, body.to_vec(), "text/csv")
            .await
            .unwrap();
        location
    }

    pub fn message_for(&self, input: &ObjectLocation) -> JobMessage {
        let job_id = JobId::new_random();
        let output = ObjectLocation::output_for(OUTPUT_BUCKET, &job_id).unwrap();
        JobMessage::new(job_id, input, &output, Utc::now())
    }

    /// Drive one worker until the queue has nothing visible
    pub async fn drain(&self, worker: &Worker) -> usize {
        let mut received = 0;
        loop {
            let n = worker.process_next_batch().await.unwrap();
            if n == 0 {
                return received;
            }
            received += n;
        }
    }

    pub fn output_path(&self, job_id: &JobId) -> std::path::PathBuf {
        self.dir
            .path()
            .join("objects")
            .join(OUTPUT_BUCKET)
            .join("output")
            .join(format!("{}.json", job_id))
    }

    pub fn expire_visibility(&self) {
        self.clock
            .advance(chrono::Duration::seconds(VISIBILITY_TIMEOUT.as_secs() as i64 + 1));
    }
}
