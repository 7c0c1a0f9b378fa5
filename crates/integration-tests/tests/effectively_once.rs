//! Duplicate deliveries, redelivery after a lost ack, and racing workers

mod common;

use common::Pipeline;
use csvjob_core::application::{shutdown_channel, ProcessOutcome};
use csvjob_core::domain::{JobMessage, LedgerStatus, ObjectLocation};
use csvjob_core::port::metrics::JOBS_PROCESSED;
use csvjob_core::port::{IdempotencyStore, JobQueue};
use std::time::Duration;

const BODY: &[u8] = b"sku,qty\nA-1,3\nB-2,7\n";

#[tokio::test]
async fn test_duplicate_messages_in_one_batch_write_once() {
    let p = Pipeline::new().await;
    let input = p.upload("stock.csv", BODY).await;
    let message = p.message_for(&input);

    for _ in 0..3 {
        p.queue.send(&message).await.unwrap();
    }

    let worker = p.worker();
    assert_eq!(worker.process_next_batch().await.unwrap(), 3);

    // skip and lock-denied are acked like successes
    assert_eq!(p.queue.total_count().await.unwrap(), 0);
    assert_eq!(p.metrics.counter(JOBS_PROCESSED, &[("status", "success")]), 1);
    assert!(p.ledger.status(&message.job_id).await.unwrap().is_completed());
    assert!(p.output_path(&message.job_id).is_file());
}

#[tokio::test]
async fn test_lost_ack_redelivery_is_skipped() {
    let p = Pipeline::new().await;
    let input = p.upload("stock.csv", BODY).await;
    let job_id = p.creator().create_job(&input).await.unwrap();

    // a worker processes the job but dies before acking
    let deliveries = p.queue.receive(1).await.unwrap();
    let message = JobMessage::from_json(&deliveries[0].body).unwrap();
    let outcome = p.processor(false).process(&message).await.unwrap();
    assert!(matches!(outcome, ProcessOutcome::Succeeded(_)));
    let first_write = std::fs::read(p.output_path(&job_id)).unwrap();

    p.expire_visibility();

    let redelivered = p.queue.receive(1).await.unwrap();
    assert_eq!(redelivered[0].receive_count, 2);
    let outcome = p.processor(false).process(&message).await.unwrap();
    assert!(matches!(outcome, ProcessOutcome::Skipped));
    p.queue.ack(&redelivered[0].receipt).await.unwrap();

    assert_eq!(p.queue.total_count().await.unwrap(), 0);
    assert_eq!(std::fs::read(p.output_path(&job_id)).unwrap(), first_write);
    assert_eq!(p.metrics.counter(JOBS_PROCESSED, &[("status", "success")]), 1);
}

#[tokio::test]
async fn test_failed_job_keeps_its_lock_on_redelivery() {
    let p = Pipeline::new().await;
    let input = ObjectLocation::new(common::INPUT_BUCKET, "late.csv").unwrap();
    let job_id = p.creator().create_job(&input).await.unwrap();
    let worker = p.worker();

    // first attempt fails: input not uploaded yet
    worker.process_next_batch().await.unwrap();
    assert_eq!(
        p.ledger.status(&job_id).await.unwrap(),
        LedgerStatus::InProgress { checksum: None }
    );

    // the file arrives, but the stale lock denies the retry; no stuck-lock
    // reclamation exists, so the job needs an operator
    p.upload("late.csv", BODY).await;
    p.expire_visibility();
    assert_eq!(worker.process_next_batch().await.unwrap(), 1);

    assert_eq!(p.queue.total_count().await.unwrap(), 0);
    assert!(!p.output_path(&job_id).exists());
    assert_eq!(
        p.ledger.status(&job_id).await.unwrap(),
        LedgerStatus::InProgress { checksum: None }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_workers_complete_each_job_exactly_once() {
    let p = Pipeline::new().await;
    let mut messages = Vec::new();
    for i in 0..10 {
        let input = p.upload(&format!("batch-{}.csv", i), BODY).await;
        let message = p.message_for(&input);
        // every job is delivered twice
        p.queue.send(&message).await.unwrap();
        p.queue.send(&message).await.unwrap();
        messages.push(message);
    }

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let worker = p.worker().with_batch_size(3);
        let token = shutdown_rx.clone();
        handles.push(tokio::spawn(async move { worker.run(token).await }));
    }

    for _ in 0..250 {
        if p.queue.total_count().await.unwrap() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    shutdown_tx.shutdown();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(p.queue.total_count().await.unwrap(), 0);
    assert_eq!(p.metrics.counter(JOBS_PROCESSED, &[("status", "success")]), 10);
    assert_eq!(p.metrics.counter(JOBS_PROCESSED, &[("status", "failure")]), 0);
    for message in &messages {
        assert!(p.ledger.status(&message.job_id).await.unwrap().is_completed());
        assert!(p.output_path(&message.job_id).is_file());
    }
}
