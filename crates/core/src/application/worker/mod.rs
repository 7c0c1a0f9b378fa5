// Worker - Queue polling and batch dispatch

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::process_job::{ProcessJobService, ProcessOutcome};
use crate::domain::JobMessage;
use crate::error::Result;
use crate::port::{Delivery, JobQueue};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Worker pulls job messages from a queue and hands them to the processor
pub struct Worker {
    queue: Arc<dyn JobQueue>,
    processor: Arc<ProcessJobService>,
    batch_size: usize,
}

impl Worker {
    pub fn new(queue: Arc<dyn JobQueue>, processor: Arc<ProcessJobService>) -> Self {
        Self {
            queue,
            processor,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run worker loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(batch_size = self.batch_size, "Worker started");
        loop {
            if shutdown.is_shutdown() {
                info!("Worker shutting down");
                break;
            }
            match self.process_next_batch().await {
                Ok(0) => {
                    tokio::select! {
                        _ = sleep(IDLE_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!("Worker interrupted during idle");
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error_kind = e.kind(), error = %e, "Worker error");
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!("Worker interrupted during error recovery");
                            break;
                        }
                    }
                }
            }
        }
        info!("Worker stopped");
        Ok(())
    }

    /// Receive one batch, process it and ack every item that did not fail
    ///
    /// Returns the number of deliveries received.
    pub async fn process_next_batch(&self) -> Result<usize> {
        let deliveries = self.queue.receive(self.batch_size).await?;
        if deliveries.is_empty() {
            return Ok(0);
        }

        let failed = self.process_batch(&deliveries).await;
        for delivery in &deliveries {
            if failed.contains(&delivery.receipt) {
                continue;
            }
            // An ack lost here only costs a redelivery, which is skipped
            if let Err(e) = self.queue.ack(&delivery.receipt).await {
                warn!(receipt = %delivery.receipt, error = %e, "Failed to ack message");
            }
        }
        Ok(deliveries.len())
    }

    /// Process a batch and return the receipts of the items that failed
    ///
    /// Skipped and lock-denied items count as handled. A malformed body or a
    /// panicking job fails only its own item.
    pub async fn process_batch(&self, deliveries: &[Delivery]) -> Vec<String> {
        let mut handles = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            let message = match JobMessage::from_json(&delivery.body) {
                Ok(message) => message,
                Err(e) => {
                    error!(
                        receipt = %delivery.receipt,
                        receive_count = delivery.receive_count,
                        error_kind = e.kind(),
                        error = %e,
                        "job_message_rejected"
                    );
                    handles.push((delivery.receipt.clone(), None));
                    continue;
                }
            };

            // Each job runs in its own task so a panic cannot take the worker down
            let processor = Arc::clone(&self.processor);
            let handle = tokio::task::spawn(async move { processor.process(&message).await });
            handles.push((delivery.receipt.clone(), Some(handle)));
        }

        let mut failed = Vec::new();
        for (receipt, handle) in handles {
            let Some(handle) = handle else {
                failed.push(receipt);
                continue;
            };
            match handle.await {
                Ok(Ok(outcome)) => {
                    debug!(receipt = %receipt, outcome = outcome.label(), "Message handled");
                    if let ProcessOutcome::Succeeded(result) = outcome {
                        debug!(job_id = %result.job_id, "Result persisted");
                    }
                }
                // Already logged by the processor
                Ok(Err(_)) => failed.push(receipt),
                Err(join_err) => {
                    if join_err.is_panic() {
                        error!(receipt = %receipt, "Job panicked: {:?}", join_err);
                    } else {
                        error!(receipt = %receipt, "Job cancelled: {:?}", join_err);
                    }
                    failed.push(receipt);
                }
            }
        }

        if !failed.is_empty() {
            warn!(
                batch_size = deliveries.len(),
                failed = failed.len(),
                "Batch finished with failures"
            );
        }
        failed
    }
}
