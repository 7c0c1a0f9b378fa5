// Job Queue Port (at-least-once delivery, no ordering guarantee)

use crate::domain::JobMessage;
use crate::error::Result;
use async_trait::async_trait;

/// One delivered queue message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Opaque handle used to acknowledge this delivery
    pub receipt: String,
    /// Raw message body (JSON job message)
    pub body: String,
    /// How many times this message has been handed out, including this one
    pub receive_count: u32,
}

/// Message queue carrying job descriptions
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Publish a job message
    async fn send(&self, message: &JobMessage) -> Result<()>;

    /// Claim up to `max_messages` visible messages
    ///
    /// Claimed messages stay hidden until acknowledged; adapters decide
    /// when unacknowledged messages become visible again.
    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>>;

    /// Acknowledge (delete) a delivered message
    async fn ack(&self, receipt: &str) -> Result<()>;
}

// ============================================================================
// In-Memory Implementation
// ============================================================================

pub mod memory {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Default)]
    struct QueueState {
        next_id: u64,
        visible: VecDeque<(u64, String, u32)>,
        in_flight: HashMap<u64, (String, u32)>,
    }

    /// FIFO in-memory queue; unacked messages return only via `redeliver_in_flight`
    #[derive(Default)]
    pub struct InMemoryJobQueue {
        state: Mutex<QueueState>,
    }

    impl InMemoryJobQueue {
        pub fn new() -> Self {
            Self::default()
        }

        /// Enqueue a raw body (used to inject malformed messages)
        pub fn push_raw(&self, body: impl Into<String>) {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            state.visible.push_back((id, body.into(), 0));
        }

        /// Pop the next message body without the receive/ack cycle
        pub fn poll(&self) -> Option<String> {
            self.state
                .lock()
                .unwrap()
                .visible
                .pop_front()
                .map(|(_, body, _)| body)
        }

        /// Make every unacknowledged delivery visible again
        pub fn redeliver_in_flight(&self) -> usize {
            let mut state = self.state.lock().unwrap();
            let mut ids: Vec<u64> = state.in_flight.keys().copied().collect();
            ids.sort_unstable();
            for id in &ids {
                if let Some((body, count)) = state.in_flight.remove(id) {
                    state.visible.push_back((*id, body, count));
                }
            }
            ids.len()
        }

        /// Visible messages waiting for delivery
        pub fn len(&self) -> usize {
            self.state.lock().unwrap().visible.len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        pub fn in_flight(&self) -> usize {
            self.state.lock().unwrap().in_flight.len()
        }
    }

    #[async_trait]
    impl JobQueue for InMemoryJobQueue {
        async fn send(&self, message: &JobMessage) -> Result<()> {
            self.push_raw(message.to_json()?);
            Ok(())
        }

        async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>> {
            let mut state = self.state.lock().unwrap();
            let mut deliveries = Vec::new();
            while deliveries.len() < max_messages {
                let Some((id, body, count)) = state.visible.pop_front() else {
                    break;
                };
                let receive_count = count + 1;
                state.in_flight.insert(id, (body.clone(), receive_count));
                deliveries.push(Delivery {
                    receipt: id.to_string(),
                    body,
                    receive_count,
                });
            }
            Ok(deliveries)
        }

        async fn ack(&self, receipt: &str) -> Result<()> {
            if let Ok(id) = receipt.parse::<u64>() {
                self.state.lock().unwrap().in_flight.remove(&id);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryJobQueue;
    use super::*;

    #[tokio::test]
    async fn test_receive_ack_and_redelivery() {
        let queue = InMemoryJobQueue::new();
        queue.push_raw("first");
        queue.push_raw("second");

        let batch = queue.receive(10).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].body, "first");
        assert_eq!(batch[0].receive_count, 1);
        assert!(queue.is_empty());

        queue.ack(&batch[0].receipt).await.unwrap();
        assert_eq!(queue.in_flight(), 1);

        assert_eq!(queue.redeliver_in_flight(), 1);
        let again = queue.receive(10).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].body, "second");
        assert_eq!(again[0].receive_count, 2);
    }

    #[tokio::test]
    async fn test_receive_respects_max_messages() {
        let queue = InMemoryJobQueue::new();
        for i in 0..5 {
            queue.push_raw(format!("m{}", i));
        }
        assert_eq!(queue.receive(2).await.unwrap().len(), 2);
        assert_eq!(queue.len(), 3);
    }
}
