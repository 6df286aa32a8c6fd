//! Public submission entry point.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::Transport;
use crate::config::RateLimitConfig;
use crate::error::{CrptError, Result};

use super::dispatcher::Dispatcher;
use super::queue::{admission_queue, QueueClosed, QueueProducer, SubmissionTask, TryEnqueueError};

/// Cloneable producer handle over the admission queue.
///
/// Submission is synchronous from the caller's point of view: it returns once
/// the task is admitted to the queue, not once it has been sent.
pub struct SubmissionClient<D> {
    queue: QueueProducer<D>,
    seq: Arc<AtomicU64>,
}

impl<D> Clone for SubmissionClient<D> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            seq: self.seq.clone(),
        }
    }
}

impl<D: Serialize> SubmissionClient<D> {
    /// Build the client and its paired dispatcher.
    ///
    /// The queue capacity equals the per-window request limit, so the queue
    /// holds at most one window's worth of backlog.
    pub fn new(
        config: &RateLimitConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<(Self, Dispatcher<D>)> {
        config.validate()?;

        let (producer, consumer) = admission_queue(config.max_requests_per_window as usize);
        let dispatcher = Dispatcher::new(consumer, transport, config.pacing_interval());
        let client = Self {
            queue: producer,
            seq: Arc::new(AtomicU64::new(0)),
        };

        Ok((client, dispatcher))
    }

    /// Submit a document, waiting while the queue is at capacity.
    ///
    /// Returns the submission tag once the task is admitted. Cancelling the
    /// returned future while it waits leaves the queue untouched.
    pub async fn submit(&self, payload: D, signature: impl Into<String>) -> Result<u64> {
        let task = self.next_task(payload, signature.into());
        let seq = task.seq;

        match self.queue.enqueue(task).await {
            Ok(()) => {
                debug!(seq, "Submission admitted");
                Ok(seq)
            }
            Err(QueueClosed(_)) => {
                warn!(seq, "Submission refused, pipeline is shut down");
                Err(CrptError::Shutdown)
            }
        }
    }

    /// Submit a document without waiting; fails when the queue is at capacity.
    pub fn try_submit(&self, payload: D, signature: impl Into<String>) -> Result<u64> {
        let task = self.next_task(payload, signature.into());
        let seq = task.seq;

        match self.queue.try_enqueue(task) {
            Ok(()) => {
                debug!(seq, "Submission admitted");
                Ok(seq)
            }
            Err(TryEnqueueError::Full(_)) => Err(CrptError::QueueFull),
            Err(TryEnqueueError::Closed(_)) => Err(CrptError::Shutdown),
        }
    }

    /// Number of tasks currently awaiting dispatch.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Maximum number of tasks the queue can hold.
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    fn next_task(&self, payload: D, signature: String) -> SubmissionTask<D> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        SubmissionTask::new(payload, signature, seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResponse;
    use async_trait::async_trait;
    use tokio_test::assert_ok;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn send(&self, _body: Vec<u8>) -> Result<ApiResponse> {
            Ok(ApiResponse {
                status: 200,
                body: String::new(),
            })
        }
    }

    fn config(max_requests: u32) -> RateLimitConfig {
        RateLimitConfig {
            window_secs: 1,
            max_requests_per_window: max_requests,
        }
    }

    #[tokio::test]
    async fn test_client_rejects_invalid_config() {
        let result = SubmissionClient::<u32>::new(&config(0), Arc::new(NullTransport));
        assert!(matches!(result, Err(CrptError::Config(_))));
    }

    #[tokio::test]
    async fn test_capacity_equals_request_limit() {
        let (client, _dispatcher) =
            SubmissionClient::<u32>::new(&config(7), Arc::new(NullTransport)).unwrap();
        assert_eq!(client.capacity(), 7);
        assert_eq!(client.pending(), 0);
    }

    #[tokio::test]
    async fn test_seq_tags_increase_across_clones() {
        let (client, _dispatcher) =
            SubmissionClient::<u32>::new(&config(8), Arc::new(NullTransport)).unwrap();
        let clone = client.clone();

        let first = client.submit(1, "sig").await.unwrap();
        let second = clone.submit(2, "sig").await.unwrap();
        let third = client.submit(3, "sig").await.unwrap();

        assert!(first < second);
        assert!(second < third);
        assert_eq!(client.pending(), 3);
    }

    #[tokio::test]
    async fn test_try_submit_full_queue() {
        let (client, _dispatcher) =
            SubmissionClient::<u32>::new(&config(1), Arc::new(NullTransport)).unwrap();

        assert_ok!(client.try_submit(1, "sig"));
        assert!(matches!(
            client.try_submit(2, "sig"),
            Err(CrptError::QueueFull)
        ));
    }

    #[tokio::test]
    async fn test_submit_after_dispatcher_dropped() {
        let (client, dispatcher) =
            SubmissionClient::<u32>::new(&config(4), Arc::new(NullTransport)).unwrap();
        drop(dispatcher);

        assert!(matches!(
            client.submit(1, "sig").await,
            Err(CrptError::Shutdown)
        ));
        assert!(matches!(
            client.try_submit(2, "sig"),
            Err(CrptError::Shutdown)
        ));
    }
}
