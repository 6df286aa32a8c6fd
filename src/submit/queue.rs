//! Bounded FIFO admission queue between producers and the dispatch loop.
//!
//! The queue holds at most one window's worth of backlog, so a burst of
//! producers is throttled at admission instead of growing memory without
//! bound. Producers wait for space; the single consumer waits for work.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// One pending registration call.
///
/// Created at submission, consumed exactly once by the dispatch loop, and
/// destroyed after execution regardless of outcome.
pub struct SubmissionTask<D> {
    /// Business document to register
    pub payload: D,
    /// Detached signature accompanying the document
    pub signature: String,
    /// Monotonically increasing submission tag
    pub seq: u64,
    /// When the task was submitted. Diagnostics only.
    pub created_at: DateTime<Utc>,
}

impl<D> SubmissionTask<D> {
    /// Create a task stamped with the current time.
    pub fn new(payload: D, signature: String, seq: u64) -> Self {
        Self {
            payload,
            signature,
            seq,
            created_at: Utc::now(),
        }
    }
}

impl<D> fmt::Debug for SubmissionTask<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionTask")
            .field("seq", &self.seq)
            .field("signature", &self.signature)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// The consumer side is gone; the task is handed back to the caller.
pub struct QueueClosed<D>(pub SubmissionTask<D>);

impl<D> fmt::Debug for QueueClosed<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueueClosed").field(&self.0).finish()
    }
}

/// Non-blocking admission failure, with the task handed back.
pub enum TryEnqueueError<D> {
    /// The queue is at capacity
    Full(SubmissionTask<D>),
    /// The consumer side is gone
    Closed(SubmissionTask<D>),
}

impl<D> TryEnqueueError<D> {
    /// Recover ownership of the rejected task.
    pub fn into_task(self) -> SubmissionTask<D> {
        match self {
            TryEnqueueError::Full(task) | TryEnqueueError::Closed(task) => task,
        }
    }
}

impl<D> fmt::Debug for TryEnqueueError<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryEnqueueError::Full(task) => f.debug_tuple("Full").field(task).finish(),
            TryEnqueueError::Closed(task) => f.debug_tuple("Closed").field(task).finish(),
        }
    }
}

/// Create a bounded admission queue, returning the producer and consumer halves.
///
/// Capacity must be at least one; the pipeline sets it to the per-window
/// request limit.
pub fn admission_queue<D>(capacity: usize) -> (QueueProducer<D>, QueueConsumer<D>) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueProducer { tx }, QueueConsumer { rx })
}

/// Producer half of the admission queue. Cheap to clone.
pub struct QueueProducer<D> {
    tx: mpsc::Sender<SubmissionTask<D>>,
}

impl<D> Clone for QueueProducer<D> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<D> QueueProducer<D> {
    /// Insert a task at the tail, waiting while the queue is at capacity.
    ///
    /// Waiting producers are admitted in the order they arrived. If the
    /// caller is cancelled while waiting, the task is never enqueued.
    pub async fn enqueue(&self, task: SubmissionTask<D>) -> Result<(), QueueClosed<D>> {
        self.tx
            .send(task)
            .await
            .map_err(|mpsc::error::SendError(task)| QueueClosed(task))
    }

    /// Insert a task at the tail without waiting.
    pub fn try_enqueue(&self, task: SubmissionTask<D>) -> Result<(), TryEnqueueError<D>> {
        self.tx.try_send(task).map_err(|err| match err {
            TrySendError::Full(task) => TryEnqueueError::Full(task),
            TrySendError::Closed(task) => TryEnqueueError::Closed(task),
        })
    }

    /// Maximum number of tasks the queue can hold.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of tasks currently held or reserved.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether the queue currently holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer half of the admission queue, held exclusively by the dispatch loop.
pub struct QueueConsumer<D> {
    rx: mpsc::Receiver<SubmissionTask<D>>,
}

impl<D> QueueConsumer<D> {
    /// Remove and return the head task, waiting while the queue is empty.
    ///
    /// Returns `None` once every producer handle has been dropped and the
    /// backlog is drained. Safe to race against a shutdown signal: a task is
    /// either returned or left at the head, never lost.
    pub async fn dequeue(&mut self) -> Option<SubmissionTask<D>> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(seq: u64) -> SubmissionTask<u32> {
        SubmissionTask::new(seq as u32, format!("sig-{seq}"), seq)
    }

    #[tokio::test]
    async fn test_fifo_order_preserved() {
        let (producer, mut consumer) = admission_queue(8);

        for seq in 0..5 {
            producer.enqueue(task(seq)).await.unwrap();
        }

        for seq in 0..5 {
            let head = consumer.dequeue().await.unwrap();
            assert_eq!(head.seq, seq);
        }
    }

    #[tokio::test]
    async fn test_try_enqueue_full_hands_task_back() {
        let (producer, _consumer) = admission_queue(2);

        producer.try_enqueue(task(0)).unwrap();
        producer.try_enqueue(task(1)).unwrap();
        assert_eq!(producer.len(), 2);

        let rejected = producer.try_enqueue(task(2)).unwrap_err();
        match rejected {
            TryEnqueueError::Full(task) => {
                assert_eq!(task.seq, 2);
                assert_eq!(task.payload, 2);
            }
            TryEnqueueError::Closed(_) => panic!("queue is open"),
        }
    }

    #[tokio::test]
    async fn test_enqueue_closed_hands_task_back() {
        let (producer, consumer) = admission_queue(2);
        drop(consumer);

        let QueueClosed(task) = producer.enqueue(task(7)).await.unwrap_err();
        assert_eq!(task.seq, 7);
        assert_eq!(task.payload, 7);
    }

    #[tokio::test]
    async fn test_blocked_producer_released_by_dequeue() {
        let (producer, mut consumer) = admission_queue(1);
        producer.enqueue(task(0)).await.unwrap();

        let blocked = tokio::spawn({
            let producer = producer.clone();
            async move { producer.enqueue(task(1)).await }
        });

        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(!blocked.is_finished());

        let head = consumer.dequeue().await.unwrap();
        assert_eq!(head.seq, 0);

        blocked.await.unwrap().unwrap();
        let next = consumer.dequeue().await.unwrap();
        assert_eq!(next.seq, 1);
    }

    #[tokio::test]
    async fn test_depth_never_exceeds_capacity_under_load() {
        let (producer, mut consumer) = admission_queue(3);

        let mut handles = Vec::new();
        for p in 0..5u64 {
            let producer = producer.clone();
            handles.push(tokio::spawn(async move {
                for k in 0..5u64 {
                    producer.enqueue(task(p * 5 + k)).await.unwrap();
                }
            }));
        }

        for _ in 0..25 {
            assert!(producer.len() <= producer.capacity());
            assert!(consumer.dequeue().await.is_some());
            tokio::task::yield_now().await;
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(producer.is_empty());
    }

    #[tokio::test]
    async fn test_dequeue_returns_none_after_producers_drop() {
        let (producer, mut consumer) = admission_queue(2);
        producer.enqueue(task(0)).await.unwrap();
        drop(producer);

        assert_eq!(consumer.dequeue().await.unwrap().seq, 0);
        assert!(consumer.dequeue().await.is_none());
    }
}
