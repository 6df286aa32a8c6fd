//! Paced dispatch loop draining the admission queue.
//!
//! A fixed-delay pacer: the first firing happens immediately, and each later
//! firing is scheduled only after the previous dispatch attempt completes, so
//! a slow network call stretches the effective period instead of letting
//! firings overlap. One firing performs exactly one dequeue-and-execute cycle,
//! which makes the per-window request bound structural rather than counted.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::time;
use tracing::{error, info, warn};

use crate::api::{envelope, Transport};

use super::queue::{QueueConsumer, SubmissionTask};

/// Result of one dispatch cycle. Surfaced via logging; never persisted.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Whether the call returned a status in `[200, 300)`
    pub succeeded: bool,
    /// HTTP status code, absent when the transport failed outright
    pub status: Option<u16>,
    /// Response body on completion, error message otherwise
    pub detail: String,
}

/// The pacer/dispatcher: sole consumer of the admission queue.
pub struct Dispatcher<D> {
    queue: QueueConsumer<D>,
    transport: Arc<dyn Transport>,
    /// Fixed at construction from window / request limit, never recomputed.
    interval: Duration,
}

impl<D: Serialize> Dispatcher<D> {
    pub(crate) fn new(
        queue: QueueConsumer<D>,
        transport: Arc<dyn Transport>,
        interval: Duration,
    ) -> Self {
        Self {
            queue,
            transport,
            interval,
        }
    }

    /// Drive the dispatch loop until every producer handle is dropped and the
    /// backlog is drained.
    pub async fn run(self) {
        self.run_with_shutdown(std::future::pending()).await;
    }

    /// Drive the dispatch loop until the shutdown signal resolves.
    ///
    /// The signal stops future firings and wakes a dispatcher blocked on an
    /// empty queue; an in-flight network call completes on its own terms.
    pub async fn run_with_shutdown<F>(mut self, signal: F)
    where
        F: Future<Output = ()> + Send,
    {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Starting paced dispatch loop"
        );
        tokio::pin!(signal);

        loop {
            let task = tokio::select! {
                biased;
                _ = &mut signal => {
                    info!("Shutdown signal received, stopping dispatch loop");
                    break;
                }
                task = self.queue.dequeue() => match task {
                    Some(task) => task,
                    None => {
                        info!("All producers dropped and backlog drained, stopping dispatch loop");
                        break;
                    }
                },
            };

            self.dispatch(task).await;

            tokio::select! {
                biased;
                _ = &mut signal => {
                    info!("Shutdown signal received, stopping dispatch loop");
                    break;
                }
                _ = time::sleep(self.interval) => {}
            }
        }
    }

    /// Execute one dequeued task against the transport.
    ///
    /// Failures are contained here: they are logged and never break the loop
    /// or shift the pacing of later firings.
    async fn dispatch(&self, task: SubmissionTask<D>) -> DispatchOutcome {
        let seq = task.seq;
        let queued_ms = (Utc::now() - task.created_at).num_milliseconds();

        let body = match envelope::render(&task.payload, &task.signature) {
            Ok(body) => body,
            Err(e) => {
                error!(seq, error = %e, "Failed to encode document envelope, dropping task");
                return DispatchOutcome {
                    succeeded: false,
                    status: None,
                    detail: e.to_string(),
                };
            }
        };

        let outcome = match self.transport.send(body).await {
            Ok(response) => DispatchOutcome {
                succeeded: response.is_success(),
                status: Some(response.status),
                detail: response.body,
            },
            Err(e) => DispatchOutcome {
                succeeded: false,
                status: None,
                detail: e.to_string(),
            },
        };

        if outcome.succeeded {
            info!(
                seq,
                status = outcome.status,
                queued_ms,
                "Document submission accepted"
            );
        } else {
            warn!(
                seq,
                status = outcome.status,
                detail = %outcome.detail,
                queued_ms,
                "Document submission failed"
            );
        }

        outcome
    }
}
