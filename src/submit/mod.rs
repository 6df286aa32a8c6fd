//! Paced submission pipeline: admission queue, dispatch loop, client facade.

mod client;
mod dispatcher;
mod queue;

pub use client::SubmissionClient;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use queue::{
    admission_queue, QueueClosed, QueueConsumer, QueueProducer, SubmissionTask, TryEnqueueError,
};
