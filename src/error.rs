use crate::{list::Variant, task::Operation};
use std::{io, time::Duration};
use thiserror::Error;

/// An error returned by a list operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("index {index} is out of bounds for a list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The list was structurally modified while a fail-fast cursor was walking it.
    #[error("list was modified during traversal")]
    ConcurrentModification,
}

/// The reason a single worker failed.
#[derive(Debug, Error)]
pub enum TaskFault {
    #[error(transparent)]
    List(#[from] ListError),

    #[error("list requires an external lock for traversal but does not provide one")]
    MissingExclusiveLock,

    #[error("cannot pick an index from an empty dataset")]
    EmptyDataset,

    #[error("task panicked: {0}")]
    Panicked(String),
}

/// An error that aborts a run, and with it the rest of its scenario.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("worker {worker} failed during {variant} {operation}: {source}")]
    Task {
        worker: usize,
        variant: Variant,
        operation: Operation,
        #[source]
        source: TaskFault,
    },

    #[error("failed to submit worker {worker}: the job queue is full")]
    Submission { worker: usize },

    #[error("worker pool has shut down")]
    PoolClosed,

    #[error("worker pool still has {in_flight} jobs in flight from a previous run")]
    PoolBusy { in_flight: usize },

    #[error(
        "{variant} {operation} run timed out after {timeout:?} with {completed} of {workers} \
         workers done"
    )]
    Timeout {
        variant: Variant,
        operation: Operation,
        timeout: Duration,
        completed: usize,
        workers: usize,
    },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
