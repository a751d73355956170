use crate::error::BenchError;
use std::time::Duration;

/// The number of workers contending on a list during one run.
pub const WORKER_COUNT: usize = 64;

/// The number of elements every list starts out with.
pub const DATASET_SIZE: usize = 10_000;

/// Run parameters, constant for a whole benchmark.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    pub workers: usize,
    pub dataset_size: usize,
    /// The number of gets, pushes or full traversals each worker performs.
    pub operations_per_worker: usize,
    /// The number of jobs the worker pool queue can hold before submissions are rejected.
    pub queue_capacity: usize,
    /// How long a run may take before it is reported as stuck. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            workers: WORKER_COUNT,
            dataset_size: DATASET_SIZE,
            operations_per_worker: DATASET_SIZE,
            queue_capacity: WORKER_COUNT,
            timeout: None,
        }
    }
}

impl BenchConfig {
    /// Sets the worker count, growing the queue along with it if needed.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.queue_capacity = self.queue_capacity.max(workers);
        self
    }

    /// Sets the dataset size and, like the defaults, the per-worker operation count.
    #[must_use]
    pub fn with_dataset_size(mut self, dataset_size: usize) -> Self {
        self.dataset_size = dataset_size;
        self.operations_per_worker = dataset_size;
        self
    }

    #[must_use]
    pub fn with_operations_per_worker(mut self, operations_per_worker: usize) -> Self {
        self.operations_per_worker = operations_per_worker;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.workers == 0 {
            return Err(BenchError::Config("worker count must be non-zero".into()));
        }

        // Reads and writes pick their index from `0..dataset_size`.
        if self.dataset_size == 0 {
            return Err(BenchError::Config("dataset size must be non-zero".into()));
        }

        if self.dataset_size > i32::MAX as usize {
            return Err(BenchError::Config(format!(
                "dataset size {} does not fit the element type",
                self.dataset_size,
            )));
        }

        if self.queue_capacity < self.workers {
            return Err(BenchError::Config(format!(
                "queue capacity {} cannot hold {} workers",
                self.queue_capacity, self.workers,
            )));
        }

        Ok(())
    }
}
