use crate::{
    config::BenchConfig,
    error::{BenchError, TaskFault},
    list::{ConcurrentList, Variant},
    pool::{SubmitError, WorkerPool},
    task::{self, Operation, WorkerReport},
};
use core::fmt;
use crossbeam_channel::RecvTimeoutError;
use parking_lot::{Condvar, Mutex};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::{Duration, Instant},
};

/// The timing of one run: every worker of one operation against one list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub variant: Variant,
    pub operation: Operation,
    pub workers: usize,
    /// The sum of every worker's elapsed time, each truncated to whole milliseconds.
    pub total_millis: u64,
    /// The exact sum of every worker's elapsed time.
    pub total: Duration,
    /// The number of gets, pushes or traversals performed across all workers.
    pub operations: u64,
    /// The number of elements visited by traversals across all workers.
    pub visited: u64,
    pub len_before: usize,
    pub len_after: usize,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} method cost time is {}",
            self.variant, self.operation, self.total_millis,
        )
    }
}

/// Holds workers back until every one of them has been submitted.
struct StartGate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl StartGate {
    fn new() -> Self {
        StartGate {
            open: Mutex::new(false),
            opened: Condvar::new(),
        }
    }

    fn wait(&self) {
        let mut open = self.open.lock();

        while !*open {
            self.opened.wait(&mut open);
        }
    }

    fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }
}

type WorkerResult = (usize, Result<WorkerReport, TaskFault>);

/// Runs `config.workers` workers that all repeat `operation` against `list`.
pub fn run(
    pool: &WorkerPool,
    list: &Arc<dyn ConcurrentList>,
    config: &BenchConfig,
    operation: Operation,
) -> Result<RunReport, BenchError> {
    run_with(pool, list, config, operation, |_| operation)
}

/// Runs `config.workers` workers against `list`, worker `i` repeating `workload(i)`.
///
/// `label` is the operation the report is filed under. Every worker is submitted before any of
/// them starts its clock. The first worker fault aborts the run; when `config.timeout` is set
/// and elapses first, the pool is abandoned and the run fails with [`BenchError::Timeout`].
pub fn run_with(
    pool: &WorkerPool,
    list: &Arc<dyn ConcurrentList>,
    config: &BenchConfig,
    label: Operation,
    workload: impl Fn(usize) -> Operation,
) -> Result<RunReport, BenchError> {
    config.validate()?;

    let in_flight = pool.in_flight();

    if in_flight != 0 {
        return Err(BenchError::PoolBusy { in_flight });
    }

    let variant = list.variant();
    let workers = config.workers;
    let len_before = list.len();
    let gate = Arc::new(StartGate::new());
    // One slot per worker, so no worker ever blocks on reporting.
    let (sender, receiver) = crossbeam_channel::bounded::<WorkerResult>(workers);

    for worker in 0..workers {
        let list = list.clone();
        let worker_gate = gate.clone();
        let sender = sender.clone();
        let operation = workload(worker);
        let dataset_size = config.dataset_size;
        let operations = config.operations_per_worker;

        let submitted = pool.submit(move || {
            worker_gate.wait();

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                task::execute(&*list, operation, dataset_size, operations)
            }))
            .unwrap_or_else(|payload| Err(TaskFault::Panicked(panic_message(&*payload))));

            if let Ok(report) = &result {
                tracing::debug!(
                    worker,
                    %variant,
                    %operation,
                    elapsed = ?report.elapsed,
                    "worker finished"
                );
            }

            // The coordinator is gone only if it gave up on the run.
            let _ = sender.send((worker, result));
        });

        if let Err(err) = submitted {
            // Let whatever was submitted run to completion.
            gate.open();

            return Err(match err {
                SubmitError::Full => BenchError::Submission { worker },
                SubmitError::Closed => BenchError::PoolClosed,
            });
        }
    }

    drop(sender);
    gate.open();

    // A timeout too large to represent as a deadline is as good as none.
    let deadline = config
        .timeout
        .and_then(|timeout| Some((timeout, Instant::now().checked_add(timeout)?)));
    let mut total = Duration::ZERO;
    let mut total_millis = 0u64;
    let mut operations = 0u64;
    let mut visited = 0u64;

    for completed in 0..workers {
        let received = match deadline {
            Some((_, deadline)) => receiver.recv_deadline(deadline),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        let (worker, result) = match received {
            Ok(message) => message,
            Err(RecvTimeoutError::Timeout) => {
                let timeout = deadline.map_or(Duration::ZERO, |(timeout, _)| timeout);
                tracing::warn!(
                    %variant,
                    operation = %label,
                    ?timeout,
                    completed,
                    "run timed out"
                );
                pool.abandon();

                return Err(BenchError::Timeout {
                    variant,
                    operation: label,
                    timeout,
                    completed,
                    workers,
                });
            }
            Err(RecvTimeoutError::Disconnected) => return Err(BenchError::PoolClosed),
        };

        match result {
            Ok(report) => {
                total += report.elapsed;
                total_millis += u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX);
                operations += report.operations;
                visited += report.visited;
            }
            Err(source) => {
                tracing::warn!(worker, %variant, %source, "worker failed");

                // Siblings may be stuck; don't let them outlive the deadline in the pool's drop.
                if let Some((_, deadline)) = deadline {
                    if !pool.wait_idle_until(deadline) {
                        pool.abandon();
                    }
                }

                return Err(BenchError::Task {
                    worker,
                    variant,
                    operation: workload(worker),
                    source,
                });
            }
        }
    }

    // Every worker has reported, but the pool must be fully drained before the next run.
    pool.wait_idle();

    let report = RunReport {
        variant,
        operation: label,
        workers,
        total_millis,
        total,
        operations,
        visited,
        len_before,
        len_after: list.len(),
    };

    tracing::info!(
        %variant,
        operation = %label,
        workers,
        total_millis,
        operations,
        "run finished"
    );

    Ok(report)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
