use crossbeam_channel::{Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::{
    fmt, io,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering::Relaxed},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed number of OS threads executing jobs from a bounded queue.
///
/// Dropping the pool closes the queue and joins every thread, unless the pool was
/// [abandoned](WorkerPool::abandon) because some job never finished.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    threads: Vec<JoinHandle<()>>,
    shared: Arc<Shared>,
    abandoned: AtomicBool,
}

struct Shared {
    /// The number of jobs submitted but not yet returned.
    in_flight: Mutex<usize>,
    idle: Condvar,
}

impl Shared {
    fn finish_one(&self) {
        let mut in_flight = self.in_flight.lock();
        *in_flight -= 1;

        if *in_flight == 0 {
            self.idle.notify_all();
        }
    }
}

/// The reason a job was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The queue already holds as many jobs as it can track.
    Full,
    /// The pool is shutting down.
    Closed,
}

impl WorkerPool {
    pub fn new(threads: usize, queue_capacity: usize) -> io::Result<Self> {
        let (sender, receiver) = crossbeam_channel::bounded::<Job>(queue_capacity);
        let shared = Arc::new(Shared {
            in_flight: Mutex::new(0),
            idle: Condvar::new(),
        });

        let threads = (0..threads)
            .map(|index| {
                let receiver = receiver.clone();
                let shared = shared.clone();

                thread::Builder::new()
                    .name(format!("list-worker-{index}"))
                    .spawn(move || {
                        for job in receiver {
                            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                                tracing::warn!(worker = index, "job panicked");
                            }

                            shared.finish_one();
                        }
                    })
            })
            .collect::<io::Result<Vec<_>>>()?;

        tracing::debug!(threads = threads.len(), queue_capacity, "started worker pool");

        Ok(WorkerPool {
            sender: Some(sender),
            threads,
            shared,
            abandoned: AtomicBool::new(false),
        })
    }

    #[inline]
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads.len()
    }

    /// Queues a job without blocking.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Result<(), SubmitError> {
        let sender = self.sender.as_ref().ok_or(SubmitError::Closed)?;

        *self.shared.in_flight.lock() += 1;

        match sender.try_send(Box::new(job)) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.shared.finish_one();

                match err {
                    TrySendError::Full(_) => Err(SubmitError::Full),
                    TrySendError::Disconnected(_) => Err(SubmitError::Closed),
                }
            }
        }
    }

    /// Returns the number of jobs that have been submitted but have not finished yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.shared.in_flight.lock()
    }

    /// Blocks until every submitted job has finished.
    pub fn wait_idle(&self) {
        let mut in_flight = self.shared.in_flight.lock();

        while *in_flight != 0 {
            self.shared.idle.wait(&mut in_flight);
        }

        self.abandoned.store(false, Relaxed);
    }

    /// Blocks until every submitted job has finished or `deadline` passes. Returns `true` if the
    /// pool went idle.
    pub fn wait_idle_until(&self, deadline: Instant) -> bool {
        let mut in_flight = self.shared.in_flight.lock();

        while *in_flight != 0 {
            if self.shared.idle.wait_until(&mut in_flight, deadline).timed_out() && *in_flight != 0
            {
                return false;
            }
        }

        self.abandoned.store(false, Relaxed);

        true
    }

    /// Marks the pool as holding jobs that may never finish, so that dropping it detaches the
    /// threads instead of joining them.
    pub fn abandon(&self) {
        self.abandoned.store(true, Relaxed);
    }

    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue lets the threads run out of jobs.
        drop(self.sender.take());

        // Once everything drained there is nothing left that could keep a join from returning.
        if self.is_abandoned() && self.in_flight() != 0 {
            tracing::warn!(
                in_flight = self.in_flight(),
                "detaching worker pool with unfinished jobs"
            );
            return;
        }

        for thread in self.threads.drain(..) {
            // Job panics are caught inside the thread, so the join cannot fail.
            let _ = thread.join();
        }
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads.len())
            .field("in_flight", &self.in_flight())
            .field("abandoned", &self.is_abandoned())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn runs_every_job() {
        let pool = WorkerPool::new(4, 16).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..16 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Relaxed);
            })
            .unwrap();
        }

        pool.wait_idle();

        assert_eq!(counter.load(Relaxed), 16);
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn rejects_when_full() {
        let pool = WorkerPool::new(1, 1).unwrap();
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(0);

        // Occupy the only thread, then fill the only queue slot.
        pool.submit(move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        })
        .unwrap();
        started_rx.recv().unwrap();
        pool.submit(|| {}).unwrap();

        assert_eq!(pool.submit(|| {}), Err(SubmitError::Full));
        assert_eq!(pool.in_flight(), 2);

        release_tx.send(()).unwrap();
        pool.wait_idle();
    }

    #[test]
    fn draining_clears_abandonment() {
        let pool = WorkerPool::new(1, 1).unwrap();
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);

        pool.submit(move || release_rx.recv().unwrap()).unwrap();
        pool.abandon();

        let deadline = Instant::now() + std::time::Duration::from_millis(20);
        assert!(!pool.wait_idle_until(deadline));
        assert!(pool.is_abandoned());

        release_tx.send(()).unwrap();
        pool.wait_idle();

        assert!(!pool.is_abandoned());
    }

    #[test]
    fn survives_panicking_jobs() {
        let pool = WorkerPool::new(1, 2).unwrap();
        let (tx, rx) = crossbeam_channel::bounded(1);

        pool.submit(|| panic!("boom")).unwrap();
        pool.submit(move || tx.send(7).unwrap()).unwrap();

        assert_eq!(rx.recv(), Ok(7));
        pool.wait_idle();
    }
}
