//! Contended throughput of concurrent list strategies.
//!
//! Three lists share one capability set (indexed reads, appends and full traversals) and differ
//! only in how they synchronize:
//!
//! * [`CopyOnWriteList`] publishes a new immutable snapshot on every append.
//! * [`LockedList`] takes one mutex on every call, but not across a traversal.
//! * [`SyncVec`] is the legacy coarse-lock vector with a fail-fast cursor.
//!
//! A scenario builds all three from one random [`Dataset`] and has a fixed pool of workers
//! hammer each of them with the same operation, summing every worker's elapsed time into one
//! [`RunReport`] per list.
#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod cow;
pub mod error;
pub mod fixture;
pub mod list;
pub mod locked;
pub mod logging;
pub mod pool;
pub mod run;
pub mod scenario;
pub mod sync_vec;
pub mod task;

pub use config::{BenchConfig, DATASET_SIZE, WORKER_COUNT};
pub use cow::{CopyOnWriteList, Snapshot};
pub use error::{BenchError, ListError, TaskFault};
pub use fixture::{Dataset, Fixture};
pub use list::{ConcurrentList, Exclusive, Variant};
pub use locked::LockedList;
pub use pool::WorkerPool;
pub use run::{run, run_with, RunReport};
pub use scenario::{run_all, run_scenario, ScenarioReport};
pub use sync_vec::SyncVec;
pub use task::{Operation, WorkerReport};
