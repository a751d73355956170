use crate::{error::TaskFault, list::ConcurrentList};
use core::fmt;
use rand::Rng;
use std::{
    hint::black_box,
    time::{Duration, Instant},
};

/// The operation a worker repeats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Indexed reads at one random position.
    Get,
    /// Appends of one random value.
    Push,
    /// Full sequential traversals.
    Iter,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Get, Operation::Push, Operation::Iter];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Push => "push",
            Operation::Iter => "iter",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// What one worker measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    pub operation: Operation,
    pub elapsed: Duration,
    /// The number of gets, pushes or full traversals that completed.
    pub operations: u64,
    /// The number of elements visited by traversals.
    pub visited: u64,
    /// Folded from every value read, so that the reads cannot be optimized out.
    pub checksum: u64,
}

/// Performs `operations` repetitions of `operation` against `list` and times them.
///
/// Reads and writes pick their index from `0..dataset_size` once, before the clock starts, and
/// fail with [`TaskFault::EmptyDataset`] if there is nothing to pick from.
pub fn execute(
    list: &dyn ConcurrentList,
    operation: Operation,
    dataset_size: usize,
    operations: usize,
) -> Result<WorkerReport, TaskFault> {
    if dataset_size == 0 && operation != Operation::Iter {
        return Err(TaskFault::EmptyDataset);
    }

    match operation {
        Operation::Get => get(list, random_index(dataset_size), operations),
        Operation::Push => push(list, random_index(dataset_size), operations),
        Operation::Iter => iter(list, operations),
    }
}

fn random_index(dataset_size: usize) -> usize {
    rand::thread_rng().gen_range(0..dataset_size)
}

fn get(
    list: &dyn ConcurrentList,
    index: usize,
    operations: usize,
) -> Result<WorkerReport, TaskFault> {
    let mut checksum = 0;
    let mut performed = 0;
    let start = Instant::now();

    for _ in 0..operations {
        checksum = hash(checksum, black_box(list.get(black_box(index))?));
        performed += 1;
    }

    Ok(WorkerReport {
        operation: Operation::Get,
        elapsed: start.elapsed(),
        operations: performed,
        visited: 0,
        checksum,
    })
}

fn push(
    list: &dyn ConcurrentList,
    index: usize,
    operations: usize,
) -> Result<WorkerReport, TaskFault> {
    // `BenchConfig::validate` bounds the dataset size by `i32::MAX`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let value = index as i32;
    let mut performed = 0;
    let start = Instant::now();

    for _ in 0..operations {
        list.push(black_box(value));
        performed += 1;
    }

    Ok(WorkerReport {
        operation: Operation::Push,
        elapsed: start.elapsed(),
        operations: performed,
        visited: 0,
        checksum: 0,
    })
}

fn iter(list: &dyn ConcurrentList, operations: usize) -> Result<WorkerReport, TaskFault> {
    let mut checksum = 0;
    let mut visited = 0;
    let mut performed = 0;
    let mut visit = |value: i32| {
        checksum = hash(checksum, black_box(value));
        visited += 1;
    };
    let start = Instant::now();

    if list.iteration_requires_external_lock() {
        let guard = list.exclusive().ok_or(TaskFault::MissingExclusiveLock)?;

        for _ in 0..operations {
            guard.try_for_each(&mut visit)?;
            performed += 1;
        }
    } else {
        for _ in 0..operations {
            list.try_for_each(&mut visit)?;
            performed += 1;
        }
    }

    let elapsed = start.elapsed();

    Ok(WorkerReport {
        operation: Operation::Iter,
        elapsed,
        operations: performed,
        visited,
        checksum,
    })
}

#[allow(clippy::cast_sign_loss)]
#[inline(always)]
fn hash(state: u64, value: i32) -> u64 {
    state.wrapping_mul(31).wrapping_add(value as u32 as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cow::CopyOnWriteList, error::ListError, locked::LockedList, sync_vec::SyncVec};

    #[test]
    fn get_reads_the_same_index() {
        let list = LockedList::from_vec(vec![7; 16]);
        let report = execute(&list, Operation::Get, 16, 100).unwrap();

        assert_eq!(report.operation, Operation::Get);
        assert_eq!(report.operations, 100);
        assert_ne!(report.checksum, 0);
    }

    #[test]
    fn push_appends_the_index() {
        let list = CopyOnWriteList::new();
        let report = execute(&list, Operation::Push, 1, 25).unwrap();

        assert_eq!(report.operations, 25);
        assert_eq!(list.to_vec(), [0; 25]);
    }

    #[test]
    fn iter_checksum_matches_across_variants() {
        let values = vec![3, 1, 4, 1, 5, 9, 2, 6];
        let cow = CopyOnWriteList::from_vec(values.clone());
        let locked = LockedList::from_vec(values.clone());
        let sync_vec = SyncVec::from_vec(values.clone());
        let lists: [&dyn ConcurrentList; 3] = [&cow, &locked, &sync_vec];

        let checksums: Vec<_> = lists
            .iter()
            .map(|list| execute(*list, Operation::Iter, values.len(), 3).unwrap().checksum)
            .collect();

        assert_eq!(checksums[0], checksums[1]);
        assert_eq!(checksums[1], checksums[2]);
    }

    #[test]
    fn iter_visits_every_element_under_the_lock() {
        let locked = LockedList::from_vec(vec![1; 12]);
        let sync_vec = SyncVec::from_vec(vec![1; 12]);
        let lists: [&dyn ConcurrentList; 2] = [&locked, &sync_vec];

        for list in lists {
            let report = execute(list, Operation::Iter, 12, 5).unwrap();

            assert_eq!(report.operations, 5);
            assert_eq!(report.visited, 5 * 12);
        }
    }

    #[test]
    fn empty_dataset_is_a_fault() {
        let list = LockedList::new();

        assert!(matches!(
            execute(&list, Operation::Get, 0, 1),
            Err(TaskFault::EmptyDataset),
        ));
        assert!(matches!(
            execute(&list, Operation::Push, 0, 1),
            Err(TaskFault::EmptyDataset),
        ));
        assert_eq!(execute(&list, Operation::Iter, 0, 3).unwrap().operations, 3);
    }

    #[test]
    fn get_out_of_bounds_is_a_fault() {
        let list = SyncVec::new();
        let result = execute(&list, Operation::Get, 1, 1);

        assert!(matches!(
            result,
            Err(TaskFault::List(ListError::IndexOutOfBounds { index: 0, len: 0 })),
        ));
    }
}
