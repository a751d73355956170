#![allow(dead_code)]

use list_contention::{ConcurrentList, Exclusive, ListError, Variant};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering::Relaxed},
        Arc,
    },
    thread,
    time::Duration,
};

/// Counts every call made through it before forwarding to the wrapped list.
pub struct CountingList {
    inner: Arc<dyn ConcurrentList>,
    pub gets: AtomicU64,
    pub pushes: AtomicU64,
    pub traversals: AtomicU64,
}

impl CountingList {
    pub fn new(inner: Arc<dyn ConcurrentList>) -> Arc<Self> {
        Arc::new(CountingList {
            inner,
            gets: AtomicU64::new(0),
            pushes: AtomicU64::new(0),
            traversals: AtomicU64::new(0),
        })
    }

    pub fn gets(&self) -> u64 {
        self.gets.load(Relaxed)
    }

    pub fn pushes(&self) -> u64 {
        self.pushes.load(Relaxed)
    }

    pub fn traversals(&self) -> u64 {
        self.traversals.load(Relaxed)
    }
}

impl ConcurrentList for CountingList {
    fn variant(&self) -> Variant {
        self.inner.variant()
    }

    fn get(&self, index: usize) -> Result<i32, ListError> {
        self.gets.fetch_add(1, Relaxed);
        self.inner.get(index)
    }

    fn push(&self, value: i32) {
        self.pushes.fetch_add(1, Relaxed);
        self.inner.push(value);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn to_vec(&self) -> Vec<i32> {
        self.inner.to_vec()
    }

    fn iteration_requires_external_lock(&self) -> bool {
        self.inner.iteration_requires_external_lock()
    }

    fn try_for_each(&self, f: &mut dyn FnMut(i32)) -> Result<(), ListError> {
        self.traversals.fetch_add(1, Relaxed);
        self.inner.try_for_each(f)
    }

    fn exclusive(&self) -> Option<Exclusive<'_>> {
        self.inner.exclusive()
    }
}

/// What a [`FaultyList`] does wrong.
#[derive(Clone, Copy, Debug)]
pub enum Fault {
    /// `push` panics.
    PanicOnPush,
    /// `get` sleeps for the given time.
    SlowGet(Duration),
    /// Claims to need an external lock for traversal but offers none.
    NoExclusiveLock,
    /// `push` panics and `get` sleeps for the given time.
    StalledReadsFailingWrites(Duration),
}

pub struct FaultyList {
    pub fault: Fault,
    pub values: Vec<i32>,
}

impl ConcurrentList for FaultyList {
    fn variant(&self) -> Variant {
        Variant::Locked
    }

    fn get(&self, index: usize) -> Result<i32, ListError> {
        if let Fault::SlowGet(delay) | Fault::StalledReadsFailingWrites(delay) = self.fault {
            thread::sleep(delay);
        }

        self.values.get(index).copied().ok_or(ListError::IndexOutOfBounds {
            index,
            len: self.values.len(),
        })
    }

    fn push(&self, _value: i32) {
        if let Fault::PanicOnPush | Fault::StalledReadsFailingWrites(_) = self.fault {
            panic!("push is not supported");
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn to_vec(&self) -> Vec<i32> {
        self.values.clone()
    }

    fn iteration_requires_external_lock(&self) -> bool {
        matches!(self.fault, Fault::NoExclusiveLock)
    }

    fn try_for_each(&self, f: &mut dyn FnMut(i32)) -> Result<(), ListError> {
        self.values.iter().copied().for_each(f);

        Ok(())
    }

    fn exclusive(&self) -> Option<Exclusive<'_>> {
        None
    }
}
