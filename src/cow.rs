use crate::{
    error::ListError,
    list::{ConcurrentList, Exclusive, Variant},
};
use core::{fmt, ops::Deref};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::Arc;

/// A list where every append publishes a fresh copy of the backing storage.
///
/// Readers clone the current snapshot pointer under a briefly held read lock and then work on
/// an immutable array, so traversals never block on, or observe part of, a concurrent append.
/// Writers are serialized by the upgradable read lock: copying happens while readers keep going,
/// and only the final pointer swap excludes them.
pub struct CopyOnWriteList {
    current: RwLock<Arc<Vec<i32>>>,
}

impl CopyOnWriteList {
    #[must_use]
    pub fn new() -> Self {
        CopyOnWriteList::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(values: Vec<i32>) -> Self {
        CopyOnWriteList {
            current: RwLock::new(Arc::new(values)),
        }
    }

    /// Returns the contents as of now. Later appends are not reflected in the snapshot.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.current.read().clone())
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<i32, ListError> {
        let current = self.current.read();

        current
            .get(index)
            .copied()
            .ok_or(ListError::IndexOutOfBounds {
                index,
                len: current.len(),
            })
    }

    pub fn push(&self, value: i32) {
        let current = self.current.upgradable_read();

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend_from_slice(&current);
        next.push(value);

        let mut current = RwLockUpgradableReadGuard::upgrade(current);
        *current = Arc::new(next);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CopyOnWriteList {
    fn default() -> Self {
        CopyOnWriteList::new()
    }
}

impl ConcurrentList for CopyOnWriteList {
    fn variant(&self) -> Variant {
        Variant::CopyOnWrite
    }

    fn get(&self, index: usize) -> Result<i32, ListError> {
        CopyOnWriteList::get(self, index)
    }

    fn push(&self, value: i32) {
        CopyOnWriteList::push(self, value);
    }

    fn len(&self) -> usize {
        CopyOnWriteList::len(self)
    }

    fn to_vec(&self) -> Vec<i32> {
        self.snapshot().to_vec()
    }

    fn iteration_requires_external_lock(&self) -> bool {
        false
    }

    fn try_for_each(&self, f: &mut dyn FnMut(i32)) -> Result<(), ListError> {
        self.snapshot().iter().copied().for_each(f);

        Ok(())
    }

    fn exclusive(&self) -> Option<Exclusive<'_>> {
        None
    }
}

impl fmt::Debug for CopyOnWriteList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOnWriteList")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// An immutable view of a [`CopyOnWriteList`] at one point in time.
#[derive(Clone)]
pub struct Snapshot(Arc<Vec<i32>>);

impl Deref for Snapshot {
    type Target = [i32];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_ignores_later_appends() {
        let list = CopyOnWriteList::from_vec(vec![1, 2]);
        let snapshot = list.snapshot();

        list.push(3);

        assert_eq!(&*snapshot, [1, 2]);
        assert_eq!(&*list.snapshot(), [1, 2, 3]);
    }

    #[test]
    fn traversal_during_push_sees_old_contents() {
        let list = CopyOnWriteList::from_vec(vec![4, 5]);
        let mut seen = Vec::new();

        list.try_for_each(&mut |value| {
            list.push(value);
            seen.push(value);
        })
        .unwrap();

        assert_eq!(seen, [4, 5]);
        assert_eq!(list.to_vec(), [4, 5, 4, 5]);
    }

    #[test]
    fn no_exclusive_lock() {
        let list = CopyOnWriteList::new();

        assert!(!list.iteration_requires_external_lock());
        assert!(list.exclusive().is_none());
        assert_eq!(
            list.get(0),
            Err(ListError::IndexOutOfBounds { index: 0, len: 0 }),
        );
    }
}
