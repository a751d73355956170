use crate::{
    error::ListError,
    list::{ConcurrentList, Elements, Exclusive, ExclusiveKind, Variant},
};
use core::fmt;
use parking_lot::Mutex;

/// A plain vector wrapped so that every call takes one shared mutex.
///
/// Only individual calls are atomic. An unlocked traversal reads one element per lock
/// acquisition and fails fast if another thread appends in between; a consistent traversal must
/// hold [`LockedList::lock`] for its whole duration. The mutex is not reentrant, so nothing may
/// call back into the list while that guard is held.
pub struct LockedList {
    inner: Mutex<Elements>,
}

impl LockedList {
    #[must_use]
    pub fn new() -> Self {
        LockedList::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(values: Vec<i32>) -> Self {
        LockedList {
            inner: Mutex::new(Elements::new(values)),
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<i32, ListError> {
        self.inner.lock().get(index)
    }

    #[inline]
    pub fn push(&self, value: i32) {
        self.inner.lock().push(value);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes the list's mutex until the returned guard is dropped.
    #[must_use]
    pub fn lock(&self) -> Exclusive<'_> {
        Exclusive::new(ExclusiveKind::Locked(self.inner.lock()))
    }
}

impl Default for LockedList {
    fn default() -> Self {
        LockedList::new()
    }
}

impl ConcurrentList for LockedList {
    fn variant(&self) -> Variant {
        Variant::Locked
    }

    fn get(&self, index: usize) -> Result<i32, ListError> {
        LockedList::get(self, index)
    }

    fn push(&self, value: i32) {
        LockedList::push(self, value);
    }

    fn len(&self) -> usize {
        LockedList::len(self)
    }

    fn to_vec(&self) -> Vec<i32> {
        self.inner.lock().values.clone()
    }

    fn iteration_requires_external_lock(&self) -> bool {
        true
    }

    fn try_for_each(&self, f: &mut dyn FnMut(i32)) -> Result<(), ListError> {
        let expected_mod_count = self.inner.lock().mod_count;
        let mut index = 0;

        loop {
            let value = {
                let elements = self.inner.lock();

                if elements.mod_count != expected_mod_count {
                    return Err(ListError::ConcurrentModification);
                }

                match elements.values.get(index) {
                    Some(&value) => value,
                    None => return Ok(()),
                }
            };

            // The callback runs unlocked, the same as a caller-driven iteration would.
            f(value);
            index += 1;
        }
    }

    fn exclusive(&self) -> Option<Exclusive<'_>> {
        Some(self.lock())
    }
}

impl fmt::Debug for LockedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elements = self.inner.lock();

        f.debug_struct("LockedList")
            .field("len", &elements.values.len())
            .field("mod_count", &elements.mod_count)
            .finish_non_exhaustive()
    }
}
