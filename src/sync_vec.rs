use crate::{
    error::ListError,
    list::{ConcurrentList, Elements, Exclusive, ExclusiveKind, Variant},
};
use core::{cell::RefCell, fmt};
use parking_lot::ReentrantMutex;

/// The legacy globally-synchronized vector.
///
/// Every call takes the same reentrant lock. Its cursor takes the lock once per step rather than
/// for the whole traversal, so a traversal racing with appends fails with
/// [`ListError::ConcurrentModification`] instead of returning a consistent view. Holding
/// [`SyncVec::lock`] around the traversal makes it consistent; because the lock is reentrant the
/// cursor can still be used while it is held.
pub struct SyncVec {
    inner: ReentrantMutex<RefCell<Elements>>,
}

impl SyncVec {
    #[must_use]
    pub fn new() -> Self {
        SyncVec::from_vec(Vec::new())
    }

    #[must_use]
    pub fn from_vec(values: Vec<i32>) -> Self {
        SyncVec {
            inner: ReentrantMutex::new(RefCell::new(Elements::new(values))),
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<i32, ListError> {
        self.inner.lock().borrow().get(index)
    }

    #[inline]
    pub fn push(&self, value: i32) {
        self.inner.lock().borrow_mut().push(value);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().borrow().values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a fail-fast cursor positioned at the start of the vector.
    #[must_use]
    pub fn cursor(&self) -> Cursor<'_> {
        let expected_mod_count = self.inner.lock().borrow().mod_count;

        Cursor {
            list: self,
            index: 0,
            expected_mod_count,
            done: false,
        }
    }

    /// Takes the vector's lock until the returned guard is dropped.
    #[must_use]
    pub fn lock(&self) -> Exclusive<'_> {
        Exclusive::new(ExclusiveKind::SyncVec {
            list: self,
            _guard: self.inner.lock(),
        })
    }
}

impl Default for SyncVec {
    fn default() -> Self {
        SyncVec::new()
    }
}

impl ConcurrentList for SyncVec {
    fn variant(&self) -> Variant {
        Variant::SyncVec
    }

    fn get(&self, index: usize) -> Result<i32, ListError> {
        SyncVec::get(self, index)
    }

    fn push(&self, value: i32) {
        SyncVec::push(self, value);
    }

    fn len(&self) -> usize {
        SyncVec::len(self)
    }

    fn to_vec(&self) -> Vec<i32> {
        self.inner.lock().borrow().values.clone()
    }

    fn iteration_requires_external_lock(&self) -> bool {
        true
    }

    fn try_for_each(&self, f: &mut dyn FnMut(i32)) -> Result<(), ListError> {
        for value in self.cursor() {
            f(value?);
        }

        Ok(())
    }

    fn exclusive(&self) -> Option<Exclusive<'_>> {
        Some(self.lock())
    }
}

impl fmt::Debug for SyncVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.lock();
        let elements = guard.borrow();

        f.debug_struct("SyncVec")
            .field("len", &elements.values.len())
            .field("mod_count", &elements.mod_count)
            .finish_non_exhaustive()
    }
}

/// A cursor over a [`SyncVec`] that locks once per element.
///
/// Yields [`ListError::ConcurrentModification`] once and then stops if the vector was modified
/// after the cursor was created.
pub struct Cursor<'a> {
    list: &'a SyncVec,
    index: usize,
    expected_mod_count: u64,
    done: bool,
}

impl Iterator for Cursor<'_> {
    type Item = Result<i32, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let guard = self.list.inner.lock();
        let elements = guard.borrow();

        if elements.mod_count != self.expected_mod_count {
            self.done = true;
            return Some(Err(ListError::ConcurrentModification));
        }

        let value = elements.values.get(self.index).copied();

        match value {
            Some(value) => {
                self.index += 1;
                Some(Ok(value))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("expected_mod_count", &self.expected_mod_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_fails_fast_after_push() {
        let vec = SyncVec::from_vec(vec![1, 2, 3]);
        let mut cursor = vec.cursor();

        assert_eq!(cursor.next(), Some(Ok(1)));
        vec.push(4);
        assert_eq!(cursor.next(), Some(Err(ListError::ConcurrentModification)));
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn traversal_reenters_held_lock() {
        let vec = SyncVec::from_vec(vec![5, 6, 7]);
        let guard = vec.lock();
        let mut seen = Vec::new();

        guard.try_for_each(|value| seen.push(value)).unwrap();

        // Plain calls re-enter the lock from the owning thread too.
        assert_eq!(vec.get(1), Ok(6));
        assert_eq!(guard.len(), 3);
        assert_eq!(seen, [5, 6, 7]);
    }

    #[test]
    fn get_out_of_bounds() {
        let vec = SyncVec::new();

        assert!(vec.is_empty());
        assert_eq!(
            vec.get(0),
            Err(ListError::IndexOutOfBounds { index: 0, len: 0 }),
        );
    }
}
