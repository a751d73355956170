use crate::{error::ListError, sync_vec::SyncVec};
use core::{cell::RefCell, fmt};
use parking_lot::{MutexGuard, ReentrantMutexGuard};

/// The concurrency strategy of a list under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Every append publishes a new immutable snapshot.
    CopyOnWrite,
    /// A plain vector behind a single mutex taken by every call.
    Locked,
    /// The legacy coarse-lock vector, reentrant and fail-fast.
    SyncVec,
}

impl Variant {
    /// All variants in the order they are measured.
    pub const ALL: [Variant; 3] = [Variant::CopyOnWrite, Variant::Locked, Variant::SyncVec];

    /// The label used in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Variant::CopyOnWrite => "CopyOnWriteList",
            Variant::Locked => "LockedList",
            Variant::SyncVec => "SyncVec",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A sequence of integers that can be shared by any number of threads.
///
/// Implementations only differ in how they synchronize. Individual calls are always safe to make
/// concurrently; whether a *traversal* is consistent under concurrent appends is reported by
/// [`iteration_requires_external_lock`], and callers that need a consistent traversal of a list
/// that says `true` must hold the guard returned by [`exclusive`] for its whole duration.
///
/// [`iteration_requires_external_lock`]: ConcurrentList::iteration_requires_external_lock
/// [`exclusive`]: ConcurrentList::exclusive
pub trait ConcurrentList: Send + Sync {
    fn variant(&self) -> Variant;

    fn get(&self, index: usize) -> Result<i32, ListError>;

    fn push(&self, value: i32);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the current contents out of the list.
    fn to_vec(&self) -> Vec<i32>;

    /// Returns `true` if traversing without [`ConcurrentList::exclusive`] can fail or observe
    /// torn state while other threads append.
    fn iteration_requires_external_lock(&self) -> bool;

    /// Visits every element relying only on the list's own synchronization.
    fn try_for_each(&self, f: &mut dyn FnMut(i32)) -> Result<(), ListError>;

    /// Takes the list's lock for a composite operation, or `None` if the list has none to offer.
    fn exclusive(&self) -> Option<Exclusive<'_>>;
}

/// The element storage shared by the lock-based variants.
#[derive(Debug, Default)]
pub(crate) struct Elements {
    pub values: Vec<i32>,
    /// Bumped on every structural modification, checked by fail-fast cursors.
    pub mod_count: u64,
}

impl Elements {
    pub fn new(values: Vec<i32>) -> Self {
        Elements {
            values,
            mod_count: 0,
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<i32, ListError> {
        self.values
            .get(index)
            .copied()
            .ok_or(ListError::IndexOutOfBounds {
                index,
                len: self.values.len(),
            })
    }

    #[inline]
    pub fn push(&mut self, value: i32) {
        self.values.push(value);
        self.mod_count = self.mod_count.wrapping_add(1);
    }
}

/// A held exclusive lock on a list.
///
/// Every other call on the list blocks until this guard is dropped.
pub struct Exclusive<'a> {
    kind: ExclusiveKind<'a>,
}

pub(crate) enum ExclusiveKind<'a> {
    Locked(MutexGuard<'a, Elements>),
    SyncVec {
        list: &'a SyncVec,
        // Only held; the list's own cursor re-enters the lock.
        _guard: ReentrantMutexGuard<'a, RefCell<Elements>>,
    },
}

impl<'a> Exclusive<'a> {
    pub(crate) fn new(kind: ExclusiveKind<'a>) -> Self {
        Exclusive { kind }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.kind {
            ExclusiveKind::Locked(guard) => guard.values.len(),
            ExclusiveKind::SyncVec { list, .. } => list.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits every element while the lock is held.
    pub fn try_for_each(&self, mut f: impl FnMut(i32)) -> Result<(), ListError> {
        match &self.kind {
            ExclusiveKind::Locked(guard) => {
                // The mutex is not reentrant: calling back into the list here would deadlock.
                guard.values.iter().copied().for_each(f);

                Ok(())
            }
            ExclusiveKind::SyncVec { list, .. } => {
                for value in list.cursor() {
                    f(value?);
                }

                Ok(())
            }
        }
    }
}

impl fmt::Debug for Exclusive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self.kind {
            ExclusiveKind::Locked(_) => Variant::Locked,
            ExclusiveKind::SyncVec { .. } => Variant::SyncVec,
        };

        f.debug_struct("Exclusive")
            .field("variant", &variant)
            .finish_non_exhaustive()
    }
}
