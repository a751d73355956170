use crate::{
    cow::CopyOnWriteList,
    list::{ConcurrentList, Variant},
    locked::LockedList,
    sync_vec::SyncVec,
};
use rand::Rng;
use std::{ops::Deref, sync::Arc};

/// Exclusive upper bound of the generated values.
pub const VALUE_BOUND: i32 = 1000;

/// The initial contents shared by every list of a scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    values: Arc<[i32]>,
}

impl Dataset {
    /// Generates `size` unseeded random values in `0..VALUE_BOUND`.
    #[must_use]
    pub fn random(size: usize) -> Self {
        let mut rng = rand::thread_rng();
        let values = (0..size).map(|_| rng.gen_range(0..VALUE_BOUND)).collect();

        Dataset { values }
    }

    #[must_use]
    pub fn from_values(values: impl Into<Arc<[i32]>>) -> Self {
        Dataset {
            values: values.into(),
        }
    }

    #[must_use]
    pub fn build(&self, variant: Variant) -> Arc<dyn ConcurrentList> {
        let values = self.values.to_vec();

        match variant {
            Variant::CopyOnWrite => Arc::new(CopyOnWriteList::from_vec(values)),
            Variant::Locked => Arc::new(LockedList::from_vec(values)),
            Variant::SyncVec => Arc::new(SyncVec::from_vec(values)),
        }
    }
}

impl Deref for Dataset {
    type Target = [i32];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

/// One dataset and a list of every variant seeded from it.
#[derive(Clone)]
pub struct Fixture {
    pub dataset: Dataset,
    pub lists: Vec<Arc<dyn ConcurrentList>>,
}

impl Fixture {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Fixture::from_dataset(Dataset::random(size))
    }

    #[must_use]
    pub fn from_dataset(dataset: Dataset) -> Self {
        let lists = Variant::ALL
            .iter()
            .map(|&variant| dataset.build(variant))
            .collect();

        Fixture { dataset, lists }
    }
}
