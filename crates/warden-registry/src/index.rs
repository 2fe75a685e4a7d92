use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;

/// A set published as an immutable snapshot.
///
/// Readers load whichever snapshot is current without taking a lock. Writers
/// build a new set and swap it in; callers must serialize writers themselves
/// (the registries do so with their mutation lock).
pub struct SnapshotIndex<K> {
    set: ArcSwap<HashSet<K>>,
}

impl<K> SnapshotIndex<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::from_keys(std::iter::empty())
    }

    pub fn from_keys(keys: impl IntoIterator<Item = K>) -> Self {
        let set: HashSet<K> = keys.into_iter().collect();
        Self {
            set: ArcSwap::from_pointee(set),
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.set.load().contains(key)
    }

    pub fn len(&self) -> usize {
        self.set.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.load().is_empty()
    }

    pub fn snapshot(&self) -> Arc<HashSet<K>> {
        self.set.load_full()
    }

    /// Publish a freshly built set in place of the current one.
    pub fn replace(&self, keys: impl IntoIterator<Item = K>) {
        self.set.store(Arc::new(keys.into_iter().collect()));
    }

    pub fn insert(&self, key: K) {
        if self.contains(&key) {
            return;
        }
        self.set.rcu(|current| {
            let mut next = (**current).clone();
            next.insert(key.clone());
            next
        });
    }

    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        if !self.contains(key) {
            return;
        }
        self.set.rcu(|current| {
            let mut next = (**current).clone();
            next.remove(key);
            next
        });
    }
}

impl<K> Default for SnapshotIndex<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Take an aggregate's mutation lock. The lock guards no data of its own, so a
/// panic in a previous holder leaves nothing to repair here.
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}
