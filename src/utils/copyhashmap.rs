use {
    ahash::AHashMap,
    std::{
        cell::RefCell,
        hash::Hash,
    },
};

/// A hash map behind a `RefCell` whose accessors never hand out borrows.
///
/// Values are cloned out, so callers can re-enter the map from whatever they
/// do with the value.
pub struct CopyHashMap<K, V> {
    map: RefCell<AHashMap<K, V>>,
}

impl<K, V> Default for CopyHashMap<K, V> {
    fn default() -> Self {
        Self {
            map: Default::default(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> CopyHashMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, k: K, v: V) -> Option<V> {
        self.map.borrow_mut().insert(k, v)
    }

    pub fn get(&self, k: &K) -> Option<V> {
        self.map.borrow().get(k).cloned()
    }

    pub fn remove(&self, k: &K) -> Option<V> {
        self.map.borrow_mut().remove(k)
    }

    pub fn remove_if(&self, k: &K, f: impl FnOnce(&V) -> bool) -> Option<V> {
        let mut map = self.map.borrow_mut();
        match map.get(k) {
            Some(v) if f(v) => map.remove(k),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}
