//! Live views and lazy iterators over an `ObservableMap`.
//!
//! None of these hold a borrow of the map's storage between calls: each
//! step reads one position and clones what it yields. Mutating the map
//! while a view or iterator is alive is therefore allowed, and the next
//! read reflects the map as it is at that moment. Use `to_vec` on the map
//! or a view for a frozen snapshot.

use crate::observable_map::ObservableMap;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Cursor over `(key, value)` pairs in position order.
///
/// The cursor is a plain position: if entries before it are removed
/// mid-iteration, entries shift down and one may be skipped; if entries
/// are appended, they are visited. Iteration ends at the first position
/// past the current end. Call `ObservableMap::iter` again to restart.
pub struct Iter<'a, K, V, S = RandomState> {
    map: &'a ObservableMap<K, V, S>,
    next: usize,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(crate) fn new(map: &'a ObservableMap<K, V, S>) -> Self {
        Self { map, next: 0 }
    }
}

impl<'a, K, V, S> Clone for Iter<'a, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            next: self.next,
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.map.get_index(self.next)?;
        self.next += 1;
        Some(item)
    }
}

/// Live view of an `ObservableMap`'s keys.
pub struct Keys<'a, K, V, S = RandomState> {
    map: &'a ObservableMap<K, V, S>,
}

impl<'a, K, V, S> Keys<'a, K, V, S> {
    pub(crate) fn new(map: &'a ObservableMap<K, V, S>) -> Self {
        Self { map }
    }
}

impl<'a, K, V, S> Clone for Keys<'a, K, V, S> {
    fn clone(&self) -> Self {
        Self { map: self.map }
    }
}

impl<'a, K, V, S> Copy for Keys<'a, K, V, S> {}

impl<'a, K, V, S> Keys<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(q)
    }

    pub fn iter(&self) -> KeysIter<'a, K, V, S> {
        KeysIter {
            map: self.map,
            next: 0,
        }
    }

    /// Snapshot of the keys as they are now.
    pub fn to_vec(&self) -> Vec<K> {
        self.iter().collect()
    }
}

impl<'a, K, V, S> IntoIterator for Keys<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Item = K;
    type IntoIter = KeysIter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct KeysIter<'a, K, V, S = RandomState> {
    map: &'a ObservableMap<K, V, S>,
    next: usize,
}

impl<'a, K, V, S> Iterator for KeysIter<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        let key = self.map.key_at(self.next)?;
        self.next += 1;
        Some(key)
    }
}

/// Live view of an `ObservableMap`'s values.
pub struct Values<'a, K, V, S = RandomState> {
    map: &'a ObservableMap<K, V, S>,
}

impl<'a, K, V, S> Values<'a, K, V, S> {
    pub(crate) fn new(map: &'a ObservableMap<K, V, S>) -> Self {
        Self { map }
    }
}

impl<'a, K, V, S> Clone for Values<'a, K, V, S> {
    fn clone(&self) -> Self {
        Self { map: self.map }
    }
}

impl<'a, K, V, S> Copy for Values<'a, K, V, S> {}

impl<'a, K, V, S> Values<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Value at `position`.
    pub fn get(&self, position: usize) -> Option<V> {
        self.map.value_at(position)
    }

    pub fn iter(&self) -> ValuesIter<'a, K, V, S> {
        ValuesIter {
            map: self.map,
            next: 0,
        }
    }

    /// Snapshot of the values as they are now.
    pub fn to_vec(&self) -> Vec<V> {
        self.iter().collect()
    }
}

impl<'a, K, V, S> IntoIterator for Values<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Item = V;
    type IntoIter = ValuesIter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct ValuesIter<'a, K, V, S = RandomState> {
    map: &'a ObservableMap<K, V, S>,
    next: usize,
}

impl<'a, K, V, S> Iterator for ValuesIter<'a, K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        let value = self.map.value_at(self.next)?;
        self.next += 1;
        Some(value)
    }
}
