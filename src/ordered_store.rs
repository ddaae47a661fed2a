//! OrderedStore: structural layer keeping entries in insertion order with
//! an O(1) key index.
//!
//! Entries live in a `Vec` in position order. A `HashTable<usize>` maps the
//! precomputed key hash to the entry's position. Removal compacts the
//! recorded positions before returning, so the store is consistent again
//! by the time any caller sees the removed `(K, V)`.

use crate::error::MapError;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use std::collections::hash_map::RandomState;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

pub(crate) struct OrderedStore<K, V, S = RandomState> {
    hasher: S,
    index: HashTable<usize>,
    entries: Vec<Entry<K, V>>, // position order
}

impl<K, V> OrderedStore<K, V>
where
    K: Eq + Hash,
{
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::with_capacity_and_hasher(0, Default::default())
    }
}

impl<K, V, S> OrderedStore<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn position_of<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let entries = &self.entries;
        self.index
            .find(hash, |&i| entries[i].key.borrow() == q)
            .copied()
    }

    pub(crate) fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.position_of(q).map(|i| &self.entries[i].value)
    }

    pub(crate) fn get_index(&self, position: usize) -> Option<(&K, &V)> {
        self.entries.get(position).map(|e| (&e.key, &e.value))
    }

    /// Append a new entry. Fails without touching the store if the key is
    /// already present.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<usize, MapError> {
        let hash = self.make_hash(&key);
        let entries = &self.entries;
        match self.index.entry(
            hash,
            |&i| entries[i].key == key,
            |&i| entries[i].hash,
        ) {
            TableEntry::Occupied(_) => Err(MapError::DuplicateKey),
            TableEntry::Vacant(v) => {
                let position = entries.len();
                let _ = v.insert(position);
                self.entries.push(Entry { key, value, hash });
                Ok(position)
            }
        }
    }

    /// Swap the value stored at `position`, returning the previous one.
    pub(crate) fn replace_at(&mut self, position: usize, value: V) -> Option<V> {
        self.entries
            .get_mut(position)
            .map(|e| core::mem::replace(&mut e.value, value))
    }

    pub(crate) fn remove<Q>(&mut self, q: &Q) -> Option<(usize, K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_if(q, |_| true)
    }

    /// Remove the entry for `q` if `should_remove(value)` holds. Positions
    /// after the removed one shift down by one.
    pub(crate) fn remove_if<Q, F>(&mut self, q: &Q, should_remove: F) -> Option<(usize, K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> bool,
    {
        let hash = self.make_hash(q);
        let entries = &self.entries;
        let found = self
            .index
            .find_entry(hash, |&i| entries[i].key.borrow() == q)
            .ok()?;
        let position = *found.get();
        if !should_remove(&entries[position].value) {
            return None;
        }
        let _ = found.remove();

        let entry = self.entries.remove(position);
        self.compact_after(position);
        Some((position, entry.key, entry.value))
    }

    // O(n): every recorded position above `removed` moves down by one.
    fn compact_after(&mut self, removed: usize) {
        for position in self.index.iter_mut() {
            if *position > removed {
                *position -= 1;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.entries.clear();
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|e| (&e.key, &e.value))
    }

    /// Check the index/position bijection. Test support only.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(self.index.len(), self.entries.len());
        let mut seen = vec![false; self.entries.len()];
        for &position in self.index.iter() {
            assert!(position < self.entries.len(), "position out of range");
            assert!(!seen[position], "duplicate position {}", position);
            seen[position] = true;
        }
        for (i, e) in self.entries.iter().enumerate() {
            assert_eq!(self.position_of(&e.key), Some(i));
            assert_eq!(self.make_hash(&e.key), e.hash);
        }
    }
}
