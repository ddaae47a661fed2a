//! ObservableMap: public layer that owns an `OrderedStore`, fans mutations
//! out to subscribers and enforces the reentrancy rule.

use crate::error::MapError;
use crate::notify::{ChangeEvent, ChangeSubscription, Property, PropertySubscription, Registry};
use crate::ordered_store::OrderedStore;
use crate::reentrancy::ReentrancyMonitor;
use crate::views::{Iter, Keys, Values};
use core::borrow::Borrow;
use core::cell::RefCell;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;
use std::rc::Rc;

pub(crate) type ChangeHandler<K, V, S> = dyn Fn(&ObservableMap<K, V, S>, &ChangeEvent<K, V>);
pub(crate) type PropertyHandler<K, V, S> = dyn Fn(&ObservableMap<K, V, S>, Property);

/// Insertion-ordered map that reports every mutation to its subscribers.
///
/// All methods take `&self`: handlers receive the map by shared reference
/// and may read it (they observe the post-mutation state) or mutate it,
/// subject to the reentrancy rule on [`MapError::Reentrancy`].
pub struct ObservableMap<K, V, S = RandomState> {
    store: RefCell<OrderedStore<K, V, S>>,
    change_handlers: Registry<ChangeSubscription, ChangeHandler<K, V, S>>,
    property_handlers: Registry<PropertySubscription, PropertyHandler<K, V, S>>,
    monitor: ReentrancyMonitor,
}

impl<K, V> ObservableMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    /// Build a map pre-seeded with `entries`, preserving their order. No
    /// notifications are sent since nobody can be subscribed yet.
    pub fn from_entries<I>(entries: I) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let entries = entries.into_iter();
        let map = Self::with_capacity(entries.size_hint().0);
        {
            let mut store = map.store.borrow_mut();
            for (key, value) in entries {
                store.insert(key, value)?;
            }
        }
        Ok(map)
    }
}

impl<K, V> Default for ObservableMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ObservableMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            store: RefCell::new(OrderedStore::with_capacity_and_hasher(capacity, hasher)),
            change_handlers: Registry::new(),
            property_handlers: Registry::new(),
            monitor: ReentrancyMonitor::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.borrow().position_of(q).is_some()
    }

    /// True when `q` is present and its value equals `value`.
    pub fn contains_entry<Q>(&self, q: &Q, value: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        self.store.borrow().get(q).is_some_and(|v| v == value)
    }

    /// Current value for `q`, or `KeyNotFound`.
    pub fn get<Q>(&self, q: &Q) -> Result<V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.try_get(q).ok_or(MapError::KeyNotFound)
    }

    pub fn try_get<Q>(&self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.borrow().get(q).cloned()
    }

    /// Zero-based insertion-order position of `q`.
    pub fn position_of<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.store.borrow().position_of(q)
    }

    /// Entry currently at `position`.
    pub fn get_index(&self, position: usize) -> Option<(K, V)> {
        self.store
            .borrow()
            .get_index(position)
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    pub(crate) fn key_at(&self, position: usize) -> Option<K> {
        self.store.borrow().get_index(position).map(|(k, _)| k.clone())
    }

    pub(crate) fn value_at(&self, position: usize) -> Option<V> {
        self.store.borrow().get_index(position).map(|(_, v)| v.clone())
    }

    /// Live view of the keys in position order.
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys::new(self)
    }

    /// Live view of the values in position order.
    pub fn values(&self) -> Values<'_, K, V, S> {
        Values::new(self)
    }

    /// Lazy iterator over `(key, value)` pairs in position order. See
    /// [`Iter`] for how it behaves when the map changes mid-iteration.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self)
    }

    /// Ordered snapshot of every entry.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.store
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Register a change-event handler. Handlers run in subscription order.
    pub fn subscribe_changes<F>(&self, handler: F) -> ChangeSubscription
    where
        F: Fn(&Self, &ChangeEvent<K, V>) + 'static,
    {
        self.change_handlers.subscribe(Rc::new(handler))
    }

    /// Returns false if `id` was not (or no longer) subscribed.
    pub fn unsubscribe_changes(&self, id: ChangeSubscription) -> bool {
        self.change_handlers.unsubscribe(id)
    }

    pub fn change_subscriber_count(&self) -> usize {
        self.change_handlers.len()
    }

    /// Register a property-changed handler. Handlers run in subscription
    /// order.
    pub fn subscribe_properties<F>(&self, handler: F) -> PropertySubscription
    where
        F: Fn(&Self, Property) + 'static,
    {
        self.property_handlers.subscribe(Rc::new(handler))
    }

    pub fn unsubscribe_properties(&self, id: PropertySubscription) -> bool {
        self.property_handlers.unsubscribe(id)
    }

    pub fn property_subscriber_count(&self) -> usize {
        self.property_handlers.len()
    }

    /// Append `key -> value` at the tail and return its position. Fails
    /// with `DuplicateKey` if the key exists; use [`set`](Self::set) to
    /// overwrite.
    pub fn insert(&self, key: K, value: V) -> Result<usize, MapError> {
        self.check_reentrancy()?;
        self.insert_checked(key, value)
    }

    // Reentrancy already checked by the caller.
    fn insert_checked(&self, key: K, value: V) -> Result<usize, MapError> {
        let (position, len) = {
            let mut store = self.store.borrow_mut();
            let position = store.insert(key.clone(), value.clone())?;
            (position, store.len())
        };
        tracing::trace!(position, len, "observable map insert");
        self.notify(
            &Property::STRUCTURAL,
            ChangeEvent::Add {
                key,
                value,
                position,
            },
        );
        Ok(position)
    }

    /// Remove `q`. Returns `Ok(false)` without notifying when absent.
    pub fn remove<Q>(&self, q: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.check_reentrancy()?;
        let removed = self.store.borrow_mut().remove(q);
        Ok(self.finish_remove(removed))
    }

    /// Remove `q` only if its stored value equals `value`.
    pub fn remove_if<Q>(&self, q: &Q, value: &V) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        self.check_reentrancy()?;
        let removed = self.store.borrow_mut().remove_if(q, |stored| stored == value);
        Ok(self.finish_remove(removed))
    }

    fn finish_remove(&self, removed: Option<(usize, K, V)>) -> bool {
        let Some((position, key, value)) = removed else {
            return false;
        };
        tracing::trace!(position, len = self.len(), "observable map remove");
        self.notify(
            &Property::STRUCTURAL,
            ChangeEvent::Remove {
                key,
                value,
                position,
            },
        );
        true
    }

    /// Remove every entry and emit a single `Reset`.
    pub fn clear(&self) -> Result<(), MapError> {
        self.check_reentrancy()?;
        let cleared = {
            let mut store = self.store.borrow_mut();
            let n = store.len();
            store.clear();
            n
        };
        tracing::trace!(cleared, "observable map clear");
        self.notify(&Property::STRUCTURAL, ChangeEvent::Reset);
        Ok(())
    }

    /// Insert or overwrite. On an absent key this is exactly
    /// [`insert`](Self::insert) and returns `None`; otherwise the value is
    /// replaced in place and the previous one is returned.
    pub fn set(&self, key: K, value: V) -> Result<Option<V>, MapError> {
        self.check_reentrancy()?;
        let replaced = {
            let mut store = self.store.borrow_mut();
            match store.position_of(&key) {
                Some(position) => store
                    .replace_at(position, value.clone())
                    .map(|old| (position, old)),
                None => None,
            }
        };
        let Some((position, old_value)) = replaced else {
            return self.insert_checked(key, value).map(|_| None);
        };
        tracing::trace!(position, "observable map replace");
        self.notify(
            &Property::VALUE_ONLY,
            ChangeEvent::Replace {
                key,
                old_value: old_value.clone(),
                new_value: value,
                position,
            },
        );
        Ok(Some(old_value))
    }

    fn check_reentrancy(&self) -> Result<(), MapError> {
        if self.monitor.is_busy() && self.change_handlers.len() > 1 {
            tracing::debug!(
                subscribers = self.change_handlers.len(),
                "rejected reentrant change during notification"
            );
            return Err(MapError::Reentrancy);
        }
        Ok(())
    }

    /// Property signals first, then exactly one change event. The store is
    /// consistent and unborrowed by the time any handler runs.
    fn notify(&self, properties: &[Property], event: ChangeEvent<K, V>) {
        if !self.property_handlers.is_empty() {
            let handlers = self.property_handlers.snapshot();
            for &property in properties {
                for handler in &handlers {
                    handler(self, property);
                }
            }
        }

        if self.change_handlers.is_empty() {
            return;
        }
        let _g = self.monitor.enter();
        for handler in self.change_handlers.snapshot() {
            handler(self, &event);
        }
    }
}

impl<K, V, S> fmt::Debug for ObservableMap<K, V, S>
where
    K: fmt::Debug + Eq + Hash,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store.try_borrow() {
            Ok(store) => f.debug_map().entries(store.iter()).finish(),
            Err(_) => f.write_str("ObservableMap { <borrowed> }"),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ObservableMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Item = (K, V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
