//! observable-map: a single-threaded, insertion-ordered map that reports
//! every mutation to its subscribers and refuses unsafe reentrant
//! mutation from inside its own notifications.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an associative container that can drive incremental UI updates:
//!   stable insertion order, positional addressing, and a structured delta
//!   per mutation.
//! - Layers:
//!   - OrderedStore<K, V, S>: structural map. A `Vec` of entries in
//!     position order plus a `hashbrown::HashTable<usize>` from key hash to
//!     position. Removal compacts positions before it returns.
//!   - ObservableMap<K, V, S>: public API. Owns the store behind a
//!     `RefCell`, one subscriber registry per notification stream, and a
//!     dispatch monitor.
//!   - ObservableCell<T>: a single observed value for owners that expose a
//!     scalar (a selection, say) next to the map.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (`Rc`, `RefCell`, `Cell`).
//! - O(1) average lookups; unique keys; duplicate inserts fail.
//! - O(n) removal: every position above the removed one shifts down.
//! - Keys are immutable post-insert; there is no `key_mut`.
//!
//! Notifications
//! - Two streams: coarse property signals (`Count`, `Keys`, `Values`,
//!   `Item[]`) and one structured `ChangeEvent` per mutation.
//! - Per mutation, all property signals are dispatched first, then exactly
//!   one change event. Structural changes raise all four properties; an
//!   in-place replace raises only `Values` and `Item[]`. `clear` raises a
//!   single `Reset`, never one `Remove` per entry.
//! - Dispatch happens after the store is consistent and with no storage
//!   borrow held, so handlers read post-mutation state and may call back
//!   into the map.
//! - Each dispatch iterates a snapshot of the registry: (un)subscribing
//!   from a handler affects the next mutation, not the current one.
//!
//! Reentrancy policy
//! - A monitor counts active change-event dispatches. A mutation issued
//!   while the monitor is busy fails with `MapError::Reentrancy` only when
//!   more than one change subscriber is registered. With a single
//!   subscriber nested mutation is allowed: the only listener that could
//!   see an intermediate state is the one causing it.
//! - The monitor guard is RAII; a panicking handler releases it.
//! - `K: Eq`/`K: Hash` run while the store is borrowed. Mutating the map
//!   from those impls panics on the `RefCell`.
//!
//! Views
//! - `keys()`, `values()` and `iter()` are live: they hold `&ObservableMap`,
//!   not a storage borrow, and read one position per step. `to_vec()`
//!   exists on the map and on each view for an explicit snapshot.

mod error;
mod notify;
mod observable_cell;
mod observable_map;
mod ordered_store;
mod ordered_store_proptest;
mod reentrancy;
mod views;

// Public surface
pub use error::MapError;
pub use notify::{
    CellSubscription, ChangeEvent, ChangeKind, ChangeSubscription, Property, PropertySubscription,
};
pub use observable_cell::ObservableCell;
pub use observable_map::ObservableMap;
pub use views::{Iter, Keys, KeysIter, Values, ValuesIter};
