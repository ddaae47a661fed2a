//! Notification payloads and the per-stream subscriber registry.

use core::cell::RefCell;
use slotmap::{Key, SlotMap};
use std::rc::Rc;

slotmap::new_key_type! {
    /// Handle for a change-event subscription on an `ObservableMap`.
    pub struct ChangeSubscription;

    /// Handle for a property-changed subscription on an `ObservableMap`.
    pub struct PropertySubscription;

    /// Handle for a subscription on an `ObservableCell`.
    pub struct CellSubscription;
}

/// Discriminant of a [`ChangeEvent`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ChangeKind {
    Add,
    Remove,
    Replace,
    Reset,
}

/// Structured description of a single mutation.
///
/// Positions are the zero-based insertion-order index of the entry at the
/// time of the change: for `Remove` it is the position the entry occupied
/// before removal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChangeEvent<K, V> {
    Add {
        key: K,
        value: V,
        position: usize,
    },
    Remove {
        key: K,
        value: V,
        position: usize,
    },
    Replace {
        key: K,
        old_value: V,
        new_value: V,
        position: usize,
    },
    /// The whole collection was replaced; listeners should re-read it.
    Reset,
}

impl<K, V> ChangeEvent<K, V> {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::Add { .. } => ChangeKind::Add,
            ChangeEvent::Remove { .. } => ChangeKind::Remove,
            ChangeEvent::Replace { .. } => ChangeKind::Replace,
            ChangeEvent::Reset => ChangeKind::Reset,
        }
    }

    pub fn key(&self) -> Option<&K> {
        match self {
            ChangeEvent::Add { key, .. }
            | ChangeEvent::Remove { key, .. }
            | ChangeEvent::Replace { key, .. } => Some(key),
            ChangeEvent::Reset => None,
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            ChangeEvent::Add { position, .. }
            | ChangeEvent::Remove { position, .. }
            | ChangeEvent::Replace { position, .. } => Some(*position),
            ChangeEvent::Reset => None,
        }
    }

    /// Value present after the change at `key`, if any.
    pub fn new_value(&self) -> Option<&V> {
        match self {
            ChangeEvent::Add { value, .. } => Some(value),
            ChangeEvent::Replace { new_value, .. } => Some(new_value),
            ChangeEvent::Remove { .. } | ChangeEvent::Reset => None,
        }
    }

    /// Value present before the change at `key`, if any.
    pub fn old_value(&self) -> Option<&V> {
        match self {
            ChangeEvent::Remove { value, .. } => Some(value),
            ChangeEvent::Replace { old_value, .. } => Some(old_value),
            ChangeEvent::Add { .. } | ChangeEvent::Reset => None,
        }
    }
}

/// Coarse aggregate named by a property-changed signal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Property {
    Count,
    Keys,
    Values,
    /// Catch-all "indexer changed" signal.
    Item,
}

impl Property {
    /// Signals raised by structural changes (insert, remove, clear).
    pub const STRUCTURAL: [Property; 4] =
        [Property::Count, Property::Keys, Property::Values, Property::Item];

    /// Signals raised when a value is replaced in place.
    pub const VALUE_ONLY: [Property; 2] = [Property::Values, Property::Item];

    pub fn name(self) -> &'static str {
        match self {
            Property::Count => "Count",
            Property::Keys => "Keys",
            Property::Values => "Values",
            Property::Item => "Item[]",
        }
    }
}

impl core::fmt::Display for Property {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

struct Slots<Id: Key, H: ?Sized> {
    handlers: SlotMap<Id, Rc<H>>,
    // Subscription order; slot order is not stable across reuse.
    order: Vec<Id>,
}

/// Subscriber list for one notification stream.
///
/// Ids are generational, so an id kept after `unsubscribe` never resolves
/// to a later subscriber. Dispatch iterates a snapshot taken by
/// `snapshot`, which keeps in-flight dispatch unaffected by handlers that
/// subscribe or unsubscribe.
pub(crate) struct Registry<Id: Key, H: ?Sized> {
    slots: RefCell<Slots<Id, H>>,
}

impl<Id: Key, H: ?Sized> Registry<Id, H> {
    pub(crate) fn new() -> Self {
        Self {
            slots: RefCell::new(Slots {
                handlers: SlotMap::with_key(),
                order: Vec::new(),
            }),
        }
    }

    pub(crate) fn subscribe(&self, handler: Rc<H>) -> Id {
        let mut slots = self.slots.borrow_mut();
        let id = slots.handlers.insert(handler);
        slots.order.push(id);
        id
    }

    pub(crate) fn unsubscribe(&self, id: Id) -> bool {
        let mut slots = self.slots.borrow_mut();
        if slots.handlers.remove(id).is_none() {
            return false;
        }
        slots.order.retain(|&k| k != id);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.borrow().handlers.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.borrow().handlers.is_empty()
    }

    /// Handlers in subscription order. No borrow is held once this returns.
    pub(crate) fn snapshot(&self) -> Vec<Rc<H>> {
        let slots = self.slots.borrow();
        slots
            .order
            .iter()
            .filter_map(|&id| slots.handlers.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type Handler = dyn Fn(&Cell<u32>);

    #[test]
    fn event_accessors() {
        let add: ChangeEvent<u32, &str> = ChangeEvent::Add {
            key: 1,
            value: "a",
            position: 0,
        };
        assert_eq!(add.kind(), ChangeKind::Add);
        assert_eq!(add.key(), Some(&1));
        assert_eq!(add.new_value(), Some(&"a"));
        assert_eq!(add.old_value(), None);

        let replace: ChangeEvent<u32, &str> = ChangeEvent::Replace {
            key: 1,
            old_value: "a",
            new_value: "b",
            position: 3,
        };
        assert_eq!(replace.position(), Some(3));
        assert_eq!(replace.old_value(), Some(&"a"));
        assert_eq!(replace.new_value(), Some(&"b"));

        let reset: ChangeEvent<u32, &str> = ChangeEvent::Reset;
        assert_eq!(reset.kind(), ChangeKind::Reset);
        assert!(reset.key().is_none());
        assert!(reset.position().is_none());
    }

    #[test]
    fn property_names() {
        let names: Vec<_> = Property::STRUCTURAL.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["Count", "Keys", "Values", "Item[]"]);
        assert_eq!(Property::Item.to_string(), "Item[]");
    }

    #[test]
    fn snapshot_keeps_subscription_order_across_slot_reuse() {
        let r: Registry<CellSubscription, Handler> = Registry::new();
        let a = r.subscribe(Rc::new(|c: &Cell<u32>| c.set(c.get() * 10 + 1)));
        let _b = r.subscribe(Rc::new(|c: &Cell<u32>| c.set(c.get() * 10 + 2)));
        assert!(r.unsubscribe(a));
        // Likely reuses the slot freed by `a`, but must run last.
        let _c = r.subscribe(Rc::new(|c: &Cell<u32>| c.set(c.get() * 10 + 3)));

        let acc = Cell::new(0);
        for h in r.snapshot() {
            h(&acc);
        }
        assert_eq!(acc.get(), 23);
    }

    #[test]
    fn stale_id_does_not_unsubscribe_new_entry() {
        let r: Registry<CellSubscription, Handler> = Registry::new();
        let a = r.subscribe(Rc::new(|_: &Cell<u32>| {}));
        assert!(r.unsubscribe(a));
        assert!(!r.unsubscribe(a), "second unsubscribe is a no-op");
        let b = r.subscribe(Rc::new(|_: &Cell<u32>| {}));
        assert_ne!(a, b);
        assert!(!r.unsubscribe(a));
        assert_eq!(r.len(), 1);
        assert!(!r.is_empty());
    }
}
