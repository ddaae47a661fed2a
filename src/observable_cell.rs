//! ObservableCell: a single observed value, for owners that expose a
//! scalar (such as a selection) next to an `ObservableMap`.

use crate::notify::{CellSubscription, Registry};
use core::cell::RefCell;
use core::fmt;
use std::rc::Rc;

type CellHandler<T> = dyn Fn(&T, &T);

pub struct ObservableCell<T> {
    value: RefCell<T>,
    subscribers: Registry<CellSubscription, CellHandler<T>>,
}

impl<T> ObservableCell<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            subscribers: Registry::new(),
        }
    }

    /// Register `handler(old, new)`; it runs after every effective `set`.
    pub fn subscribe<F>(&self, handler: F) -> CellSubscription
    where
        F: Fn(&T, &T) + 'static,
    {
        self.subscribers.subscribe(Rc::new(handler))
    }

    pub fn unsubscribe(&self, id: CellSubscription) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Clone> ObservableCell<T> {
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }
}

impl<T: Clone + PartialEq> ObservableCell<T> {
    /// Store `value` and notify. Setting the current value is a no-op and
    /// returns false.
    pub fn set(&self, value: T) -> bool {
        if *self.value.borrow() == value {
            return false;
        }
        let old = self.value.replace(value.clone());
        tracing::trace!("observable cell changed");
        for handler in self.subscribers.snapshot() {
            handler(&old, &value);
        }
        true
    }
}

impl<T: Default> Default for ObservableCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.try_borrow() {
            Ok(value) => f.debug_tuple("ObservableCell").field(&*value).finish(),
            Err(_) => f.write_str("ObservableCell(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ObservableCell;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notifies_only_on_change() {
        let cell = ObservableCell::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        cell.subscribe(move |old, new| sink.borrow_mut().push((*old, *new)));

        assert!(cell.set(2));
        assert!(!cell.set(2));
        assert!(cell.set(5));
        assert_eq!(*seen.borrow(), [(0, 2), (2, 5)]);
        assert_eq!(cell.get(), 5);
    }

    #[test]
    fn handler_reads_new_value() {
        let cell = Rc::new(ObservableCell::new("a".to_string()));
        let seen = Rc::new(RefCell::new(String::new()));
        let (c, sink) = (cell.clone(), seen.clone());
        cell.subscribe(move |_, _| *sink.borrow_mut() = c.get());
        cell.set("b".to_string());
        assert_eq!(*seen.borrow(), "b");
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let cell = ObservableCell::new(1u8);
        let hits = Rc::new(RefCell::new(0));
        let sink = hits.clone();
        let id = cell.subscribe(move |_, _| *sink.borrow_mut() += 1);
        cell.set(2);
        assert!(cell.unsubscribe(id));
        cell.set(3);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(cell.into_inner(), 3);
    }

    #[test]
    fn debug_renders_inner_value() {
        let cell = ObservableCell::new(3);
        assert_eq!(format!("{:?}", cell), "ObservableCell(3)");
    }
}
