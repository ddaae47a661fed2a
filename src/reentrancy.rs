//! Dispatch reentrancy monitor.
//!
//! Single-threaded depth counter that records whether a change-event
//! dispatch is on the call stack. The monitor never rejects anything on
//! its own; `ObservableMap` consults `is_busy` together with its
//! subscriber count to decide whether a nested mutation is allowed.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-instance dispatch tracker. Embed this in structs and wrap handler
/// dispatch in `let _g = self.monitor.enter();`.
#[derive(Debug)]
pub(crate) struct ReentrancyMonitor {
    depth: Cell<u32>,
    // Keep !Send + !Sync in line with single-threaded design.
    _nosend: PhantomData<*mut ()>,
}

impl ReentrancyMonitor {
    pub(crate) const fn new() -> Self {
        Self {
            depth: Cell::new(0),
            _nosend: PhantomData,
        }
    }

    /// Enter a dispatch section. Nested entries stack; each guard releases
    /// exactly one level when dropped, including during unwinding.
    #[inline]
    pub(crate) fn enter(&self) -> MonitorGuard<'_> {
        let d = self.depth.get();
        self.depth.set(d + 1);
        MonitorGuard { owner: self }
    }

    #[inline]
    pub(crate) fn is_busy(&self) -> bool {
        self.depth.get() > 0
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> u32 {
        self.depth.get()
    }
}

/// RAII guard returned by `ReentrancyMonitor::enter`.
pub(crate) struct MonitorGuard<'a> {
    owner: &'a ReentrancyMonitor,
}

impl<'a> Drop for MonitorGuard<'a> {
    fn drop(&mut self) {
        let d = self.owner.depth.get();
        debug_assert!(d > 0);
        self.owner.depth.set(d - 1);
    }
}
