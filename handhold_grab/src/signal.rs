// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronous observer lists.
//!
//! A [`Signal`] holds subscribers and invokes all of them, in registration
//! order, every time it is emitted. Emission walks a snapshot of the subscriber
//! list, so a handler may subscribe or unsubscribe (itself or others) while the
//! signal is running; such changes take effect on the next emission.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use handhold_grab::signal::Signal;
//!
//! let signal: Signal<u32> = Signal::new();
//! let seen = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&seen);
//! let id = signal.subscribe(move |v| sink.set(sink.get() + *v));
//! signal.emit(&2);
//! signal.emit(&3);
//! assert_eq!(seen.get(), 5);
//! assert!(signal.unsubscribe(id));
//! signal.emit(&10);
//! assert_eq!(seen.get(), 5);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`Signal::subscribe`], used to unsubscribe.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(u64);

type Slot<T> = (SubscriptionId, Rc<dyn Fn(&T)>);

/// A single-threaded multicast signal.
pub struct Signal<T> {
    slots: RefCell<Vec<Slot<T>>>,
    next_id: Cell<u64>,
}

impl<T> core::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.slots.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    /// Create a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Register `handler`; it runs after every handler registered before it.
    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.slots.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Remove a subscriber. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut slots = self.slots.borrow_mut();
        let before = slots.len();
        slots.retain(|(slot, _)| *slot != id);
        slots.len() != before
    }

    /// Returns true if `id` is currently subscribed.
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.slots.borrow().iter().any(|(slot, _)| *slot == id)
    }

    /// Number of current subscribers.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Returns true if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    /// Invoke every subscriber with `value`.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Rc<dyn Fn(&T)>> = self
            .slots
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        for handler in snapshot {
            handler(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_in_registration_order() {
        let signal: Signal<()> = Signal::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let log = Rc::clone(&log);
            signal.subscribe(move |_| log.borrow_mut().push(n));
        }
        signal.emit(&());
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn unsubscribe_unknown_id_is_false() {
        let signal: Signal<()> = Signal::new();
        let id = signal.subscribe(|_| {});
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        assert!(signal.is_empty());
    }

    #[test]
    fn handler_may_unsubscribe_itself_during_emit() {
        let signal: Rc<Signal<()>> = Rc::new(Signal::new());
        let hits = Rc::new(Cell::new(0));
        let own_id: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let id = {
            let weak = Rc::downgrade(&signal);
            let hits = Rc::clone(&hits);
            let own_id = Rc::clone(&own_id);
            signal.subscribe(move |_| {
                hits.set(hits.get() + 1);
                if let (Some(s), Some(id)) = (weak.upgrade(), own_id.get()) {
                    s.unsubscribe(id);
                }
            })
        };
        own_id.set(Some(id));
        signal.emit(&());
        signal.emit(&());
        assert_eq!(hits.get(), 1);
        assert!(!signal.is_subscribed(id));
    }

    #[test]
    fn subscribe_during_emit_applies_next_time() {
        let signal: Rc<Signal<()>> = Rc::new(Signal::new());
        let late_hits = Rc::new(Cell::new(0));
        {
            let weak = Rc::downgrade(&signal);
            let late_hits = Rc::clone(&late_hits);
            signal.subscribe(move |_| {
                if let Some(s) = weak.upgrade()
                    && s.len() == 1
                {
                    let late_hits = Rc::clone(&late_hits);
                    s.subscribe(move |_| late_hits.set(late_hits.get() + 1));
                }
            });
        }
        signal.emit(&());
        assert_eq!(late_hits.get(), 0);
        signal.emit(&());
        assert_eq!(late_hits.get(), 1);
    }
}
