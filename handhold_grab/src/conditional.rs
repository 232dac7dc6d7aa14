// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Boolean conditionals with change notification.
//!
//! A [`Conditional`] holds one resolved boolean and fires its
//! [`changed`](Conditional::changed) signal only when the value actually changes.
//! [`ActiveConditional`] keeps a conditional in sync with the active flag of an
//! [`Activatable`] component such as a
//! [`GrabInteractor`](crate::interactor::GrabInteractor).

use std::cell::Cell;
use std::rc::{Rc, Weak};

use crate::signal::{Signal, SubscriptionId};

/// A boolean value with a change signal.
#[derive(Debug, Default)]
pub struct Conditional {
    value: Cell<bool>,
    changed: Signal<bool>,
}

impl Conditional {
    /// Create a conditional resolved to `value`.
    pub fn new(value: bool) -> Self {
        Self {
            value: Cell::new(value),
            changed: Signal::new(),
        }
    }

    /// The currently resolved value.
    pub fn value(&self) -> bool {
        self.value.get()
    }

    /// Fired with the new value whenever it changes.
    pub fn changed(&self) -> &Signal<bool> {
        &self.changed
    }

    /// Set the resolved value, notifying subscribers if it changed.
    pub fn set_value(&self, value: bool) {
        if self.value.replace(value) != value {
            self.changed.emit(&value);
        }
    }
}

/// A component with an active flag and a signal fired when it toggles.
pub trait Activatable {
    /// Whether the component is active.
    fn is_active(&self) -> bool;

    /// Fired with the new active flag on activation and deactivation.
    fn activation_signal(&self) -> Rc<Signal<bool>>;
}

/// Mirrors the active flag of an [`Activatable`].
#[derive(Debug)]
pub struct ActiveConditional {
    conditional: Rc<Conditional>,
    watched: Option<(Weak<Signal<bool>>, SubscriptionId)>,
}

impl Default for ActiveConditional {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveConditional {
    /// Create a conditional watching nothing; it resolves to false.
    pub fn new() -> Self {
        Self {
            conditional: Rc::new(Conditional::new(false)),
            watched: None,
        }
    }

    /// The underlying conditional.
    pub fn conditional(&self) -> &Rc<Conditional> {
        &self.conditional
    }

    /// The currently resolved value.
    pub fn value(&self) -> bool {
        self.conditional.value()
    }

    /// Watch `component`, dropping any previous subscription.
    pub fn set_component(&mut self, component: &impl Activatable) {
        self.clear_component();
        let signal = component.activation_signal();
        let target = Rc::downgrade(&self.conditional);
        let id = signal.subscribe(move |active| {
            if let Some(conditional) = target.upgrade() {
                conditional.set_value(*active);
            }
        });
        self.watched = Some((Rc::downgrade(&signal), id));
        self.conditional.set_value(component.is_active());
    }

    /// Stop watching. The value resolves to false.
    pub fn clear_component(&mut self) {
        if let Some((signal, id)) = self.watched.take()
            && let Some(signal) = signal.upgrade()
        {
            signal.unsubscribe(id);
        }
        self.conditional.set_value(false);
    }
}

impl Drop for ActiveConditional {
    fn drop(&mut self) {
        if let Some((signal, id)) = self.watched.take()
            && let Some(signal) = signal.upgrade()
        {
            signal.unsubscribe(id);
        }
    }
}
