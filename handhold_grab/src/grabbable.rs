// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The grabbable contract and a ready-made implementation.
//!
//! ## Overview
//!
//! A grabbable is any target an interactor can hover and select. The interactor
//! never owns grabbables; it keeps [`GrabbableHandle`]s, which are weak and
//! compare by identity, and checks liveness before every use.
//!
//! Collision sources hand the interactor a [`GrabbableLookup`] for the owner of
//! the shape they report, instead of the interactor searching for one.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glam::Vec3;

use crate::event::PointerEvent;
use crate::signal::Signal;
use crate::types::{Channel, ChannelSet, ShapeId};

/// A shape together with its current world position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapeLocation {
    /// Shape identity.
    pub shape: ShapeId,
    /// World position of the shape's origin.
    pub position: Vec3,
}

/// A target that can be hovered and grabbed.
pub trait Grabbable {
    /// Returns true if colliders of `channel` may grab this target.
    fn allows_grab_type(&self, channel: Channel) -> bool;

    /// The designated grab collider. Only overlaps with this shape count.
    fn grab_collider(&self) -> ShapeLocation;

    /// Fired by the target to cancel an ongoing grab.
    fn cancel_grab_signal(&self) -> &Signal<()>;

    /// Receive a pointer event from an interactor.
    fn post_event(&self, event: &PointerEvent);
}

/// Capability query on the owner of a reported shape.
pub trait GrabbableLookup {
    /// The grabbable attached to this owner, if any.
    fn find_grabbable(&self) -> Option<Rc<dyn Grabbable>>;
}

impl<G: Grabbable + 'static> GrabbableLookup for Rc<G> {
    fn find_grabbable(&self) -> Option<Rc<dyn Grabbable>> {
        let grabbable: Rc<dyn Grabbable> = self.clone();
        Some(grabbable)
    }
}

impl GrabbableLookup for Rc<dyn Grabbable> {
    fn find_grabbable(&self) -> Option<Rc<dyn Grabbable>> {
        Some(Rc::clone(self))
    }
}

/// Weak, identity-compared reference to a [`Grabbable`].
#[derive(Clone)]
pub struct GrabbableHandle(Weak<dyn Grabbable>);

impl GrabbableHandle {
    /// Create a handle to `grabbable`.
    pub fn new(grabbable: &Rc<dyn Grabbable>) -> Self {
        Self(Rc::downgrade(grabbable))
    }

    /// Create a handle from a concrete grabbable.
    pub fn from_rc<G: Grabbable + 'static>(grabbable: &Rc<G>) -> Self {
        let grabbable: Rc<dyn Grabbable> = grabbable.clone();
        Self::new(&grabbable)
    }

    /// The target, if it is still alive.
    pub fn upgrade(&self) -> Option<Rc<dyn Grabbable>> {
        self.0.upgrade()
    }

    /// Returns true while the target is alive.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    fn addr(&self) -> *const () {
        self.0.as_ptr().cast::<()>()
    }
}

impl PartialEq for GrabbableHandle {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for GrabbableHandle {}

impl core::hash::Hash for GrabbableHandle {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl core::fmt::Debug for GrabbableHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GrabbableHandle")
            .field("addr", &self.addr())
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// A basic [`Grabbable`]: accepted channels, a movable grab collider, and a
/// signal that rebroadcasts every pointer event it receives.
#[derive(Debug)]
pub struct GrabbableComponent {
    allowed: Cell<ChannelSet>,
    collider: Cell<ShapeLocation>,
    cancel_grab: Signal<()>,
    pointer_events: Signal<PointerEvent>,
    last_event: RefCell<Option<PointerEvent>>,
}

impl GrabbableComponent {
    /// Create a grabbable with a fresh grab collider at `position`.
    pub fn new(allowed: ChannelSet, position: Vec3) -> Self {
        Self::with_collider(
            allowed,
            ShapeLocation {
                shape: ShapeId::fresh(),
                position,
            },
        )
    }

    /// Create a grabbable with an explicit grab collider.
    pub fn with_collider(allowed: ChannelSet, collider: ShapeLocation) -> Self {
        Self {
            allowed: Cell::new(allowed),
            collider: Cell::new(collider),
            cancel_grab: Signal::new(),
            pointer_events: Signal::new(),
            last_event: RefCell::new(None),
        }
    }

    /// Channels this grabbable accepts.
    pub fn allowed(&self) -> ChannelSet {
        self.allowed.get()
    }

    /// Replace the accepted channels.
    pub fn set_allowed(&self, allowed: ChannelSet) {
        self.allowed.set(allowed);
    }

    /// The grab collider's shape id.
    pub fn collider_shape(&self) -> ShapeId {
        self.collider.get().shape
    }

    /// Move the grab collider.
    pub fn set_position(&self, position: Vec3) {
        let mut collider = self.collider.get();
        collider.position = position;
        self.collider.set(collider);
    }

    /// Signal carrying every pointer event posted to this grabbable.
    pub fn pointer_events(&self) -> &Signal<PointerEvent> {
        &self.pointer_events
    }

    /// The most recent pointer event, if any.
    pub fn last_event(&self) -> Option<PointerEvent> {
        self.last_event.borrow().clone()
    }

    /// Ask every subscribed interactor to drop its grab.
    pub fn cancel_grab(&self) {
        tracing::debug!(shape = self.collider_shape().get(), "grab cancelled by target");
        self.cancel_grab.emit(&());
    }
}

impl Grabbable for GrabbableComponent {
    fn allows_grab_type(&self, channel: Channel) -> bool {
        self.allowed.get().accepts(channel)
    }

    fn grab_collider(&self) -> ShapeLocation {
        self.collider.get()
    }

    fn cancel_grab_signal(&self) -> &Signal<()> {
        &self.cancel_grab
    }

    fn post_event(&self, event: &PointerEvent) {
        *self.last_event.borrow_mut() = Some(event.clone());
        self.pointer_events.emit(event);
    }
}
