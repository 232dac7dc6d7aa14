// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer events sent from an interactor to grabbable targets.

use crate::grabbable::GrabbableHandle;
use crate::types::{InteractorId, Pose};

/// Kind of a [`PointerEvent`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerEventKind {
    /// A collider started overlapping the target's grab collider.
    Hover,
    /// A collider stopped overlapping the target's grab collider.
    Unhover,
    /// The target was grabbed.
    Select,
    /// The target was released.
    Unselect,
    /// The selecting collider moved while the target is held; sent every tick.
    Move,
}

/// A pointer event delivered through [`Grabbable::post_event`](crate::grabbable::Grabbable::post_event).
#[derive(Clone, Debug)]
pub struct PointerEvent {
    /// What happened.
    pub kind: PointerEventKind,
    /// Interactor orientation, positioned at the selecting collider (or at the
    /// interactor itself when no collider is selecting).
    pub pose: Pose,
    /// The emitting interactor. Stable for the interactor's lifetime, so hosts
    /// use it both as the pointer identifier and to find the interactor again.
    pub interactor: InteractorId,
    /// The target the event is addressed to.
    pub interactable: GrabbableHandle,
}
