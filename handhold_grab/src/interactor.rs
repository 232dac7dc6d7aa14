// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The grab interactor.
//!
//! ## Overview
//!
//! [`GrabInteractor`] owns colliders grouped by [`Channel`], tracks which
//! grabbables overlap them, picks the nearest one as the candidate, and drives
//! a Normal → Hover → Select state machine per collider. The interactor-wide
//! state is always derived as the maximum over its colliders.
//!
//! ## Driving it
//!
//! - A collision source calls [`GrabInteractor::begin_overlap`] and
//!   [`GrabInteractor::end_overlap`] as shapes start and stop touching.
//! - Input code calls [`GrabInteractor::select_pinch`],
//!   [`GrabInteractor::select_palm`] and their unselect counterparts.
//! - The frame loop calls [`GrabInteractor::tick`], which sends `Move` events
//!   to the held target.
//!
//! All of this happens on one thread; nothing here blocks or locks.
//!
//! ## Cancellation
//!
//! A target may cancel a grab through its
//! [`cancel_grab_signal`](crate::grabbable::Grabbable::cancel_grab_signal),
//! including from inside the `Select` notification itself. The interactor
//! subscribes before notifying.
//!
//! A [`SharedGrabInteractor`] (see [`GrabInteractor::into_shared`]) runs the
//! regular unselect path from inside the cancel signal, so queries made right
//! after `cancel_grab` already see the release. When the interactor is busy
//! (the cancel arrives during its own `Select` notification), or when it is
//! not shared, the request is recorded and applied as soon as control returns
//! to it: after the notification, and at the start and end of every entry
//! point.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glam::Vec3;
use tracing::{debug, trace};

use crate::collider::{Candidate, Collider, ColliderInfo, ColliderRegistry};
use crate::conditional::Activatable;
use crate::config::GrabberConfig;
use crate::debug::{DebugCollider, DebugVisualizer, collider_color};
use crate::event::{PointerEvent, PointerEventKind};
use crate::grabbable::{GrabbableHandle, GrabbableLookup};
use crate::signal::{Signal, SubscriptionId};
use crate::types::{Channel, InteractableState, InteractorId, InteractorState, Pose, ShapeId};

/// An overlap report from the collision source.
#[derive(Copy, Clone)]
pub struct Overlap<'a> {
    /// The interactor's collider involved in the overlap.
    pub collider: ShapeId,
    /// The other shape.
    pub other_shape: ShapeId,
    /// Capability lookup on the owner of `other_shape`; `None` if it has no owner.
    pub other_owner: Option<&'a dyn GrabbableLookup>,
}

impl core::fmt::Debug for Overlap<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Overlap")
            .field("collider", &self.collider)
            .field("other_shape", &self.other_shape)
            .field("has_owner", &self.other_owner.is_some())
            .finish()
    }
}

/// Payload of [`GrabInteractor::state_changed`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StateChange {
    /// State before the change.
    pub previous: InteractorState,
    /// State after the change.
    pub current: InteractorState,
}

/// Counts returned by [`GrabInteractor::relationship_counts`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RelationshipCounts {
    /// Overlapped grabbables other than the grabbed one.
    pub hover: usize,
    /// 1 while a live target is grabbed, else 0.
    pub select: usize,
}

/// A [`GrabInteractor`] that the targets it grabs can reach back into.
pub type SharedGrabInteractor = Rc<RefCell<GrabInteractor>>;

/// Grab interactor for one hand or controller.
pub struct GrabInteractor {
    id: InteractorId,
    config: GrabberConfig,
    pose: Pose,
    active: bool,
    activation: Rc<Signal<bool>>,
    state: InteractorState,
    state_changed: Signal<StateChange>,
    colliders: ColliderRegistry,
    default_palm_collider: Option<ShapeId>,
    default_pinch_collider: Option<ShapeId>,
    next_rank_index: u64,
    candidate: Option<GrabbableHandle>,
    overlapped: Vec<GrabbableHandle>,
    selecting: Option<(ShapeId, Channel)>,
    grabbed: Option<GrabbableHandle>,
    is_grabbing: bool,
    cancel_subscription: Option<(GrabbableHandle, SubscriptionId)>,
    cancel_requested: Rc<Cell<bool>>,
    shared: Weak<RefCell<GrabInteractor>>,
    visualizer: Option<Box<dyn DebugVisualizer>>,
}

impl core::fmt::Debug for GrabInteractor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GrabInteractor")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("state", &self.state)
            .field("selecting", &self.selecting)
            .field("is_grabbing", &self.is_grabbing)
            .finish_non_exhaustive()
    }
}

impl Default for GrabInteractor {
    fn default() -> Self {
        Self::new(GrabberConfig::default())
    }
}

impl GrabInteractor {
    /// Create an inactive interactor with no colliders.
    pub fn new(config: GrabberConfig) -> Self {
        Self {
            id: InteractorId::next(),
            config,
            pose: Pose::IDENTITY,
            active: false,
            activation: Rc::new(Signal::new()),
            state: InteractorState::Normal,
            state_changed: Signal::new(),
            colliders: ColliderRegistry::default(),
            default_palm_collider: None,
            default_pinch_collider: None,
            next_rank_index: 0,
            candidate: None,
            overlapped: Vec::new(),
            selecting: None,
            grabbed: None,
            is_grabbing: false,
            cancel_subscription: None,
            cancel_requested: Rc::new(Cell::new(false)),
            shared: Weak::new(),
            visualizer: None,
        }
    }

    /// Move into shared ownership so target cancellation is applied at once.
    ///
    /// A grab already held keeps its target; its cancel subscription is
    /// renewed to reach the shared interactor.
    pub fn into_shared(mut self) -> SharedGrabInteractor {
        Rc::new_cyclic(|weak| {
            self.shared = weak.clone();
            if let Some((target, id)) = self.cancel_subscription.take() {
                if let Some(grabbable) = target.upgrade() {
                    grabbable.cancel_grab_signal().unsubscribe(id);
                }
                self.subscribe_cancel(&target);
            }
            RefCell::new(self)
        })
    }

    /// Stable identifier carried by every event this interactor emits.
    pub fn id(&self) -> InteractorId {
        self.id
    }

    /// Current configuration.
    pub fn config(&self) -> &GrabberConfig {
        &self.config
    }

    /// Interactor world pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Move the interactor; colliders follow through their offsets.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Enable or disable hovering and grabbing with palm colliders.
    pub fn set_allow_palm_grab(&mut self, allow: bool) {
        self.config.allow_palm_grab = allow;
    }

    /// Enable or disable hovering and grabbing with pinch colliders.
    pub fn set_allow_pinch_grab(&mut self, allow: bool) {
        self.config.allow_pinch_grab = allow;
    }

    /// Install or remove the debug visualizer.
    pub fn set_debug_visualizer(&mut self, visualizer: Option<Box<dyn DebugVisualizer>>) {
        self.visualizer = visualizer;
    }

    /// Enable or disable the per-tick debug visualizer call.
    pub fn set_debug_visuals(&mut self, enabled: bool) {
        self.config.debug_visuals = enabled;
    }

    // --- Lifecycle ---

    /// Whether the interactor is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Create default palm and pinch spheres for channels with no colliders,
    /// then mark the interactor active.
    pub fn activate(&mut self) {
        if !self.colliders.has_channel(Channel::Palm) {
            let id = ShapeId::fresh();
            let collider =
                Collider::sphere(self.config.palm_collider_radius).with_offset(self.config.palm_offset);
            self.add_collider(id, Channel::Palm, collider);
            self.default_palm_collider = Some(id);
        }
        if !self.colliders.has_channel(Channel::Pinch) {
            let id = ShapeId::fresh();
            self.add_collider(
                id,
                Channel::Pinch,
                Collider::sphere(self.config.pinch_collider_radius),
            );
            self.default_pinch_collider = Some(id);
        }
        if !self.active {
            self.active = true;
            debug!(interactor = self.id.get(), "interactor activated");
            self.activation.emit(&true);
        }
    }

    /// Release any palm or pinch grab, then mark the interactor inactive.
    pub fn deactivate(&mut self) {
        self.unselect_palm();
        self.unselect_pinch();
        if self.active {
            self.active = false;
            debug!(interactor = self.id.get(), "interactor deactivated");
            self.activation.emit(&false);
        }
    }

    /// End of life: unregister every collider.
    pub fn teardown(&mut self) {
        self.unregister_all_colliders();
    }

    // --- Colliders ---

    /// Register `collider` under `channel`. Returns false if `id` is already registered.
    pub fn add_collider(&mut self, id: ShapeId, channel: Channel, collider: Collider) -> bool {
        let added = self.colliders.insert(id, channel, collider);
        if added {
            trace!(interactor = self.id.get(), collider = id.get(), ?channel, "collider added");
        }
        added
    }

    /// Unregister a collider.
    ///
    /// A selecting collider is unselected first. Targets it was hovering get
    /// `Unhover`. Returns false if `id` is not registered under `channel`.
    pub fn unregister_collider(&mut self, id: ShapeId, channel: Channel) -> bool {
        if self.colliders.get(id, channel).is_none() {
            return false;
        }
        if self.selecting == Some((id, channel)) {
            self.end_select(channel);
        }
        let Some(entry) = self.colliders.remove(id, channel) else {
            return false;
        };
        if self.default_palm_collider == Some(id) {
            self.default_palm_collider = None;
        }
        if self.default_pinch_collider == Some(id) {
            self.default_pinch_collider = None;
        }
        for (_, handle) in &entry.info.hover_objects {
            self.post_event(PointerEventKind::Unhover, Some(handle));
        }
        if let Some(candidate) = &self.candidate
            && entry.info.hover_objects.iter().any(|(_, h)| h == candidate)
            && !self.colliders.is_hovered(candidate)
        {
            self.candidate = self.best_grabbable_any_channel(channel);
        }
        trace!(interactor = self.id.get(), collider = id.get(), ?channel, "collider removed");
        self.update_state();
        self.update_overlapped_set();
        self.apply_pending_cancel();
        true
    }

    /// Unregister every collider of every channel.
    pub fn unregister_all_colliders(&mut self) {
        let all: Vec<(ShapeId, Channel)> =
            self.colliders.iter().map(|(channel, e)| (e.id, channel)).collect();
        for (id, channel) in all {
            self.unregister_collider(id, channel);
        }
    }

    /// Returns true if any collider is registered under `channel`.
    pub fn has_colliders_of(&self, channel: Channel) -> bool {
        self.colliders.has_channel(channel)
    }

    /// Colliders registered under `channel`, in registration order.
    pub fn colliders_of(&self, channel: Channel) -> impl Iterator<Item = ShapeId> + '_ {
        self.colliders.of_channel(channel).iter().map(|e| e.id)
    }

    /// Every registered collider with its channel and world position.
    pub fn colliders(&self) -> impl Iterator<Item = (ShapeId, Channel, Collider, Vec3)> + '_ {
        self.colliders
            .iter()
            .map(|(channel, e)| (e.id, channel, e.collider, e.world_position(&self.pose)))
    }

    /// Channel a collider is registered under.
    pub fn collider_channel(&self, id: ShapeId) -> Option<Channel> {
        self.colliders.channel_of(id)
    }

    /// Bookkeeping for a collider.
    pub fn collider_info(&self, id: ShapeId) -> Option<&ColliderInfo> {
        let channel = self.colliders.channel_of(id)?;
        self.colliders.get(id, channel).map(|e| &e.info)
    }

    /// World position of a collider.
    pub fn collider_world_position(&self, id: ShapeId) -> Option<Vec3> {
        let channel = self.colliders.channel_of(id)?;
        self.colliders
            .get(id, channel)
            .map(|e| e.world_position(&self.pose))
    }

    /// Move a collider relative to the interactor. Returns false if unknown.
    pub fn set_collider_offset(&mut self, id: ShapeId, offset: Vec3) -> bool {
        let Some(channel) = self.colliders.channel_of(id) else {
            return false;
        };
        match self.colliders.get_mut(id, channel) {
            Some(entry) => {
                entry.collider.offset = offset;
                true
            }
            None => false,
        }
    }

    /// Move the default palm sphere, if one was created.
    pub fn update_palm_offset(&mut self, offset: Vec3) {
        self.config.palm_offset = offset;
        if let Some(id) = self.default_palm_collider {
            self.set_collider_offset(id, offset);
        }
    }

    /// The palm sphere created by [`activate`](Self::activate), if any.
    pub fn default_palm_collider(&self) -> Option<ShapeId> {
        self.default_palm_collider
    }

    /// The pinch sphere created by [`activate`](Self::activate), if any.
    pub fn default_pinch_collider(&self) -> Option<ShapeId> {
        self.default_pinch_collider
    }

    // --- Overlaps ---

    /// A shape started overlapping one of this interactor's colliders.
    pub fn begin_overlap(&mut self, overlap: &Overlap<'_>) {
        self.apply_pending_cancel();
        self.track_overlap_begin(overlap);
        self.update_overlapped_set();
        self.apply_pending_cancel();
    }

    /// A shape stopped overlapping one of this interactor's colliders.
    pub fn end_overlap(&mut self, overlap: &Overlap<'_>) {
        self.apply_pending_cancel();
        if self.track_overlap_end(overlap) {
            self.update_overlapped_set();
        }
        self.apply_pending_cancel();
    }

    fn track_overlap_begin(&mut self, overlap: &Overlap<'_>) {
        let Some(channel) = self.colliders.channel_of(overlap.collider) else {
            trace!(collider = overlap.collider.get(), "overlap on unregistered collider ignored");
            return;
        };
        let Some(owner) = overlap.other_owner else {
            trace!(shape = overlap.other_shape.get(), "overlap with ownerless shape ignored");
            return;
        };
        let Some(grabbable) = owner.find_grabbable() else {
            return;
        };
        if grabbable.grab_collider().shape != overlap.other_shape {
            trace!(shape = overlap.other_shape.get(), "overlap with non-grab collider ignored");
            return;
        }
        if !grabbable.allows_grab_type(channel) || !self.channel_enabled(channel) {
            trace!(?channel, "overlap rejected for channel");
            return;
        }

        let handle = GrabbableHandle::new(&grabbable);
        let rank_index = self.next_rank_index;
        self.next_rank_index += 1;
        if let Some(entry) = self.colliders.get_mut(overlap.collider, channel) {
            entry.info.insert_hover(overlap.other_shape, handle.clone());
            entry.info.rank_index = rank_index;
            if entry.info.state == InteractorState::Normal {
                entry.info.state = InteractorState::Hover;
            }
        }
        self.post_event(PointerEventKind::Hover, Some(&handle));
        self.candidate = self.best_grabbable(channel);
        self.update_state();
    }

    /// Returns false when the report was for an unregistered collider.
    fn track_overlap_end(&mut self, overlap: &Overlap<'_>) -> bool {
        let Some(channel) = self.colliders.channel_of(overlap.collider) else {
            return false;
        };

        let mut unhovered = None;
        if let Some(entry) = self.colliders.get_mut(overlap.collider, channel)
            && let Some(handle) = entry.info.remove_hover(overlap.other_shape)
        {
            if entry.info.hover_objects.is_empty() && entry.info.state != InteractorState::Select {
                entry.info.state = InteractorState::Normal;
            }
            unhovered = Some(handle);
        }
        if let Some(handle) = &unhovered {
            self.post_event(PointerEventKind::Unhover, Some(handle));
        }

        if let Some(grabbable) = overlap.other_owner.and_then(|o| o.find_grabbable()) {
            let handle = GrabbableHandle::new(&grabbable);
            if self.candidate.as_ref() == Some(&handle) {
                self.candidate = self.best_grabbable(channel);
            }
            self.update_state();
        }
        true
    }

    fn channel_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::Palm => self.config.allow_palm_grab,
            Channel::Pinch => self.config.allow_pinch_grab,
            Channel::Custom | Channel::Unknown => true,
        }
    }

    /// Nearest hovered pair for `channel`, if any.
    pub fn best_candidate(&self, channel: Channel) -> Option<Candidate> {
        self.colliders.best_candidate(channel, &self.pose)
    }

    fn best_grabbable(&self, channel: Channel) -> Option<GrabbableHandle> {
        self.best_candidate(channel).map(|c| c.grabbable)
    }

    /// Nearest candidate over every channel, `preferred` first on ties.
    fn best_grabbable_any_channel(&self, preferred: Channel) -> Option<GrabbableHandle> {
        let mut best: Option<Candidate> = None;
        let channels = core::iter::once(preferred)
            .chain(Channel::ALL.into_iter().filter(|c| *c != preferred));
        for channel in channels {
            if let Some(found) = self.best_candidate(channel)
                && best
                    .as_ref()
                    .is_none_or(|b| found.distance_squared < b.distance_squared)
            {
                best = Some(found);
            }
        }
        best.map(|c| c.grabbable)
    }

    // --- Selection ---

    /// Grab with the pinch channel. No-op while inactive.
    pub fn select_pinch(&mut self) {
        if self.active {
            self.select_by_grab_type(Channel::Pinch);
        }
    }

    /// Grab with the palm channel. No-op while inactive.
    pub fn select_palm(&mut self) {
        if self.active {
            self.select_by_grab_type(Channel::Palm);
        }
    }

    /// Release a pinch grab. No-op while inactive.
    pub fn unselect_pinch(&mut self) {
        if self.active {
            self.unselect_by_grab_type(Channel::Pinch);
        }
    }

    /// Release a palm grab. No-op while inactive.
    pub fn unselect_palm(&mut self) {
        if self.active {
            self.unselect_by_grab_type(Channel::Palm);
        }
    }

    /// Grab the best candidate of `channel`.
    ///
    /// Does nothing if something is already held or the channel has no candidate.
    pub fn select_by_grab_type(&mut self, channel: Channel) {
        self.apply_pending_cancel();
        self.begin_select(channel);
        self.apply_pending_cancel();
    }

    /// Release the grab if it was made with `channel`.
    pub fn unselect_by_grab_type(&mut self, channel: Channel) {
        self.apply_pending_cancel();
        self.end_select(channel);
    }

    fn begin_select(&mut self, channel: Channel) {
        if self.state == InteractorState::Select {
            return;
        }
        let Some(best) = self.best_candidate(channel) else {
            return;
        };
        let Some(entry) = self.colliders.get_mut(best.collider, channel) else {
            return;
        };
        entry.info.state = InteractorState::Select;
        entry.info.select_object = Some(best.grabbable.clone());
        self.selecting = Some((best.collider, channel));
        self.grabbed = Some(best.grabbable.clone());
        self.is_grabbing = true;
        self.update_state();
        self.update_overlapped_set();

        // Listen before notifying: the target may cancel from inside Select.
        self.subscribe_cancel(&best.grabbable);
        debug!(
            interactor = self.id.get(),
            collider = best.collider.get(),
            ?channel,
            "grab started"
        );
        self.post_event(PointerEventKind::Select, Some(&best.grabbable));
    }

    fn end_select(&mut self, channel: Channel) {
        if let Some((collider, selecting_channel)) = self.selecting
            && selecting_channel == channel
        {
            let mut released = None;
            if let Some(entry) = self.colliders.get_mut(collider, channel) {
                released = entry.info.select_object.take();
                entry.info.state = if entry.info.hover_objects.is_empty() {
                    InteractorState::Normal
                } else {
                    InteractorState::Hover
                };
            }
            if let Some(handle) = &released {
                self.post_event(PointerEventKind::Unselect, Some(handle));
            }
            self.selecting = None;
            if self.is_grabbing {
                self.unsubscribe_cancel();
                self.grabbed = None;
                self.is_grabbing = false;
            }
            debug!(interactor = self.id.get(), ?channel, "grab released");
        }
        self.update_state();
        self.update_overlapped_set();
    }

    fn subscribe_cancel(&mut self, target: &GrabbableHandle) {
        if let Some((subscribed, _)) = &self.cancel_subscription {
            if subscribed == target {
                return;
            }
            self.unsubscribe_cancel();
        }
        let Some(grabbable) = target.upgrade() else {
            return;
        };
        let requested = Rc::clone(&self.cancel_requested);
        let shared = self.shared.clone();
        let id = grabbable.cancel_grab_signal().subscribe(move |_| {
            requested.set(true);
            // A busy interactor picks the request up when its call returns.
            if let Some(cell) = shared.upgrade()
                && let Ok(mut interactor) = cell.try_borrow_mut()
            {
                interactor.apply_pending_cancel();
            }
        });
        self.cancel_subscription = Some((target.clone(), id));
    }

    fn unsubscribe_cancel(&mut self) {
        if let Some((target, id)) = self.cancel_subscription.take()
            && let Some(grabbable) = target.upgrade()
        {
            grabbable.cancel_grab_signal().unsubscribe(id);
        }
        self.cancel_requested.set(false);
    }

    /// Run the unselect path if the held target asked to cancel.
    ///
    /// Entry points call this already, and a shared interactor is released
    /// from inside the cancel signal. Hosts only need it for an unshared
    /// interactor whose target cancelled since the last call.
    pub fn apply_pending_cancel(&mut self) {
        if !self.cancel_requested.replace(false) {
            return;
        }
        if let Some((_, channel)) = self.selecting {
            debug!(interactor = self.id.get(), ?channel, "grab cancelled by target");
            self.end_select(channel);
        }
    }

    // --- Frame update ---

    /// Per-frame update: debug visuals, then `Move` to the held target.
    pub fn tick(&mut self) {
        self.apply_pending_cancel();
        if self.config.debug_visuals {
            self.draw_debug_visuals();
        }
        if self.state == InteractorState::Select
            && let Some((collider, channel)) = self.selecting
            && let Some(entry) = self.colliders.get(collider, channel)
        {
            let target = entry.info.select_object.clone();
            self.post_event(PointerEventKind::Move, target.as_ref());
        }
        self.apply_pending_cancel();
    }

    fn draw_debug_visuals(&mut self) {
        if !self.active {
            return;
        }
        let Some(visualizer) = self.visualizer.as_mut() else {
            return;
        };
        let pose = self.pose;
        for (channel, entry) in self.colliders.iter() {
            visualizer.draw_collider(&DebugCollider {
                id: entry.id,
                channel,
                shape: entry.collider.shape,
                position: entry.world_position(&pose),
                orientation: pose.orientation,
                color: collider_color(self.state, channel),
            });
        }
    }

    fn post_event(&self, kind: PointerEventKind, target: Option<&GrabbableHandle>) {
        let Some(handle) = target else {
            return;
        };
        let Some(grabbable) = handle.upgrade() else {
            return;
        };
        let event = PointerEvent {
            kind,
            pose: Pose {
                position: self.selecting_collider_position(),
                orientation: self.pose.orientation,
            },
            interactor: self.id,
            interactable: handle.clone(),
        };
        grabbable.post_event(&event);
    }

    fn update_state(&mut self) {
        let current = self.colliders.aggregate_state();
        if current != self.state {
            let previous = core::mem::replace(&mut self.state, current);
            debug!(interactor = self.id.get(), ?previous, ?current, "interactor state changed");
            self.state_changed.emit(&StateChange { previous, current });
        }
    }

    fn update_overlapped_set(&mut self) {
        self.overlapped = self.colliders.overlapped();
    }

    // --- Queries ---

    /// Aggregate state.
    pub fn state(&self) -> InteractorState {
        self.state
    }

    /// Fired whenever the aggregate state changes.
    pub fn state_changed(&self) -> &Signal<StateChange> {
        &self.state_changed
    }

    /// Returns true if a live candidate exists.
    pub fn has_candidate(&self) -> bool {
        self.candidate().is_some()
    }

    /// The current candidate, if alive.
    pub fn candidate(&self) -> Option<&GrabbableHandle> {
        self.candidate.as_ref().filter(|c| c.is_alive())
    }

    /// Returns true while the aggregate state is Hover.
    pub fn has_interactable(&self) -> bool {
        self.state == InteractorState::Hover
    }

    /// Returns true while the aggregate state is Select.
    pub fn has_selected_interactable(&self) -> bool {
        self.state == InteractorState::Select
    }

    /// Live grabbables overlapping any collider, plus live select objects.
    pub fn overlapped_grabbables(&self) -> &[GrabbableHandle] {
        &self.overlapped
    }

    /// The collider that started the current grab, with its channel.
    pub fn selecting_collider(&self) -> Option<(ShapeId, Channel)> {
        self.selecting
    }

    /// World position of the selecting collider, or of the interactor if none.
    pub fn selecting_collider_position(&self) -> Vec3 {
        self.selecting
            .and_then(|(id, channel)| self.colliders.get(id, channel))
            .map_or(self.pose.position, |e| e.world_position(&self.pose))
    }

    /// The raw "is grabbing" flag.
    pub fn is_grabbing(&self) -> bool {
        self.is_grabbing
    }

    /// Whether a live target is grabbed, and which.
    pub fn grabbing_state(&self) -> (bool, Option<GrabbableHandle>) {
        let target = self.grabbed.clone().filter(|g| g.is_alive());
        (self.is_grabbing && target.is_some(), target)
    }

    /// Number of hovered and selected grabbables.
    pub fn relationship_counts(&self) -> RelationshipCounts {
        RelationshipCounts {
            hover: self.relationships(InteractableState::Hover).len(),
            select: self.relationships(InteractableState::Select).len(),
        }
    }

    /// Grabbables in the given relationship to this interactor.
    pub fn relationships(&self, state: InteractableState) -> Vec<GrabbableHandle> {
        let grabbed = self.grabbed.as_ref().filter(|g| g.is_alive());
        match state {
            InteractableState::Select => grabbed.into_iter().cloned().collect(),
            InteractableState::Hover => self
                .overlapped
                .iter()
                .filter(|h| h.is_alive() && Some(*h) != grabbed)
                .cloned()
                .collect(),
            InteractableState::Normal | InteractableState::Disabled => Vec::new(),
        }
    }
}

impl Activatable for GrabInteractor {
    fn is_active(&self) -> bool {
        self.active
    }

    fn activation_signal(&self) -> Rc<Signal<bool>> {
        Rc::clone(&self.activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditional::ActiveConditional;
    use crate::grabbable::{Grabbable, GrabbableComponent};
    use crate::types::ChannelSet;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<PointerEventKind>>>;

    fn grabbable(allowed: ChannelSet, position: Vec3) -> (Rc<GrabbableComponent>, Log) {
        let g = Rc::new(GrabbableComponent::new(allowed, position));
        let log: Log = Rc::default();
        let sink = Rc::clone(&log);
        g.pointer_events()
            .subscribe(move |e| sink.borrow_mut().push(e.kind));
        (g, log)
    }

    fn hand() -> GrabInteractor {
        let mut hand = GrabInteractor::default();
        hand.activate();
        hand
    }

    fn pinch(hand: &GrabInteractor) -> ShapeId {
        hand.default_pinch_collider().unwrap()
    }

    fn palm(hand: &GrabInteractor) -> ShapeId {
        hand.default_palm_collider().unwrap()
    }

    fn touch(hand: &mut GrabInteractor, collider: ShapeId, g: &Rc<GrabbableComponent>) {
        hand.begin_overlap(&Overlap {
            collider,
            other_shape: g.collider_shape(),
            other_owner: Some(g),
        });
    }

    fn leave(hand: &mut GrabInteractor, collider: ShapeId, g: &Rc<GrabbableComponent>) {
        hand.end_overlap(&Overlap {
            collider,
            other_shape: g.collider_shape(),
            other_owner: Some(g),
        });
    }

    #[test]
    fn activation_creates_default_colliders_once() {
        let mut hand = GrabInteractor::default();
        assert!(!hand.is_active());
        assert!(!hand.has_colliders_of(Channel::Palm));
        hand.activate();
        assert!(hand.is_active());
        assert_eq!(hand.colliders_of(Channel::Palm).count(), 1);
        assert_eq!(hand.colliders_of(Channel::Pinch).count(), 1);
        hand.deactivate();
        hand.activate();
        assert_eq!(hand.colliders_of(Channel::Palm).count(), 1);
        assert_eq!(hand.colliders_of(Channel::Pinch).count(), 1);
    }

    #[test]
    fn explicit_colliders_suppress_defaults() {
        let mut hand = GrabInteractor::default();
        let custom_palm = ShapeId::fresh();
        assert!(hand.add_collider(custom_palm, Channel::Palm, Collider::sphere(0.1)));
        hand.activate();
        assert_eq!(hand.colliders_of(Channel::Palm).collect::<Vec<_>>(), vec![custom_palm]);
        assert!(hand.default_palm_collider().is_none());
        assert!(hand.default_pinch_collider().is_some());
    }

    #[test]
    fn hover_grab_move_release_sequence() {
        let mut hand = hand();
        hand.set_pose(Pose::from_position(Vec3::new(1.0, 2.0, 3.0)));
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::new(1.0, 2.0, 3.0));
        let pinch = pinch(&hand);

        touch(&mut hand, pinch, &g);
        assert_eq!(hand.state(), InteractorState::Hover);
        assert!(hand.has_interactable());
        assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&g)));
        assert_eq!(hand.collider_info(pinch).unwrap().state(), InteractorState::Hover);

        hand.select_pinch();
        assert_eq!(hand.state(), InteractorState::Select);
        assert!(hand.has_selected_interactable());
        assert_eq!(hand.selecting_collider(), Some((pinch, Channel::Pinch)));
        let (grabbing, target) = hand.grabbing_state();
        assert!(grabbing);
        assert_eq!(target, Some(GrabbableHandle::from_rc(&g)));

        hand.tick();
        let moved = g.last_event().unwrap();
        assert_eq!(moved.kind, PointerEventKind::Move);
        assert_eq!(moved.interactor, hand.id());
        assert_eq!(moved.pose.position, Vec3::new(1.0, 2.0, 3.0));

        hand.unselect_pinch();
        assert_eq!(hand.state(), InteractorState::Hover);
        assert!(hand.collider_info(pinch).unwrap().select_object().is_none());
        assert!(!hand.grabbing_state().0);

        leave(&mut hand, pinch, &g);
        assert_eq!(hand.state(), InteractorState::Normal);
        assert!(hand.overlapped_grabbables().is_empty());
        assert_eq!(
            *log.borrow(),
            vec![
                PointerEventKind::Hover,
                PointerEventKind::Select,
                PointerEventKind::Move,
                PointerEventKind::Unselect,
                PointerEventKind::Unhover,
            ]
        );
    }

    #[test]
    fn overlap_on_unregistered_collider_is_ignored() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        touch(&mut hand, ShapeId::fresh(), &g);
        assert_eq!(hand.state(), InteractorState::Normal);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn overlap_with_non_grab_collider_is_ignored() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let collider = pinch(&hand);
        hand.begin_overlap(&Overlap {
            collider,
            other_shape: ShapeId::fresh(),
            other_owner: Some(&g),
        });
        hand.begin_overlap(&Overlap {
            collider,
            other_shape: g.collider_shape(),
            other_owner: None,
        });
        assert_eq!(hand.state(), InteractorState::Normal);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn overlap_rejected_when_channel_not_accepted_or_disabled() {
        let mut hand = hand();
        let (palm_only, palm_log) = grabbable(ChannelSet::PALM, Vec3::ZERO);
        let pinch_id = pinch(&hand);
        touch(&mut hand, pinch_id, &palm_only);
        assert!(palm_log.borrow().is_empty());

        hand.set_allow_palm_grab(false);
        let palm_id = palm(&hand);
        touch(&mut hand, palm_id, &palm_only);
        assert!(palm_log.borrow().is_empty());
        assert_eq!(hand.state(), InteractorState::Normal);

        hand.set_allow_palm_grab(true);
        touch(&mut hand, palm_id, &palm_only);
        assert_eq!(*palm_log.borrow(), vec![PointerEventKind::Hover]);
    }

    #[test]
    fn end_overlap_of_unknown_shape_changes_nothing() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let (other, other_log) = grabbable(ChannelSet::HAND, Vec3::X);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        leave(&mut hand, pinch, &other);
        assert_eq!(hand.state(), InteractorState::Hover);
        assert_eq!(*log.borrow(), vec![PointerEventKind::Hover]);
        assert!(other_log.borrow().is_empty());
    }

    #[test]
    fn nearest_grabbable_becomes_candidate() {
        let mut hand = hand();
        let (far, _) = grabbable(ChannelSet::HAND, Vec3::new(0.0, 0.0, 0.5));
        let (near, near_log) = grabbable(ChannelSet::HAND, Vec3::new(0.0, 0.0, 0.1));
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &far);
        assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&far)));
        touch(&mut hand, pinch, &near);
        assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&near)));

        hand.select_pinch();
        assert_eq!(
            *near_log.borrow(),
            vec![PointerEventKind::Hover, PointerEventKind::Select]
        );

        hand.unselect_pinch();
        leave(&mut hand, pinch, &near);
        assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&far)));
    }

    #[test]
    fn select_without_candidate_or_while_holding_is_noop() {
        let mut hand = hand();
        hand.select_pinch();
        assert_eq!(hand.state(), InteractorState::Normal);
        assert!(hand.selecting_collider().is_none());

        let (a, a_log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let (b, b_log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let (pinch, palm) = (pinch(&hand), palm(&hand));
        touch(&mut hand, pinch, &a);
        touch(&mut hand, palm, &b);
        hand.select_pinch();
        hand.select_palm();
        assert_eq!(hand.selecting_collider(), Some((pinch, Channel::Pinch)));
        assert_eq!(*a_log.borrow(), vec![PointerEventKind::Hover, PointerEventKind::Select]);
        assert_eq!(*b_log.borrow(), vec![PointerEventKind::Hover]);
    }

    #[test]
    fn unselect_of_other_channel_keeps_grab() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        hand.select_pinch();
        hand.unselect_palm();
        assert_eq!(hand.state(), InteractorState::Select);
        assert!(!log.borrow().contains(&PointerEventKind::Unselect));
    }

    #[test]
    fn inactive_interactor_ignores_hand_selection() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        hand.deactivate();
        hand.select_pinch();
        assert_eq!(hand.state(), InteractorState::Hover);
        assert_eq!(*log.borrow(), vec![PointerEventKind::Hover]);
    }

    #[test]
    fn leaving_the_held_object_keeps_the_grab() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        hand.select_pinch();
        leave(&mut hand, pinch, &g);

        assert_eq!(hand.state(), InteractorState::Select);
        let info = hand.collider_info(pinch).unwrap();
        assert!(info.hover_objects().is_empty());
        assert_eq!(info.select_object(), Some(&GrabbableHandle::from_rc(&g)));
        assert_eq!(hand.overlapped_grabbables(), &[GrabbableHandle::from_rc(&g)]);

        hand.tick();
        hand.unselect_pinch();
        assert_eq!(hand.state(), InteractorState::Normal);
        assert!(hand.collider_info(pinch).unwrap().select_object().is_none());
        assert!(hand.overlapped_grabbables().is_empty());
        assert_eq!(
            *log.borrow(),
            vec![
                PointerEventKind::Hover,
                PointerEventKind::Select,
                PointerEventKind::Unhover,
                PointerEventKind::Move,
                PointerEventKind::Unselect,
            ]
        );

        // Returning to the released object is an ordinary hover again.
        touch(&mut hand, pinch, &g);
        leave(&mut hand, pinch, &g);
        assert_eq!(hand.state(), InteractorState::Normal);
        assert!(hand.collider_info(pinch).unwrap().select_object().is_none());
    }

    #[test]
    fn cancel_during_select_notification_releases_grab() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let weak = Rc::downgrade(&g);
        g.pointer_events().subscribe(move |e| {
            if e.kind == PointerEventKind::Select
                && let Some(g) = weak.upgrade()
            {
                g.cancel_grab();
            }
        });
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        hand.select_pinch();

        assert_eq!(hand.state(), InteractorState::Hover);
        assert!(hand.selecting_collider().is_none());
        assert!(!hand.is_grabbing());
        assert!(g.cancel_grab_signal().is_empty());
        assert_eq!(
            *log.borrow(),
            vec![
                PointerEventKind::Hover,
                PointerEventKind::Select,
                PointerEventKind::Unselect,
            ]
        );
    }

    #[test]
    fn cancel_between_frames_stops_move_events() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        hand.select_pinch();
        assert_eq!(g.cancel_grab_signal().len(), 1);

        g.cancel_grab();
        hand.tick();
        assert_eq!(hand.state(), InteractorState::Hover);
        assert_eq!(
            *log.borrow(),
            vec![
                PointerEventKind::Hover,
                PointerEventKind::Select,
                PointerEventKind::Unselect,
            ]
        );

        g.cancel_grab();
        hand.tick();
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn shared_interactor_releases_as_soon_as_target_cancels() {
        let hand = GrabInteractor::default().into_shared();
        hand.borrow_mut().activate();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand.borrow());
        touch(&mut hand.borrow_mut(), pinch, &g);
        hand.borrow_mut().select_pinch();
        assert!(hand.borrow().has_selected_interactable());

        g.cancel_grab();

        let hand = hand.borrow();
        assert_eq!(hand.state(), InteractorState::Hover);
        assert!(!hand.has_selected_interactable());
        assert_eq!(hand.grabbing_state(), (false, None));
        assert!(hand.selecting_collider().is_none());
        assert!(g.cancel_grab_signal().is_empty());
        assert_eq!(
            *log.borrow(),
            vec![
                PointerEventKind::Hover,
                PointerEventKind::Select,
                PointerEventKind::Unselect,
            ]
        );
    }

    #[test]
    fn shared_interactor_defers_cancel_raised_inside_select() {
        let hand = GrabInteractor::default().into_shared();
        hand.borrow_mut().activate();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let weak = Rc::downgrade(&g);
        g.pointer_events().subscribe(move |e| {
            if e.kind == PointerEventKind::Select
                && let Some(g) = weak.upgrade()
            {
                g.cancel_grab();
            }
        });
        let pinch = pinch(&hand.borrow());
        touch(&mut hand.borrow_mut(), pinch, &g);
        hand.borrow_mut().select_pinch();

        assert_eq!(hand.borrow().state(), InteractorState::Hover);
        assert_eq!(log.borrow().last(), Some(&PointerEventKind::Unselect));
        assert!(g.cancel_grab_signal().is_empty());
    }

    #[test]
    fn sharing_while_holding_renews_cancel_subscription() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        hand.select_pinch();

        let hand = hand.into_shared();
        assert_eq!(g.cancel_grab_signal().len(), 1);
        assert!(hand.borrow().has_selected_interactable());

        g.cancel_grab();
        assert_eq!(hand.borrow().state(), InteractorState::Hover);
        assert_eq!(log.borrow().last(), Some(&PointerEventKind::Unselect));
    }

    #[test]
    fn deactivate_releases_grab_and_notifies_conditional() {
        let mut hand = hand();
        let mut active = ActiveConditional::new();
        active.set_component(&hand);
        assert!(active.value());

        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let palm = palm(&hand);
        touch(&mut hand, palm, &g);
        hand.select_palm();
        hand.deactivate();

        assert!(!active.value());
        assert_eq!(hand.state(), InteractorState::Hover);
        assert_eq!(log.borrow().last(), Some(&PointerEventKind::Unselect));
    }

    #[test]
    fn dead_grabbables_are_skipped() {
        let mut hand = hand();
        let (g, _) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        assert!(hand.has_candidate());
        drop(g);

        assert!(!hand.has_candidate());
        assert!(hand.relationships(InteractableState::Hover).is_empty());
        hand.select_pinch();
        assert_ne!(hand.state(), InteractorState::Select);
    }

    #[test]
    fn removing_selecting_collider_unselects_first() {
        let mut hand = hand();
        let (g, log) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        hand.select_pinch();

        assert!(hand.unregister_collider(pinch, Channel::Pinch));
        assert!(!hand.unregister_collider(pinch, Channel::Pinch));
        assert_eq!(hand.state(), InteractorState::Normal);
        assert!(hand.selecting_collider().is_none());
        assert!(!hand.has_candidate());
        assert!(hand.overlapped_grabbables().is_empty());
        assert_eq!(
            *log.borrow(),
            vec![
                PointerEventKind::Hover,
                PointerEventKind::Select,
                PointerEventKind::Unselect,
                PointerEventKind::Unhover,
            ]
        );
    }

    #[test]
    fn removing_one_collider_keeps_candidate_hovered_elsewhere() {
        let mut hand = hand();
        let (g, _) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let (pinch, palm) = (pinch(&hand), palm(&hand));
        touch(&mut hand, pinch, &g);
        touch(&mut hand, palm, &g);
        assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&g)));

        assert!(hand.unregister_collider(palm, Channel::Palm));
        assert_eq!(hand.state(), InteractorState::Hover);
        assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&g)));
        assert_eq!(hand.collider_info(pinch).unwrap().hover_objects().len(), 1);
    }

    #[test]
    fn removing_candidate_collider_falls_back_to_other_channels() {
        let mut hand = hand();
        let (a, _) = grabbable(ChannelSet::HAND, Vec3::new(0.0, 0.0, 0.3));
        let (b, _) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let (pinch, palm) = (pinch(&hand), palm(&hand));
        touch(&mut hand, palm, &a);
        touch(&mut hand, pinch, &b);
        assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&b)));

        hand.unregister_collider(pinch, Channel::Pinch);
        assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&a)));

        hand.unregister_collider(palm, Channel::Palm);
        assert!(!hand.has_candidate());
    }

    #[test]
    fn teardown_unregisters_everything() {
        let mut hand = hand();
        let (g, _) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let palm = palm(&hand);
        touch(&mut hand, palm, &g);
        hand.teardown();
        assert!(!hand.has_colliders_of(Channel::Palm));
        assert!(!hand.has_colliders_of(Channel::Pinch));
        assert_eq!(hand.state(), InteractorState::Normal);
    }

    #[test]
    fn state_changes_are_signalled() {
        let mut hand = hand();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        hand.state_changed()
            .subscribe(move |c: &StateChange| sink.borrow_mut().push((c.previous, c.current)));
        let (g, _) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let pinch = pinch(&hand);
        touch(&mut hand, pinch, &g);
        touch(&mut hand, pinch, &g);
        hand.select_pinch();
        hand.unselect_pinch();
        let (normal, hover, select) = (
            InteractorState::Normal,
            InteractorState::Hover,
            InteractorState::Select,
        );
        assert_eq!(
            *log.borrow(),
            vec![(normal, hover), (hover, select), (select, hover)]
        );
    }

    #[test]
    fn relationships_split_hover_and_select() {
        let mut hand = hand();
        let (a, _) = grabbable(ChannelSet::HAND, Vec3::ZERO);
        let (b, _) = grabbable(ChannelSet::HAND, Vec3::ONE);
        let (pinch, palm) = (pinch(&hand), palm(&hand));
        touch(&mut hand, pinch, &a);
        touch(&mut hand, palm, &b);
        assert_eq!(
            hand.relationship_counts(),
            RelationshipCounts { hover: 2, select: 0 }
        );

        hand.select_pinch();
        assert_eq!(
            hand.relationship_counts(),
            RelationshipCounts { hover: 1, select: 1 }
        );
        assert_eq!(
            hand.relationships(InteractableState::Select),
            vec![GrabbableHandle::from_rc(&a)]
        );
        assert_eq!(
            hand.relationships(InteractableState::Hover),
            vec![GrabbableHandle::from_rc(&b)]
        );
        assert!(hand.relationships(InteractableState::Disabled).is_empty());
    }

    #[test]
    fn palm_offset_moves_default_palm() {
        let mut hand = hand();
        let palm = palm(&hand);
        hand.update_palm_offset(Vec3::new(0.0, -0.05, 0.0));
        assert_eq!(
            hand.collider_world_position(palm),
            Some(Vec3::new(0.0, -0.05, 0.0))
        );
        assert_eq!(hand.config().palm_offset, Vec3::new(0.0, -0.05, 0.0));
    }

    struct Recorder(Rc<RefCell<Vec<DebugCollider>>>);

    impl DebugVisualizer for Recorder {
        fn draw_collider(&mut self, collider: &DebugCollider) {
            self.0.borrow_mut().push(*collider);
        }
    }

    #[test]
    fn debug_visuals_draw_every_collider_when_enabled() {
        let mut hand = hand();
        let drawn = Rc::new(RefCell::new(Vec::new()));
        hand.set_debug_visualizer(Some(Box::new(Recorder(Rc::clone(&drawn)))));
        hand.tick();
        assert!(drawn.borrow().is_empty());

        hand.set_debug_visuals(true);
        hand.tick();
        assert_eq!(drawn.borrow().len(), 2);
        assert_eq!(drawn.borrow()[0].channel, Channel::Palm);
        assert_eq!(drawn.borrow()[1].channel, Channel::Pinch);

        hand.deactivate();
        hand.tick();
        assert_eq!(drawn.borrow().len(), 2);
    }
}
