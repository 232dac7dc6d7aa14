// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collider registry and per-collider bookkeeping.
//!
//! ## Overview
//!
//! Colliders are grouped by [`Channel`]. Each one carries a [`ColliderInfo`]:
//! the grabbables currently overlapping it (its hover set), its own
//! [`InteractorState`], the object it selected, and a rank index.
//!
//! Everything the interactor derives (aggregate state, overlapped set, best
//! candidate) is recomputed from these records rather than patched in place.
//!
//! ## Iteration order
//!
//! Channels are visited in [`Channel::ALL`] order, colliders in registration
//! order, and hover entries in insertion order. Candidate resolution relies on
//! this order to break distance ties: the first pair seen wins.

use glam::Vec3;

use crate::grabbable::GrabbableHandle;
use crate::types::{Channel, InteractorState, Pose, ShapeId};

/// Geometry of a collider, used for debug visualization.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColliderShape {
    /// A sphere.
    Sphere {
        /// Radius in meters.
        radius: f32,
    },
    /// An oriented box.
    Box {
        /// Half size along each local axis.
        half_extents: Vec3,
    },
    /// Any other shape, approximated by its local bounds.
    Bounds {
        /// Half size of the local bounding box.
        half_extents: Vec3,
    },
}

/// A collider attached to an interactor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collider {
    /// Collider geometry.
    pub shape: ColliderShape,
    /// Offset from the interactor pose, in the interactor's local frame.
    pub offset: Vec3,
}

impl Collider {
    /// A sphere of `radius` at the interactor origin.
    pub const fn sphere(radius: f32) -> Self {
        Self {
            shape: ColliderShape::Sphere { radius },
            offset: Vec3::ZERO,
        }
    }

    /// Move the collider to `offset`.
    pub const fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// Mutable record kept for every registered collider.
#[derive(Clone, Debug, Default)]
pub struct ColliderInfo {
    pub(crate) hover_objects: Vec<(ShapeId, GrabbableHandle)>,
    pub(crate) state: InteractorState,
    pub(crate) select_object: Option<GrabbableHandle>,
    pub(crate) rank_index: u64,
}

impl ColliderInfo {
    /// Grab colliders currently overlapping this collider, with their owners.
    pub fn hover_objects(&self) -> &[(ShapeId, GrabbableHandle)] {
        &self.hover_objects
    }

    /// Returns true if `shape` is in the hover set.
    pub fn is_hovering(&self, shape: ShapeId) -> bool {
        self.hover_objects.iter().any(|(s, _)| *s == shape)
    }

    /// This collider's own state.
    pub fn state(&self) -> InteractorState {
        self.state
    }

    /// The object this collider selected, if any.
    pub fn select_object(&self) -> Option<&GrabbableHandle> {
        self.select_object.as_ref()
    }

    /// Rank assigned when the most recent hover began on this collider.
    ///
    /// Stored for callers that want recency ordering; candidate resolution
    /// uses distance only.
    pub fn rank_index(&self) -> u64 {
        self.rank_index
    }

    /// Insert `shape` unless present. Returns true if it was inserted.
    pub(crate) fn insert_hover(&mut self, shape: ShapeId, grabbable: GrabbableHandle) -> bool {
        if self.is_hovering(shape) {
            return false;
        }
        self.hover_objects.push((shape, grabbable));
        true
    }

    /// Remove `shape`, returning the grabbable it mapped to.
    pub(crate) fn remove_hover(&mut self, shape: ShapeId) -> Option<GrabbableHandle> {
        let index = self.hover_objects.iter().position(|(s, _)| *s == shape)?;
        Some(self.hover_objects.remove(index).1)
    }
}

/// A registered collider with its bookkeeping.
#[derive(Clone, Debug)]
pub(crate) struct ColliderEntry {
    pub(crate) id: ShapeId,
    pub(crate) collider: Collider,
    pub(crate) info: ColliderInfo,
}

impl ColliderEntry {
    pub(crate) fn world_position(&self, pose: &Pose) -> Vec3 {
        pose.transform_point(self.collider.offset)
    }
}

/// Result of best-candidate resolution for one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// The interactor's collider closest to the target.
    pub collider: ShapeId,
    /// The target's grab collider.
    pub their_collider: ShapeId,
    /// The target.
    pub grabbable: GrabbableHandle,
    /// Squared distance between the two colliders.
    pub distance_squared: f32,
}

/// Colliders of an interactor, grouped by channel.
#[derive(Clone, Debug, Default)]
pub(crate) struct ColliderRegistry {
    channels: [Vec<ColliderEntry>; 4],
}

impl ColliderRegistry {
    pub(crate) fn insert(&mut self, id: ShapeId, channel: Channel, collider: Collider) -> bool {
        if self.channel_of(id).is_some() {
            return false;
        }
        self.channels[channel.index()].push(ColliderEntry {
            id,
            collider,
            info: ColliderInfo::default(),
        });
        true
    }

    pub(crate) fn remove(&mut self, id: ShapeId, channel: Channel) -> Option<ColliderEntry> {
        let entries = &mut self.channels[channel.index()];
        let index = entries.iter().position(|e| e.id == id)?;
        Some(entries.remove(index))
    }

    pub(crate) fn channel_of(&self, id: ShapeId) -> Option<Channel> {
        Channel::ALL
            .into_iter()
            .find(|c| self.channels[c.index()].iter().any(|e| e.id == id))
    }

    pub(crate) fn get(&self, id: ShapeId, channel: Channel) -> Option<&ColliderEntry> {
        self.channels[channel.index()].iter().find(|e| e.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ShapeId, channel: Channel) -> Option<&mut ColliderEntry> {
        self.channels[channel.index()]
            .iter_mut()
            .find(|e| e.id == id)
    }

    pub(crate) fn of_channel(&self, channel: Channel) -> &[ColliderEntry] {
        &self.channels[channel.index()]
    }

    pub(crate) fn has_channel(&self, channel: Channel) -> bool {
        !self.channels[channel.index()].is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Channel, &ColliderEntry)> + '_ {
        Channel::ALL
            .into_iter()
            .flat_map(move |c| self.channels[c.index()].iter().map(move |e| (c, e)))
    }

    /// Returns true if any collider's hover set holds `grabbable`.
    pub(crate) fn is_hovered(&self, grabbable: &GrabbableHandle) -> bool {
        self.iter()
            .any(|(_, e)| e.info.hover_objects.iter().any(|(_, h)| h == grabbable))
    }

    /// Maximum state over every collider.
    pub(crate) fn aggregate_state(&self) -> InteractorState {
        self.iter()
            .map(|(_, e)| e.info.state)
            .max()
            .unwrap_or_default()
    }

    /// Live hover targets and live select objects, deduplicated, first seen first.
    pub(crate) fn overlapped(&self) -> Vec<GrabbableHandle> {
        let mut out: Vec<GrabbableHandle> = Vec::new();
        let mut push = |handle: &GrabbableHandle| {
            if handle.is_alive() && !out.contains(handle) {
                out.push(handle.clone());
            }
        };
        for (_, entry) in self.iter() {
            for (_, handle) in &entry.info.hover_objects {
                push(handle);
            }
            if let Some(handle) = &entry.info.select_object {
                push(handle);
            }
        }
        out
    }

    /// Closest (my collider, their collider) pair among the hover sets of `channel`.
    ///
    /// Comparison is strict, so the first pair at the minimum distance wins.
    /// Entries whose grabbable is gone are skipped.
    pub(crate) fn best_candidate(&self, channel: Channel, pose: &Pose) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        for entry in self.of_channel(channel) {
            let mine = entry.world_position(pose);
            for (their_collider, handle) in &entry.info.hover_objects {
                let Some(grabbable) = handle.upgrade() else {
                    continue;
                };
                let theirs = grabbable.grab_collider().position;
                let distance_squared = mine.distance_squared(theirs);
                let better = match &best {
                    None => true,
                    Some(current) => distance_squared < current.distance_squared,
                };
                if better {
                    best = Some(Candidate {
                        collider: entry.id,
                        their_collider: *their_collider,
                        grabbable: handle.clone(),
                        distance_squared,
                    });
                }
            }
        }
        best
    }
}
