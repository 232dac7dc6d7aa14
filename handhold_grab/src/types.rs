// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types shared by the interactor: channels, states, identities, and poses.
//!
//! ## Overview
//!
//! These types describe the vocabulary of grab interaction.
//! They are referenced by the [`interactor`](crate::interactor) and by the
//! [`Grabbable`](crate::grabbable::Grabbable) contract implemented by downstream targets.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use bitflags::bitflags;
use glam::{Quat, Vec3};

/// A grab modality partitioning colliders and permissions.
///
/// Every collider registered on a [`GrabInteractor`](crate::interactor::GrabInteractor)
/// belongs to exactly one channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Channel {
    /// User-supplied colliders with application-defined meaning.
    Custom,
    /// Whole-hand grab around the palm.
    Palm,
    /// Thumb/index pinch.
    Pinch,
    /// Colliders whose modality is not known.
    Unknown,
}

impl Channel {
    /// All channels, in the order the interactor iterates them.
    pub const ALL: [Self; 4] = [Self::Custom, Self::Palm, Self::Pinch, Self::Unknown];

    /// Position of this channel in [`Channel::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Custom => 0,
            Self::Palm => 1,
            Self::Pinch => 2,
            Self::Unknown => 3,
        }
    }

    /// The single-channel [`ChannelSet`] for this channel.
    #[inline]
    pub const fn flag(self) -> ChannelSet {
        match self {
            Self::Custom => ChannelSet::CUSTOM,
            Self::Palm => ChannelSet::PALM,
            Self::Pinch => ChannelSet::PINCH,
            Self::Unknown => ChannelSet::UNKNOWN,
        }
    }
}

bitflags! {
    /// A set of [`Channel`]s, typically the ones a grabbable accepts.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct ChannelSet: u8 {
        /// Accepts [`Channel::Custom`].
        const CUSTOM = 1 << 0;
        /// Accepts [`Channel::Palm`].
        const PALM = 1 << 1;
        /// Accepts [`Channel::Pinch`].
        const PINCH = 1 << 2;
        /// Accepts [`Channel::Unknown`].
        const UNKNOWN = 1 << 3;
        /// Palm and pinch, the usual hand modalities.
        const HAND = Self::PALM.bits() | Self::PINCH.bits();
    }
}

impl ChannelSet {
    /// Returns true if `channel` is part of this set.
    #[inline]
    pub fn accepts(self, channel: Channel) -> bool {
        self.contains(channel.flag())
    }
}

impl From<Channel> for ChannelSet {
    fn from(channel: Channel) -> Self {
        channel.flag()
    }
}

/// Interaction state of a single collider, or of the interactor as a whole.
///
/// Ordered by severity: `Normal < Hover < Select`. The aggregate interactor
/// state is the maximum over all collider states.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum InteractorState {
    /// Nothing hovered or selected.
    #[default]
    Normal,
    /// At least one grabbable overlaps a collider.
    Hover,
    /// A grabbable is held.
    Select,
}

/// State filter for [`GrabInteractor::relationships`](crate::interactor::GrabInteractor::relationships).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum InteractableState {
    /// Interactables with no relationship to the interactor.
    Normal,
    /// Overlapped interactables other than the grabbed one.
    Hover,
    /// The grabbed interactable.
    Select,
    /// Interactables that refuse interaction.
    Disabled,
}

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_INTERACTOR_ID: AtomicU32 = AtomicU32::new(1);

/// Opaque identity of a collision shape.
///
/// Both the interactor's own colliders and the grab colliders of grabbables are
/// shapes. Hosts that already have physics handles can wrap them with
/// [`ShapeId::from_raw`]; otherwise [`ShapeId::fresh`] hands out process-unique ids.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ShapeId(u64);

impl ShapeId {
    /// Allocate a new process-unique id.
    pub fn fresh() -> Self {
        Self(NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap an existing host-side identifier.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Stable identifier of an interactor, carried by every pointer event it emits.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct InteractorId(u32);

impl InteractorId {
    pub(crate) fn next() -> Self {
        Self(NEXT_INTERACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// World-space position and orientation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pose {
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub orientation: Quat,
}

impl Pose {
    /// The identity pose at the origin.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// A pose at `position` with identity orientation.
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// Transform a local offset into world space.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}
