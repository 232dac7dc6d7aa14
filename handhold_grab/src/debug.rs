// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debug visualization hook.
//!
//! The interactor does not draw. When
//! [`GrabberConfig::debug_visuals`](crate::config::GrabberConfig::debug_visuals) is set
//! and the interactor is active, each tick hands every collider to a
//! [`DebugVisualizer`] with a color derived from the aggregate state.

use glam::{Quat, Vec3};

use crate::collider::ColliderShape;
use crate::types::{Channel, InteractorState, ShapeId};

/// Linear RGBA color.
pub type Color = [f32; 4];

/// One collider, ready to be drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DebugCollider {
    /// Collider identity.
    pub id: ShapeId,
    /// Channel the collider is registered under.
    pub channel: Channel,
    /// Collider geometry.
    pub shape: ColliderShape,
    /// World position.
    pub position: Vec3,
    /// World orientation.
    pub orientation: Quat,
    /// Suggested color.
    pub color: Color,
}

/// Receives colliders to draw once per tick.
pub trait DebugVisualizer {
    /// Draw a single collider.
    fn draw_collider(&mut self, collider: &DebugCollider);
}

/// Base color for an aggregate interactor state.
pub fn state_color(state: InteractorState) -> Color {
    match state {
        InteractorState::Normal => [0.6, 0.6, 0.6, 1.0],
        InteractorState::Hover => [0.2, 0.6, 1.0, 1.0],
        InteractorState::Select => [0.2, 1.0, 0.3, 1.0],
    }
}

/// Dimming applied per channel so channels are told apart without extra colors.
pub fn channel_coefficient(channel: Channel) -> f32 {
    match channel {
        Channel::Palm => 0.9,
        Channel::Custom | Channel::Unknown => 0.8,
        Channel::Pinch => 1.0,
    }
}

/// Color for a collider of `channel` while the interactor is in `state`.
pub fn collider_color(state: InteractorState, channel: Channel) -> Color {
    let [r, g, b, a] = state_color(state);
    let k = channel_coefficient(channel);
    [
        (r * k).clamp(0.0, 1.0),
        (g * k).clamp(0.0, 1.0),
        (b * k).clamp(0.0, 1.0),
        a,
    ]
}
