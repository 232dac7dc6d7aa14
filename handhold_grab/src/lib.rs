// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handhold Grab: a grab interactor for VR hands and controllers.
//!
//! ## Overview
//!
//! This crate decides what a hand may grab and tells targets about it.
//! It does not detect collisions. Instead, feed it overlap reports from your
//! physics layer, and it keeps hover sets per collider, picks the nearest
//! target, and runs a Normal → Hover → Select state machine that emits
//! [`PointerEvent`](crate::event::PointerEvent)s to the targets involved.
//!
//! ## Channels
//!
//! Every collider belongs to exactly one [`Channel`](crate::types::Channel):
//! `Custom`, `Palm`, `Pinch`, or `Unknown`. A target declares which channels
//! may grab it, and palm or pinch grabbing can be switched off per interactor.
//! Selection always happens for one channel, so a pinch and a palm never
//! compete for the same target.
//!
//! ## Candidates
//!
//! For a channel, the candidate is the hovered target whose grab collider is
//! closest to one of that channel's colliders. Distance ties keep the first
//! pair seen, in registration order. Targets are referenced weakly and dead
//! ones are skipped.
//!
//! ## Cancellation
//!
//! A target may cancel a grab at any time through its cancel signal, even
//! from inside the `Select` notification. An interactor moved into a
//! [`SharedGrabInteractor`](crate::interactor::SharedGrabInteractor) releases
//! the grab inside the signal; while it is busy, or when it is not shared, the
//! request is recorded and applied as soon as control returns to it.
//!
//! ## Workflow
//!
//! 1) Build a [`GrabInteractor`](crate::interactor::GrabInteractor) from a
//!    [`GrabberConfig`](crate::config::GrabberConfig) and activate it. Default
//!    palm and pinch spheres are created for channels with no colliders.
//! 2) Report overlaps with
//!    [`begin_overlap`](crate::interactor::GrabInteractor::begin_overlap) and
//!    [`end_overlap`](crate::interactor::GrabInteractor::end_overlap).
//! 3) Call [`select_pinch`](crate::interactor::GrabInteractor::select_pinch) or
//!    [`select_palm`](crate::interactor::GrabInteractor::select_palm) on input,
//!    and [`tick`](crate::interactor::GrabInteractor::tick) once per frame.
//!
//! ```
//! use std::rc::Rc;
//!
//! use glam::Vec3;
//! use handhold_grab::event::PointerEventKind;
//! use handhold_grab::grabbable::GrabbableComponent;
//! use handhold_grab::interactor::{GrabInteractor, Overlap};
//! use handhold_grab::types::{ChannelSet, InteractorState};
//!
//! let mut hand = GrabInteractor::default();
//! hand.activate();
//! let pinch = hand.default_pinch_collider().unwrap();
//!
//! let mug = Rc::new(GrabbableComponent::new(ChannelSet::HAND, Vec3::ZERO));
//! hand.begin_overlap(&Overlap {
//!     collider: pinch,
//!     other_shape: mug.collider_shape(),
//!     other_owner: Some(&mug),
//! });
//! assert_eq!(hand.state(), InteractorState::Hover);
//!
//! hand.select_pinch();
//! hand.tick();
//! assert_eq!(mug.last_event().unwrap().kind, PointerEventKind::Move);
//! ```
//!
//! Everything is single-threaded and uses `Rc`; interactors and targets are
//! meant to live on the thread that runs the frame loop.

pub mod collider;
pub mod conditional;
pub mod config;
pub mod debug;
pub mod event;
pub mod grabbable;
pub mod interactor;
pub mod signal;
pub mod types;

pub use config::{ConfigError, GrabberConfig};
pub use interactor::{GrabInteractor, Overlap, SharedGrabInteractor};
