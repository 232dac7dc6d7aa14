// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grab basics.
//!
//! Hover two mugs with the pinch sphere, grab the nearer one, carry it for a
//! few frames, and let go.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p handhold_demos --example grab_basics`

use std::rc::Rc;

use glam::Vec3;
use handhold_grab::grabbable::{GrabbableComponent, GrabbableHandle};
use handhold_grab::interactor::{GrabInteractor, Overlap};
use handhold_grab::types::{ChannelSet, InteractorState, Pose};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut hand = GrabInteractor::default();
    hand.activate();
    let pinch = hand.default_pinch_collider().unwrap();

    let near = Rc::new(GrabbableComponent::new(ChannelSet::HAND, Vec3::new(0.0, 0.0, 0.02)));
    let far = Rc::new(GrabbableComponent::new(ChannelSet::HAND, Vec3::new(0.0, 0.0, 0.08)));
    for (name, mug) in [("near", &near), ("far", &far)] {
        mug.pointer_events().subscribe(move |e| {
            println!("{name}: {:?} at {:?}", e.kind, e.pose.position);
        });
    }

    // Physics reports both mugs touching the pinch sphere.
    for mug in [&far, &near] {
        hand.begin_overlap(&Overlap {
            collider: pinch,
            other_shape: mug.collider_shape(),
            other_owner: Some(mug),
        });
    }
    assert_eq!(hand.state(), InteractorState::Hover);
    assert_eq!(hand.candidate(), Some(&GrabbableHandle::from_rc(&near)));

    hand.select_pinch();
    for step in 1..=3 {
        hand.set_pose(Pose::from_position(Vec3::new(0.0, 0.01 * step as f32, 0.0)));
        hand.tick();
    }
    let counts = hand.relationship_counts();
    println!("holding {} mug(s), hovering {}", counts.select, counts.hover);

    hand.unselect_pinch();
    println!("state after release: {:?}", hand.state());
}
