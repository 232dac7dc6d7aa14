// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Targets that cancel their own grab.
//!
//! The "hot pan" cancels as soon as it receives `Select`; the interactor
//! releases it before `select_pinch` returns. The "kettle" is held for a
//! frame and then cancels on its own; the shared interactor is released
//! inside `cancel_grab`, before any further call into it.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p handhold_demos --example grab_cancel`

use std::rc::Rc;

use glam::Vec3;
use handhold_grab::event::PointerEventKind;
use handhold_grab::grabbable::GrabbableComponent;
use handhold_grab::interactor::{GrabInteractor, Overlap};
use handhold_grab::types::ChannelSet;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let hand = GrabInteractor::default().into_shared();
    hand.borrow_mut().activate();
    let pinch = hand.borrow().default_pinch_collider().unwrap();

    let pan = Rc::new(GrabbableComponent::new(ChannelSet::HAND, Vec3::ZERO));
    let weak = Rc::downgrade(&pan);
    pan.pointer_events().subscribe(move |e| {
        println!("pan: {:?}", e.kind);
        if e.kind == PointerEventKind::Select
            && let Some(pan) = weak.upgrade()
        {
            println!("pan: too hot, cancelling");
            pan.cancel_grab();
        }
    });

    hand.borrow_mut().begin_overlap(&Overlap {
        collider: pinch,
        other_shape: pan.collider_shape(),
        other_owner: Some(&pan),
    });
    hand.borrow_mut().select_pinch();
    println!(
        "after pan select: state={:?} grabbing={}",
        hand.borrow().state(),
        hand.borrow().grabbing_state().0
    );
    assert!(!hand.borrow().is_grabbing());

    hand.borrow_mut().end_overlap(&Overlap {
        collider: pinch,
        other_shape: pan.collider_shape(),
        other_owner: Some(&pan),
    });

    let kettle = Rc::new(GrabbableComponent::new(ChannelSet::HAND, Vec3::ZERO));
    kettle
        .pointer_events()
        .subscribe(|e| println!("kettle: {:?}", e.kind));
    hand.borrow_mut().begin_overlap(&Overlap {
        collider: pinch,
        other_shape: kettle.collider_shape(),
        other_owner: Some(&kettle),
    });
    hand.borrow_mut().select_pinch();
    hand.borrow_mut().tick();

    println!("kettle: boiling over, cancelling");
    kettle.cancel_grab();
    println!(
        "after kettle cancel: state={:?} grabbing={}",
        hand.borrow().state(),
        hand.borrow().grabbing_state().0
    );
    assert!(!hand.borrow().is_grabbing());
}
