// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two hands built from one TOML config, with debug drawing and an
//! activation conditional.
//!
//! Run:
//! - `cargo run -p handhold_demos --example hand_rig`

use std::rc::Rc;

use glam::Vec3;
use handhold_grab::conditional::ActiveConditional;
use handhold_grab::debug::{DebugCollider, DebugVisualizer};
use handhold_grab::grabbable::GrabbableComponent;
use handhold_grab::interactor::{GrabInteractor, Overlap};
use handhold_grab::types::{Channel, ChannelSet, Pose};
use handhold_grab::{ConfigError, GrabberConfig};

const RIG_CONFIG: &str = r#"
allow_palm_grab = true
allow_pinch_grab = true
palm_collider_radius = 0.06
pinch_collider_radius = 0.012
palm_offset = [0.0, -0.03, 0.02]
debug_visuals = true
"#;

struct PrintVisualizer(&'static str);

impl DebugVisualizer for PrintVisualizer {
    fn draw_collider(&mut self, c: &DebugCollider) {
        println!(
            "  [{}] {:?} {:?} at {:.3?} color {:.2?}",
            self.0, c.channel, c.shape, c.position, c.color
        );
    }
}

fn make_hand(name: &'static str, config: &GrabberConfig, x: f32) -> GrabInteractor {
    let mut hand = GrabInteractor::new(config.clone());
    hand.set_pose(Pose::from_position(Vec3::new(x, 1.2, 0.3)));
    hand.set_debug_visualizer(Some(Box::new(PrintVisualizer(name))));
    hand.activate();
    hand
}

fn main() -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = GrabberConfig::from_toml_str(RIG_CONFIG)?;
    let mut left = make_hand("left", &config, -0.2);
    let mut right = make_hand("right", &config, 0.2);

    let mut left_active = ActiveConditional::new();
    left_active.set_component(&left);
    left_active
        .conditional()
        .changed()
        .subscribe(|active| println!("left hand active: {active}"));

    // A crate only the palm can pick up.
    let crate_box = Rc::new(GrabbableComponent::new(
        ChannelSet::PALM,
        Vec3::new(0.2, 1.17, 0.32),
    ));
    let palm = right.default_palm_collider().unwrap();
    let pinch = right.default_pinch_collider().unwrap();
    for collider in [pinch, palm] {
        right.begin_overlap(&Overlap {
            collider,
            other_shape: crate_box.collider_shape(),
            other_owner: Some(&crate_box),
        });
    }
    println!(
        "right hand hovers {} collider record(s) on palm, {} on pinch",
        right.collider_info(palm).map_or(0, |i| i.hover_objects().len()),
        right.collider_info(pinch).map_or(0, |i| i.hover_objects().len()),
    );

    right.select_pinch();
    println!("pinch grab: {:?}", right.selecting_collider());
    right.select_palm();
    println!("palm grab: {:?}", right.selecting_collider().map(|(_, c)| c));
    assert_eq!(right.selecting_collider().map(|(_, c)| c), Some(Channel::Palm));

    println!("frame:");
    left.tick();
    right.tick();

    left.deactivate();
    right.unselect_palm();
    right.teardown();
    println!("left active: {}", left_active.value());
    Ok(())
}
