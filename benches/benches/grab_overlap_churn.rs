// Copyright 2025 the Handhold Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::Vec3;
use handhold_grab::grabbable::GrabbableComponent;
use handhold_grab::interactor::{GrabInteractor, Overlap};
use handhold_grab::types::{Channel, ChannelSet};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
}

fn gen_targets(count: usize, seed: u64) -> Vec<Rc<GrabbableComponent>> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| {
            let p = Vec3::new(rng.next_f32(), rng.next_f32(), rng.next_f32()) * 0.2 - 0.1;
            Rc::new(GrabbableComponent::new(ChannelSet::HAND, p))
        })
        .collect()
}

fn hand() -> GrabInteractor {
    let mut hand = GrabInteractor::default();
    hand.activate();
    hand
}

fn touch_all(hand: &mut GrabInteractor, targets: &[Rc<GrabbableComponent>]) {
    let Some(collider) = hand.default_pinch_collider() else {
        return;
    };
    for g in targets {
        hand.begin_overlap(&Overlap {
            collider,
            other_shape: g.collider_shape(),
            other_owner: Some(g),
        });
    }
}

fn bench_overlap_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlap_churn");
    for &n in &[8usize, 32, 128] {
        let targets = gen_targets(n, 0x9e37_79b9_7f4a_7c15);
        group.throughput(Throughput::Elements(n as u64 * 2));
        group.bench_function(format!("begin_end_n{}", n), |b| {
            b.iter_batched(
                hand,
                |mut hand| {
                    touch_all(&mut hand, &targets);
                    let Some(collider) = hand.default_pinch_collider() else {
                        return;
                    };
                    for g in targets.iter().rev() {
                        hand.end_overlap(&Overlap {
                            collider,
                            other_shape: g.collider_shape(),
                            other_owner: Some(g),
                        });
                    }
                    black_box(hand.state());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_candidate(c: &mut Criterion) {
    let mut group = c.benchmark_group("candidate");
    for &n in &[8usize, 32, 128] {
        let targets = gen_targets(n, 0x2545_f491_4f6c_dd1d);
        let mut hand = hand();
        touch_all(&mut hand, &targets);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("best_pinch_n{}", n), |b| {
            b.iter(|| black_box(hand.best_candidate(Channel::Pinch)))
        });
    }
    group.finish();
}

fn bench_grab_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("grab_cycle");
    let targets = gen_targets(32, 0xdead_beef_cafe_f00d);
    let mut hand = hand();
    touch_all(&mut hand, &targets);
    group.bench_function("select_tick_unselect", |b| {
        b.iter(|| {
            hand.select_pinch();
            hand.tick();
            hand.unselect_pinch();
            black_box(hand.state());
        })
    });
    group.finish();
}

criterion_group!(benches, bench_overlap_churn, bench_candidate, bench_grab_cycle);
criterion_main!(benches);
