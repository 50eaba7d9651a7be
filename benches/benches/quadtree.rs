// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_index::{Aabb, Quadtree, QuadtreeConfig};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

fn gen_grid_boxes(n: usize, cell: f64) -> Vec<Aabb> {
    let mut out = Vec::with_capacity(n * n);
    for y in 0..n {
        for x in 0..n {
            let cx = x as f64 * cell + cell * 0.5;
            let cy = y as f64 * cell + cell * 0.5;
            out.push(Aabb::new(cx, cy, cell * 0.4, cell * 0.4));
        }
    }
    out
}

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
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_clustered_boxes(n_clusters: usize, per_cluster: usize, spread: f64) -> Vec<Aabb> {
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut centers = Vec::with_capacity(n_clusters);
    for _ in 0..n_clusters {
        centers.push((rng.next_f64() * 2000.0, rng.next_f64() * 2000.0));
    }
    for (cx, cy) in centers {
        for _ in 0..per_cluster {
            let dx = (rng.next_f64() - 0.5) * spread;
            let dy = (rng.next_f64() - 0.5) * spread;
            out.push(Aabb::new(cx + dx, cy + dy, 6.0, 6.0));
        }
    }
    out
}

fn build(boxes: &[Aabb]) -> Quadtree<u32> {
    let bounds = boxes
        .iter()
        .copied()
        .reduce(|acc, a| acc.union(&a))
        .unwrap_or_default();
    let mut qt = Quadtree::with_config(QuadtreeConfig::new(bounds));
    for (i, a) in boxes.iter().enumerate() {
        qt.insert(i as u32, *a);
    }
    qt
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_build");
    for &n in &[32usize, 64, 128] {
        let boxes = gen_grid_boxes(n, 10.0);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("grid_n{n}"), |b| {
            b.iter(|| black_box(build(&boxes).len()));
        });
    }
    let clustered = gen_clustered_boxes(16, 512, 120.0);
    group.throughput(Throughput::Elements(clustered.len() as u64));
    group.bench_function("clustered", |b| {
        b.iter(|| black_box(build(&clustered).len()));
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("quadtree_query");
    let boxes = gen_grid_boxes(128, 10.0);
    let qt = build(&boxes);
    group.bench_function("viewport", |b| {
        let viewport = Aabb::new(300.0, 300.0, 200.0, 200.0);
        b.iter(|| black_box(qt.query(&viewport).len()));
    });
    group.bench_function("pointer", |b| {
        let mut rng = Rng::new(0xFACE_FEED_CAFE_BABE);
        b.iter_batched(
            || (rng.next_f64() * 1280.0, rng.next_f64() * 1280.0),
            |(x, y)| {
                let mut hits = 0_usize;
                qt.visit_point(x, y, |_| hits += 1);
                black_box(hits)
            },
            BatchSize::SmallInput,
        );
    });

    // A few huge boxes in the overflow bucket are scanned by every query.
    let mut with_overflow = build(&boxes);
    for i in 0..16_u32 {
        with_overflow.insert(100_000 + i, Aabb::new(-1e6, -1e6, 1e6, 1e6));
    }
    group.bench_function("viewport_with_overflow", |b| {
        let viewport = Aabb::new(300.0, 300.0, 200.0, 200.0);
        b.iter(|| black_box(with_overflow.query(&viewport).len()));
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_query);
criterion_main!(benches);
