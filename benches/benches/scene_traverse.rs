// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_index::Aabb;
use canopy_scene::{NodeId, SceneGraph};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// A root with `rows × cols` panels, each holding `per_panel` leaf boxes.
fn build_grid(rows: usize, cols: usize, per_panel: usize) -> (SceneGraph, NodeId, Vec<NodeId>) {
    let mut scene = SceneGraph::new();
    let root = scene.create_root("root");
    let mut leaves = Vec::with_capacity(rows * cols * per_panel);
    for r in 0..rows {
        for c in 0..cols {
            let panel = scene.attach_node(root, "panel").unwrap();
            scene.set_pos(panel, (c as f64 * 110.0, r as f64 * 110.0)).unwrap();
            scene.set_size(panel, (100.0, 100.0)).unwrap();
            for i in 0..per_panel {
                let leaf = scene.attach_node(panel, "leaf").unwrap();
                let k = i as f64;
                scene.set_pos(leaf, (k * 3.0 % 90.0, k * 7.0 % 90.0)).unwrap();
                scene.set_size(leaf, (8.0, 8.0)).unwrap();
                leaves.push(leaf);
            }
        }
    }
    (scene, root, leaves)
}

fn build_chain(depth: usize) -> (SceneGraph, NodeId) {
    let mut scene = SceneGraph::new();
    let root = scene.create_root("root");
    let mut last = root;
    for _ in 0..depth {
        last = scene.attach_node(last, "link").unwrap();
        scene.set_pos(last, (0.1, 0.1)).unwrap();
        scene.set_size(last, (1.0, 1.0)).unwrap();
    }
    (scene, root)
}

fn bench_traverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_traverse");
    for &(rows, cols, per_panel) in &[(4usize, 4usize, 16usize), (8, 8, 32)] {
        let nodes = rows * cols * (per_panel + 1) + 1;
        group.throughput(Throughput::Elements(nodes as u64));
        group.bench_function(format!("full_{nodes}"), |b| {
            b.iter_batched(
                || build_grid(rows, cols, per_panel),
                |(mut scene, root, _)| black_box(scene.traverse(root).unwrap()),
                BatchSize::LargeInput,
            );
        });
        group.bench_function(format!("one_leaf_moved_{nodes}"), |b| {
            let (mut scene, root, leaves) = build_grid(rows, cols, per_panel);
            scene.traverse(root).unwrap();
            let leaf = leaves[leaves.len() / 2];
            let mut x = 0.0;
            b.iter(|| {
                x = (x + 1.0) % 50.0;
                scene.set_pos(leaf, (x, x)).unwrap();
                black_box(scene.traverse(root).unwrap())
            });
        });
        group.bench_function(format!("clean_{nodes}"), |b| {
            let (mut scene, root, _) = build_grid(rows, cols, per_panel);
            scene.traverse(root).unwrap();
            b.iter(|| black_box(scene.traverse(root).unwrap()));
        });
    }
    group.bench_function("rotate_chain_1000", |b| {
        let (mut scene, root) = build_chain(1000);
        let mut angle = 0.0;
        b.iter(|| {
            angle = (angle + 1.0) % 360.0;
            scene.set_angle(root, angle).unwrap();
            black_box(scene.traverse(root).unwrap())
        });
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_query");
    let (mut scene, root, _) = build_grid(8, 8, 32);
    scene.traverse(root).unwrap();
    group.bench_function("viewport_sorted", |b| {
        let viewport = Aabb::new(300.0, 300.0, 250.0, 200.0);
        b.iter(|| black_box(scene.query(root, &viewport).unwrap().len()));
    });
    group.bench_function("viewport_unsorted", |b| {
        let viewport = Aabb::new(300.0, 300.0, 250.0, 200.0);
        b.iter(|| black_box(scene.query_unsorted(root, &viewport).unwrap().len()));
    });
    group.bench_function("hit_test", |b| {
        b.iter(|| black_box(scene.hit_test(root, (455.0, 342.0)).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_traverse, bench_query);
criterion_main!(benches);
