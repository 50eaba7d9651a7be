// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build a small UI-like scene, run a few frames, and cull against a viewport.
//!
//! Run:
//! - `RUST_LOG=trace cargo run -p canopy_demos --example scene_basics`

use canopy_index::Aabb;
use canopy_scene::{Origin, SceneGraph};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut scene = SceneGraph::new();
    let window = scene.create_root("window");
    scene.set_size(window, (800.0, 600.0)).unwrap();

    // A toolbar anchored to the top-center of the window.
    let toolbar = scene.attach_node(window, "toolbar").unwrap();
    scene.set_origin(toolbar, Origin::TopCenter).unwrap();
    scene.set_pos(toolbar, (400.0, 0.0)).unwrap();
    scene.set_size(toolbar, (600.0, 40.0)).unwrap();
    for i in 0..5_i32 {
        let button = scene.attach_node(toolbar, format!("button{i}")).unwrap();
        scene.set_pos(button, (10.0 + f64::from(i) * 50.0, 5.0)).unwrap();
        scene.set_size(button, (40.0, 30.0)).unwrap();
    }

    // A dial in the bottom-right corner, spinning a needle each frame.
    let dial = scene.attach_node(window, "dial").unwrap();
    scene.set_origin(dial, Origin::BottomRight).unwrap();
    scene.set_pos(dial, (790.0, 590.0)).unwrap();
    scene.set_size(dial, (120.0, 120.0)).unwrap();
    scene.set_depth(dial, 5).unwrap();
    let needle = scene.attach_node(dial, "needle").unwrap();
    scene.set_pos(needle, (58.0, 10.0)).unwrap();
    scene.set_size(needle, (4.0, 50.0)).unwrap();
    // Turn about the bottom end of the needle.
    scene.set_rotation_center(needle, (0.0, 25.0)).unwrap();

    let viewport = Aabb::from_min_max(0.0, 0.0, 800.0, 600.0);
    for frame in 0..4_i32 {
        scene.set_angle(needle, f64::from(frame) * 30.0).unwrap();
        let dirty = scene.traverse(window).unwrap();
        let visible = scene.query(window, &viewport).unwrap();
        println!("frame {frame}: dirty={dirty}, {} visible", visible.len());
        for id in visible {
            let aabb = scene.aabb(id).unwrap();
            println!(
                "  {:<10} depth {:>2}  [{:7.2}, {:7.2}] .. [{:7.2}, {:7.2}]",
                scene.name(id).unwrap_or("?"),
                scene.relative_depth(id).unwrap_or_default(),
                aabb.min_x(),
                aabb.min_y(),
                aabb.max_x(),
                aabb.max_y(),
            );
        }
    }

    // No mutation: nothing to do.
    println!("idle frame dirty={}", scene.traverse(window).unwrap());

    // Invalid geometry is rejected and the node keeps its old size.
    if let Err(err) = scene.set_size(needle, (-4.0, 50.0)) {
        println!("rejected: {err}");
    }
    println!("needle size still {:?}", scene.size(needle).unwrap());
}
