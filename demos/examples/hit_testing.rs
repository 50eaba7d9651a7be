// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer picking: broad phase through the quadtree, narrow phase against the
//! rotated rectangle, and dropping a node next to another one.
//!
//! Run:
//! - `cargo run -p canopy_demos --example hit_testing`

use canopy_scene::{SceneGraph, Vector2};

fn main() {
    let _ = env_logger::try_init();

    let mut scene = SceneGraph::new();
    let board = scene.create_root("board");
    scene.set_size(board, (400.0, 400.0)).unwrap();

    let card = scene.attach_node(board, "card").unwrap();
    scene.set_pos(card, (100.0, 100.0)).unwrap();
    scene.set_size(card, (200.0, 40.0)).unwrap();
    scene.set_angle(card, 45.0).unwrap();

    let token = scene.attach_node(board, "token").unwrap();
    scene.set_pos(token, (20.0, 20.0)).unwrap();
    scene.set_size(token, (30.0, 30.0)).unwrap();
    scene.traverse(board).unwrap();

    let pointers = [
        Vector2::new(200.0, 120.0),
        Vector2::new(110.0, 60.0),
        Vector2::new(35.0, 35.0),
        Vector2::new(390.0, 390.0),
    ];
    for p in pointers {
        let broad: Vec<_> = scene
            .query_point(board, p)
            .unwrap()
            .into_iter()
            .filter_map(|id| scene.name(id))
            .collect();
        let hit = scene
            .hit_test(board, p)
            .unwrap()
            .and_then(|id| scene.name(id));
        println!("pointer ({:6.1}, {:6.1}): broad {broad:?}, hit {hit:?}", p.x, p.y);
    }

    // Drop the token just right of the card's top-left corner.
    scene
        .set_position_relative_to(token, card, (10.0, 0.0))
        .unwrap();
    scene.traverse(board).unwrap();
    let offset = scene.position_relative_to(token, card).unwrap();
    println!(
        "token now at {:?}, offset from card {:?}",
        scene.relative_pos(token).unwrap(),
        offset
    );

    // Removing the card makes it unpickable at once.
    scene.remove(card).unwrap();
    println!(
        "after removal: hit {:?}",
        scene.hit_test(board, (200.0, 120.0)).unwrap().and_then(|id| scene.name(id))
    );
}
