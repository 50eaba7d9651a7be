// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Scene: a Kurbo-based 2D scene graph with a quadtree-backed spatial index.
//!
//! Canopy Scene is the core of a 2D engine: UI widgets, sprites, and anything else
//! that is placed relative to a parent and needs to be found again by region or by
//! pointer position.
//!
//! - Represents a forest of nodes with local position, scale, angle, pivot, origin
//!   (anchor), size, depth, and visibility.
//! - Composes those into world-space (`relative_*`) values lazily, recomputing only
//!   what changed since the last [`SceneGraph::traverse`].
//! - Answers "what is in this region" and "what is under the pointer" through a
//!   per-tree [`canopy_index::Quadtree`] snapshot rebuilt on each dirty traversal.
//!
//! ## Frame loop
//!
//! Client code mutates nodes, calls [`SceneGraph::traverse`] once per frame, and then
//! issues any number of [`SceneGraph::query`] / [`SceneGraph::hit_test`] calls. Queries
//! read the snapshot built by the last traversal; nodes removed or hidden since are
//! filtered out, everything else reflects geometry as of that traversal.
//!
//! ## Transform composition
//!
//! Each node composes against its parent's accumulated frame:
//!
//! - `relative_scale = parent.relative_scale ⊙ scale`
//! - `relative_angle = parent.relative_angle + angle`
//! - `relative_depth = parent.relative_depth + depth`
//! - `relative_pos = parent.relative_pos + rotate(pos + relative_scale ⊙ origin_offset, parent.relative_angle)`
//!
//! `relative_pos` is the world position of the node's top-left corner. A node's own
//! angle turns only its rectangle, about its pivot (the center plus
//! `rotation_center`); children inherit the accumulated angle. Positive angles turn
//! `+x` towards `-y`, see [`Vector2::rotated`].
//!
//! When the node or its parent has [`NodeFlags::DISTANCE_RELATIVE`] set, `pos` is
//! additionally multiplied by the node's own `relative_scale`.
//!
//! ## API overview
//!
//! - [`SceneGraph`]: owns every node and the spatial snapshots.
//! - [`NodeId`]: generational handle of a node; stale after removal.
//! - [`Vector2`] / [`Point2`], [`Scale`], [`Origin`], [`NodeFlags`]: value types.
//! - [`Error`]: why a mutation was rejected.
//!
//! Key operations:
//! - [`SceneGraph::create_root`], [`SceneGraph::attach_node`],
//!   [`SceneGraph::reparent_to`], [`SceneGraph::detach`], [`SceneGraph::remove`]
//! - `set_*` mutators, which validate input and leave the node untouched on error
//! - [`SceneGraph::traverse`] / [`SceneGraph::traverse_all`]
//! - [`SceneGraph::query`], [`SceneGraph::query_point`], [`SceneGraph::hit_test`]
//! - [`SceneGraph::set_position_relative_to`] for one-shot placement next to another node
//!
//! ## Removal
//!
//! [`SceneGraph::remove`] removes the whole subtree. Accessors return `None` for
//! removed ids and mutators return [`Error::DetachedNode`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod tree;
mod types;
mod util;
mod vector;

pub use error::{Error, Property};
pub use tree::SceneGraph;
pub use types::{NodeFlags, NodeId, Origin, Scale};
pub use vector::{Point2, Vector2};

pub use canopy_index::{Aabb, QuadtreeConfig};
