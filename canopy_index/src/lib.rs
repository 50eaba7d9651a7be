// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Index: a quadtree over 2D axis-aligned bounding boxes.
//!
//! Canopy Index is the spatial building block underneath `canopy_scene`.
//!
//! - [`Aabb`] stores a box as a center and half extents and provides closed-interval
//!   containment and overlap predicates.
//! - [`Quadtree`] maps opaque handles to AABBs and answers "which entries overlap this
//!   region" queries.
//! - [`QuadtreeConfig`] controls the root bounds, leaf capacity, and maximum depth.
//!
//! The index never owns the objects its handles refer to, so its lifetime is decoupled
//! from theirs. Higher layers (like a scene graph) compute world-space AABBs and feed
//! them here, typically rebuilding the index wholesale whenever geometry changes.
//!
//! # Example
//!
//! ```rust
//! use canopy_index::{Aabb, Quadtree, QuadtreeConfig};
//!
//! let config =
//!     QuadtreeConfig::new(Aabb::new(50.0, 50.0, 50.0, 50.0)).with_max_leaf_elements(4);
//! let mut qt = Quadtree::with_config(config);
//! for i in 0..10_u32 {
//!     let x = f64::from(i) * 10.0;
//!     qt.insert(i, Aabb::new(x, x, 2.0, 2.0));
//! }
//!
//! // A region touching the edge of entry 3 still reports it.
//! let mut hits = qt.query(&Aabb::new(34.0, 30.0, 2.0, 2.0));
//! hits.sort();
//! assert_eq!(hits, [3]);
//! ```
//!
//! ## Degenerate and out-of-range input
//!
//! Zero-area boxes are valid entries and valid query regions. Clusters of identical
//! boxes cannot split forever because leaves stop splitting at
//! [`QuadtreeConfig::max_depth`]. Boxes that do not fit inside the root bounds are
//! stored in an overflow bucket that every query scans, so an entry is never missed
//! because it lies outside the expected extent.
//!
//! ### Float semantics
//!
//! Boxes with NaN coordinates are accepted but never overlap anything.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod quadtree;
mod types;

pub use quadtree::{Quadtree, QuadtreeConfig};
pub use types::{Aabb, Quadrant};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn rebuild_per_frame() {
        let mut boxes: Vec<(u32, Aabb)> = (0..20_u32)
            .map(|i| (i, Aabb::new(f64::from(i), 0.0, 0.4, 0.4)))
            .collect();

        let build = |boxes: &[(u32, Aabb)]| {
            let bounds = boxes
                .iter()
                .map(|(_, a)| *a)
                .reduce(|acc, a| acc.union(&a))
                .unwrap_or_default();
            let config = QuadtreeConfig::new(bounds).with_max_leaf_elements(2);
            let mut qt = Quadtree::with_config(config);
            for &(h, a) in boxes {
                assert!(qt.insert(h, a));
            }
            qt
        };

        let qt = build(&boxes);
        assert_eq!(qt.overflow_len(), 0);
        assert_eq!(qt.query(&Aabb::new(5.0, 0.0, 0.1, 0.1)), [5]);

        // Everything moves; the next frame builds a fresh snapshot.
        for (_, a) in &mut boxes {
            a.center_y += 10.0;
        }
        let qt = build(&boxes);
        assert!(qt.query(&Aabb::new(5.0, 0.0, 0.1, 0.1)).is_empty());
        assert_eq!(qt.query(&Aabb::new(5.0, 10.0, 0.1, 0.1)), [5]);
    }
}
