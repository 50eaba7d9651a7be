// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Region quadtree over center/half-extent AABBs.
//!
//! Each entry lives in the deepest tree node whose bounds fully contain it, so
//! boxes that straddle a split line stay with the ancestor instead of being
//! duplicated into several children. Entries that do not fit inside the
//! configured root bounds go to an overflow bucket that every query scans.
//! Nothing is ever dropped because it lies outside the expected extent.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::types::{Aabb, Quadrant};

/// Construction parameters for a [`Quadtree`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QuadtreeConfig {
    /// Region covered by the root node. Entries outside it are still accepted.
    pub bounds: Aabb,
    /// Number of entries a leaf holds before it splits.
    pub max_leaf_elements: usize,
    /// Maximum depth of the tree; leaves at this depth never split.
    pub max_depth: usize,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            bounds: Aabb::default(),
            max_leaf_elements: 8,
            max_depth: 8,
        }
    }
}

impl QuadtreeConfig {
    /// Default leaf capacity and depth with the given root bounds.
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// Set the root bounds.
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the leaf capacity. Values below 1 are treated as 1.
    pub fn with_max_leaf_elements(mut self, n: usize) -> Self {
        self.max_leaf_elements = n.max(1);
        self
    }

    /// Set the maximum depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

#[derive(Clone, Debug)]
struct QuadNode {
    bounds: Aabb,
    depth: usize,
    /// Index of the first of four consecutive children (in [`Quadrant`] order).
    first_child: Option<usize>,
    elements: SmallVec<[usize; 8]>,
}

impl QuadNode {
    fn new(bounds: Aabb, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            first_child: None,
            elements: SmallVec::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Location {
    Overflow,
    Node(usize),
}

#[derive(Clone, Debug)]
struct Element<H> {
    handle: H,
    aabb: Aabb,
    location: Location,
}

/// A quadtree mapping opaque handles to AABBs.
///
/// The tree does not own what the handles refer to. Each handle can be present
/// at most once; a second [`insert`](Quadtree::insert) with the same handle is
/// rejected.
///
/// There is no in-place update: callers that move objects either
/// [`remove`](Quadtree::remove) and re-insert them or rebuild the whole tree.
///
/// # Example
///
/// ```rust
/// use canopy_index::{Aabb, Quadtree};
///
/// let mut qt: Quadtree<u32> = Quadtree::new();
/// assert!(qt.insert(0, Aabb::new(0.0, 0.0, 1.0, 1.0)));
/// assert!(qt.insert(1, Aabb::new(-100.0, -100.0, 99.0, 99.0)));
/// assert!(!qt.insert(0, Aabb::new(5.0, 5.0, 1.0, 1.0)), "duplicate handle");
///
/// let mut hits = qt.query(&Aabb::new(-0.5, -0.5, 0.49, 0.49));
/// hits.sort();
/// assert_eq!(hits, [0]);
/// ```
pub struct Quadtree<H> {
    config: QuadtreeConfig,
    nodes: Vec<QuadNode>,
    elements: Vec<Option<Element<H>>>,
    free_list: Vec<usize>,
    slots: HashMap<H, usize>,
    overflow: SmallVec<[usize; 8]>,
}

impl<H> Debug for Quadtree<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let live = self.elements.iter().filter(|e| e.is_some()).count();
        f.debug_struct("Quadtree")
            .field("config", &self.config)
            .field("nodes", &self.nodes.len())
            .field("live_elements", &live)
            .field("overflow", &self.overflow.len())
            .finish_non_exhaustive()
    }
}

impl<H: Copy + Eq + Hash> Default for Quadtree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy + Eq + Hash> Quadtree<H> {
    /// Create an empty tree with [`QuadtreeConfig::default`].
    pub fn new() -> Self {
        Self::with_config(QuadtreeConfig::default())
    }

    /// Create an empty tree with an explicit configuration.
    pub fn with_config(config: QuadtreeConfig) -> Self {
        let config = QuadtreeConfig {
            max_leaf_elements: config.max_leaf_elements.max(1),
            ..config
        };
        let mut nodes = Vec::new();
        nodes.push(QuadNode::new(config.bounds, 0));
        Self {
            config,
            nodes,
            elements: Vec::new(),
            free_list: Vec::new(),
            slots: HashMap::new(),
            overflow: SmallVec::new(),
        }
    }

    /// The configuration the tree was built with.
    pub fn config(&self) -> &QuadtreeConfig {
        &self.config
    }

    /// Region covered by the root node.
    pub fn bounds(&self) -> Aabb {
        self.config.bounds
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of entries that fell outside the root bounds.
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Whether `handle` is present.
    pub fn contains(&self, handle: H) -> bool {
        self.slots.contains_key(&handle)
    }

    /// The AABB stored for `handle`, if present.
    pub fn get(&self, handle: H) -> Option<Aabb> {
        let slot = *self.slots.get(&handle)?;
        self.elements[slot].as_ref().map(|e| e.aabb)
    }

    /// Insert `handle` with its AABB.
    ///
    /// Returns `false` without modifying the tree if `handle` is already present.
    /// Boxes outside the root bounds (or with non-finite coordinates) are kept in
    /// the overflow bucket and are still returned by overlapping queries.
    pub fn insert(&mut self, handle: H, aabb: Aabb) -> bool {
        if self.slots.contains_key(&handle) {
            log::debug!("quadtree: rejected duplicate handle");
            return false;
        }
        let element = Element {
            handle,
            aabb,
            location: Location::Overflow,
        };
        let slot = if let Some(slot) = self.free_list.pop() {
            self.elements[slot] = Some(element);
            slot
        } else {
            self.elements.push(Some(element));
            self.elements.len() - 1
        };
        self.slots.insert(handle, slot);

        if self.config.bounds.contains(&aabb) {
            self.place(0, slot);
        } else {
            self.overflow.push(slot);
        }
        true
    }

    /// Remove `handle`. Returns `false` if it was not present.
    ///
    /// Empty subtrees are not collapsed.
    pub fn remove(&mut self, handle: H) -> bool {
        let Some(slot) = self.slots.remove(&handle) else {
            return false;
        };
        let Some(element) = self.elements[slot].take() else {
            unreachable!("slot map references a vacant element");
        };
        let list = match element.location {
            Location::Overflow => &mut self.overflow,
            Location::Node(n) => &mut self.nodes[n].elements,
        };
        if let Some(pos) = list.iter().position(|&s| s == slot) {
            list.swap_remove(pos);
        }
        self.free_list.push(slot);
        true
    }

    /// Remove every entry and collapse the tree to a single root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(QuadNode::new(self.config.bounds, 0));
        self.elements.clear();
        self.free_list.clear();
        self.slots.clear();
        self.overflow.clear();
    }

    /// Rebuild the tree over new root bounds, keeping every entry.
    pub fn resize(&mut self, bounds: Aabb) {
        let entries: Vec<(H, Aabb)> = self.entries().collect();
        self.config.bounds = bounds;
        self.clear();
        for (handle, aabb) in entries {
            self.insert(handle, aabb);
        }
    }

    /// Iterate all `(handle, aabb)` entries in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = (H, Aabb)> + '_ {
        self.elements
            .iter()
            .filter_map(|e| e.as_ref().map(|e| (e.handle, e.aabb)))
    }

    /// Collect the handles of all entries whose AABB overlaps `region`.
    ///
    /// Overlap is tested on closed intervals, so a box that only touches the
    /// region's boundary is included. Each handle appears once; the order is
    /// unspecified.
    pub fn query(&self, region: &Aabb) -> Vec<H> {
        let mut out = Vec::new();
        self.visit(region, |h| out.push(h));
        out
    }

    /// Visit entries whose AABB overlaps `region` without allocating result storage.
    pub fn visit<F: FnMut(H)>(&self, region: &Aabb, mut f: F) {
        for &slot in &self.overflow {
            if let Some(e) = &self.elements[slot]
                && e.aabb.overlaps(region)
            {
                f(e.handle);
            }
        }

        if !self.nodes[0].bounds.overlaps(region) {
            return;
        }
        let mut stack: SmallVec<[usize; 32]> = SmallVec::new();
        stack.push(0);
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            for &slot in &node.elements {
                if let Some(e) = &self.elements[slot]
                    && e.aabb.overlaps(region)
                {
                    f(e.handle);
                }
            }
            if let Some(first) = node.first_child {
                for child in first..first + 4 {
                    if self.nodes[child].bounds.overlaps(region) {
                        stack.push(child);
                    }
                }
            }
        }
    }

    /// Visit entries whose AABB contains the point `(x, y)`.
    pub fn visit_point<F: FnMut(H)>(&self, x: f64, y: f64, f: F) {
        self.visit(&Aabb::new(x, y, 0.0, 0.0), f);
    }

    // --- internals ---

    fn element_aabb(&self, slot: usize) -> Aabb {
        match &self.elements[slot] {
            Some(e) => e.aabb,
            None => unreachable!("quadtree node references a vacant element"),
        }
    }

    fn set_location(&mut self, slot: usize, location: Location) {
        if let Some(e) = self.elements[slot].as_mut() {
            e.location = location;
        }
    }

    /// The child of `node` that fully contains `aabb`, if any.
    ///
    /// Only the quadrant holding the box's center can contain the whole box.
    fn child_containing(&self, node: usize, first: usize, aabb: &Aabb) -> Option<usize> {
        let quadrant = self.nodes[node]
            .bounds
            .quadrant_of(aabb.center_x, aabb.center_y);
        let child = first + quadrant.index();
        self.nodes[child].bounds.contains(aabb).then_some(child)
    }

    /// Store `slot` in the deepest node below `start` that fully contains it.
    fn place(&mut self, start: usize, slot: usize) {
        let aabb = self.element_aabb(slot);
        let mut node = start;
        while let Some(first) = self.nodes[node].first_child {
            match self.child_containing(node, first, &aabb) {
                Some(child) => node = child,
                None => break,
            }
        }
        self.nodes[node].elements.push(slot);
        self.set_location(slot, Location::Node(node));
        self.split_if_full(node);
    }

    fn split_if_full(&mut self, node: usize) {
        let n = &self.nodes[node];
        if n.first_child.is_none()
            && n.elements.len() > self.config.max_leaf_elements
            && n.depth < self.config.max_depth
        {
            self.split(node);
        }
    }

    fn split(&mut self, node: usize) {
        let bounds = self.nodes[node].bounds;
        let depth = self.nodes[node].depth + 1;
        let first = self.nodes.len();
        for q in Quadrant::ALL {
            self.nodes.push(QuadNode::new(bounds.split(q), depth));
        }
        self.nodes[node].first_child = Some(first);

        let elements = core::mem::take(&mut self.nodes[node].elements);
        let mut kept = 0_usize;
        for slot in elements {
            let aabb = self.element_aabb(slot);
            let target = self.child_containing(node, first, &aabb).unwrap_or(node);
            if target == node {
                kept += 1;
            }
            self.nodes[target].elements.push(slot);
            self.set_location(slot, Location::Node(target));
        }
        log::trace!("quadtree: split node {node} at depth {depth}, {kept} straddling entries kept");

        for child in first..first + 4 {
            self.split_if_full(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    fn brute_force(entries: &[(u32, Aabb)], region: &Aabb) -> Vec<u32> {
        sorted(
            entries
                .iter()
                .filter(|(_, a)| a.overlaps(region))
                .map(|(h, _)| *h)
                .collect(),
        )
    }

    #[test]
    fn far_and_large_boxes_are_found() {
        let mut qt: Quadtree<u32> = Quadtree::new();
        let a = Aabb::new(0.0, 0.0, 1.0, 1.0);
        let b = Aabb::new(-100.0, -100.0, 99.0, 99.0);
        let d = Aabb::new(-0.5, -0.5, 0.5, 0.5);
        assert!(qt.insert(0, a));
        assert!(qt.insert(1, b));
        assert!(qt.insert(3, d));

        assert_eq!(sorted(qt.query(&d)), vec![0, 1, 3]);
        // The far box ends at -1.0, the tighter region starts at -0.99.
        assert_eq!(
            sorted(qt.query(&Aabb::new(-0.5, -0.5, 0.49, 0.49))),
            vec![0, 3]
        );
    }

    #[test]
    fn duplicate_handle_is_rejected() {
        let mut qt: Quadtree<u32> = Quadtree::new();
        assert!(qt.insert(7, Aabb::new(0.0, 0.0, 0.1, 0.1)));
        assert!(!qt.insert(7, Aabb::new(0.5, 0.5, 0.1, 0.1)));
        assert_eq!(qt.len(), 1);
        assert_eq!(qt.get(7), Some(Aabb::new(0.0, 0.0, 0.1, 0.1)));
    }

    #[test]
    fn touching_boundary_counts_as_overlap() {
        let mut qt: Quadtree<u32> = Quadtree::new();
        qt.insert(1, Aabb::new(0.25, 0.25, 0.25, 0.25));
        let hits = qt.query(&Aabb::new(0.75, 0.25, 0.25, 0.25));
        assert_eq!(hits, vec![1]);
        let mut point_hits = Vec::new();
        qt.visit_point(0.5, 0.5, |h| point_hits.push(h));
        assert_eq!(point_hits, vec![1]);
    }

    #[test]
    fn splits_and_matches_brute_force() {
        let config = QuadtreeConfig::new(Aabb::new(50.0, 50.0, 50.0, 50.0))
            .with_max_leaf_elements(2)
            .with_max_depth(6);
        let mut qt: Quadtree<u32> = Quadtree::with_config(config);
        let mut entries = Vec::new();
        let mut h = 0_u32;
        for iy in 0..12 {
            for ix in 0..12 {
                let aabb = Aabb::new(
                    f64::from(ix) * 8.5 + 2.0,
                    f64::from(iy) * 8.5 + 2.0,
                    f64::from((ix + iy) % 3) * 0.75,
                    f64::from(ix % 2) * 1.5,
                );
                assert!(qt.insert(h, aabb));
                entries.push((h, aabb));
                h += 1;
            }
        }
        assert!(qt.nodes.len() > 1, "tree should have split");
        assert_eq!(qt.overflow_len(), 0);

        let regions = [
            Aabb::new(50.0, 50.0, 50.0, 50.0),
            Aabb::new(10.0, 10.0, 5.0, 5.0),
            Aabb::new(42.5, 42.5, 0.0, 0.0),
            Aabb::new(200.0, 200.0, 10.0, 10.0),
            Aabb::new(60.0, 20.0, 30.0, 0.5),
        ];
        for region in &regions {
            assert_eq!(
                sorted(qt.query(region)),
                brute_force(&entries, region),
                "mismatch for {region:?}"
            );
        }
    }

    #[test]
    fn straddling_entries_stay_at_ancestor() {
        let config =
            QuadtreeConfig::new(Aabb::new(0.0, 0.0, 10.0, 10.0)).with_max_leaf_elements(1);
        let mut qt: Quadtree<u32> = Quadtree::with_config(config);
        qt.insert(0, Aabb::new(0.0, 0.0, 1.0, 1.0));
        qt.insert(1, Aabb::new(5.0, 5.0, 1.0, 1.0));
        qt.insert(2, Aabb::new(-5.0, 5.0, 1.0, 1.0));
        // Handle 0 straddles both split lines of the root.
        let slot = qt.slots[&0];
        assert_eq!(qt.elements[slot].as_ref().unwrap().location, Location::Node(0));
        // The others sink into the child of the quadrant holding their center.
        let first = qt.nodes[0].first_child.unwrap();
        for (handle, quadrant) in [(1, Quadrant::BottomRight), (2, Quadrant::BottomLeft)] {
            let slot = qt.slots[&handle];
            assert_eq!(
                qt.elements[slot].as_ref().unwrap().location,
                Location::Node(first + quadrant.index())
            );
        }
        assert_eq!(sorted(qt.query(&Aabb::new(0.5, 0.5, 0.1, 0.1))), vec![0]);
    }

    #[test]
    fn degenerate_clusters_respect_max_depth() {
        let config = QuadtreeConfig::default()
            .with_max_leaf_elements(1)
            .with_max_depth(4);
        let mut qt: Quadtree<u32> = Quadtree::with_config(config);
        for h in 0..50 {
            assert!(qt.insert(h, Aabb::new(0.3, 0.3, 0.0, 0.0)));
        }
        assert!(qt.nodes.iter().all(|n| n.depth <= 4));
        assert_eq!(qt.query(&Aabb::new(0.3, 0.3, 0.0, 0.0)).len(), 50);
    }

    #[test]
    fn remove_and_resize() {
        let mut qt: Quadtree<u32> = Quadtree::new();
        qt.insert(1, Aabb::new(0.5, 0.5, 0.1, 0.1));
        qt.insert(2, Aabb::new(30.0, 30.0, 1.0, 1.0));
        assert_eq!(qt.overflow_len(), 1);

        qt.resize(Aabb::new(15.0, 15.0, 20.0, 20.0));
        assert_eq!(qt.overflow_len(), 0);
        assert_eq!(qt.len(), 2);
        assert_eq!(qt.query(&Aabb::new(30.0, 30.0, 0.0, 0.0)), vec![2]);

        assert!(qt.remove(2));
        assert!(!qt.remove(2));
        assert!(!qt.contains(2));
        assert!(qt.query(&Aabb::new(30.0, 30.0, 0.0, 0.0)).is_empty());
        // The freed slot is reused and the handle can be inserted again.
        assert!(qt.insert(2, Aabb::new(0.2, 0.2, 0.0, 0.0)));
        assert_eq!(qt.len(), 2);
    }

    #[test]
    fn non_finite_boxes_are_kept_out_of_the_tree() {
        let mut qt: Quadtree<u32> = Quadtree::new();
        assert!(qt.insert(1, Aabb::new(f64::NAN, 0.0, 1.0, 1.0)));
        assert_eq!(qt.overflow_len(), 1);
        assert!(qt.query(&Aabb::new(0.0, 0.0, 100.0, 100.0)).is_empty());
    }
}
