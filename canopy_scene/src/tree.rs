// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene graph implementation: structure, updates, traversal, queries.

use alloc::{string::String, vec, vec::Vec};
use canopy_index::{Aabb, Quadtree, QuadtreeConfig};
use kurbo::{Affine, Point, Size, Vec2};

use crate::error::{Error, Property};
use crate::types::{NodeFlags, NodeId, Origin, Scale};
use crate::util::{rect_contains_closed, rect_to_aabb, transform_rect_bbox};
use crate::vector::Vector2;

/// Arena of scene nodes, organized as a forest of trees.
///
/// Nodes are addressed by [`NodeId`]. Mutations take effect on the node's local
/// state immediately but world-space data (`relative_*`, AABBs) and the spatial
/// index are only refreshed by [`SceneGraph::traverse`], which is meant to be
/// called once per frame before issuing queries.
///
/// Every tree in the forest owns its own spatial index snapshot. `traverse`,
/// `query`, and `hit_test` accept any node id and act on the tree containing it.
///
/// ## Example
///
/// ```rust
/// use canopy_index::Aabb;
/// use canopy_scene::{Origin, SceneGraph, Vector2};
///
/// let mut scene = SceneGraph::new();
/// let root = scene.create_root("root");
/// scene.set_size(root, (1.0, 1.0)).unwrap();
/// let child = scene.attach_node(root, "child").unwrap();
/// scene.set_size(child, (0.25, 0.25)).unwrap();
/// scene.set_pos(child, (0.8, 0.8)).unwrap();
///
/// // The first traverse computes everything; the second has nothing to do.
/// assert!(scene.traverse(root).unwrap());
/// assert!(!scene.traverse(root).unwrap());
///
/// // Results come back in ascending relative depth.
/// let hits = scene.query(root, &Aabb::new(0.5, 0.5, 0.5, 0.5)).unwrap();
/// assert_eq!(hits, [root, child]);
///
/// scene.set_origin(root, Origin::Center).unwrap();
/// scene.traverse(root).unwrap();
/// assert_eq!(scene.relative_pos(root), Some(Vector2::new(-0.5, -0.5)));
/// ```
pub struct SceneGraph {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    index_config: QuadtreeConfig,
}

impl core::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.len();
        let free = self.free_list.len();
        f.debug_struct("SceneGraph")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("index_config", &self.index_config)
            .finish_non_exhaustive()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Local (parent-space) state of a node.
#[derive(Clone, Debug)]
struct LocalNode {
    pos: Vector2,
    scale: Scale,
    angle: f64,
    rotation_center: Vector2,
    origin: Origin,
    size: Size,
    depth: i32,
    flags: NodeFlags,
}

impl Default for LocalNode {
    fn default() -> Self {
        Self {
            pos: Vector2::ZERO,
            scale: Scale::ONE,
            angle: 0.0,
            rotation_center: Vector2::ZERO,
            origin: Origin::TopLeft,
            size: Size::ZERO,
            depth: 1,
            flags: NodeFlags::default(),
        }
    }
}

/// Accumulated world-space frame of a node. Roots compose against `Frame::default()`.
#[derive(Clone, Copy, Debug, Default)]
struct Frame {
    pos: Vector2,
    scale: Scale,
    angle: f64,
    depth: i32,
    /// The node is distance-relative, so its children measure `pos` in scaled units too.
    distance_relative: bool,
}

impl Frame {
    fn is_finite(&self) -> bool {
        self.pos.is_finite()
            && self.scale.sx.is_finite()
            && self.scale.sy.is_finite()
            && self.angle.is_finite()
    }
}

impl LocalNode {
    /// Compose this node against its parent's frame.
    ///
    /// Returns the node's own frame, the affine mapping its rectangle
    /// `[0, w] × [0, h]` into world space, and the world AABB of that rectangle.
    fn compose(&self, parent: &Frame) -> (Frame, Affine, Aabb) {
        let scale = parent.scale * self.scale;
        let angle = parent.angle + self.angle;
        let depth = parent.depth.saturating_add(self.depth);
        let s = scale.to_vector();
        let own_relative = self.flags.contains(NodeFlags::DISTANCE_RELATIVE);

        let anchor = if own_relative || parent.distance_relative {
            self.pos * s
        } else {
            self.pos
        };
        let pos = parent.pos + (anchor + self.origin.offset(self.size) * s).rotated(parent.angle);

        // The node's own angle turns the rectangle about its pivot; `pos` stays
        // where the parent frame put it.
        let translation = if self.angle == 0.0 {
            pos
        } else {
            let pivot = (Vector2::new(self.size.width, self.size.height) * 0.5
                + self.rotation_center)
                * s;
            pos + pivot.rotated(parent.angle) - pivot.rotated(angle)
        };
        let transform = Affine::translate(Vec2::from(translation))
            * Affine::rotate(-angle.to_radians())
            * Affine::scale_non_uniform(scale.sx, scale.sy);
        let bbox = transform_rect_bbox(transform, self.size.to_rect());

        (
            Frame {
                pos,
                scale,
                angle,
                depth,
                distance_relative: own_relative,
            },
            transform,
            rect_to_aabb(bbox),
        )
    }
}

#[derive(Clone, Debug)]
struct WorldNode {
    frame: Frame,
    transform: Affine,
    aabb: Aabb,
    finite: bool,
}

impl Default for WorldNode {
    fn default() -> Self {
        Self {
            frame: Frame::default(),
            transform: Affine::IDENTITY,
            aabb: Aabb::new(0.0, 0.0, 0.0, 0.0),
            finite: true,
        }
    }
}

/// Spatial index entry. The sort key is captured at indexing time so it
/// always belongs to the snapshot that returns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Indexed {
    id: NodeId,
    depth: i32,
    /// Pre-order position in the traversal that built the snapshot.
    order: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct Dirty {
    /// The cached frame of this node is stale.
    transform: bool,
    /// Something at or below this node changed. Set on every ancestor of a
    /// change, so a set flag implies the parent's flag is set too.
    subtree: bool,
}

#[derive(Debug)]
struct Node {
    generation: u32,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: LocalNode,
    world: WorldNode,
    dirty: Dirty,
    /// Spatial index snapshot; only roots carry one, after their first traversal.
    index: Option<Quadtree<Indexed>>,
}

impl Node {
    fn new(generation: u32, name: String, local: LocalNode) -> Self {
        Self {
            generation,
            name,
            parent: None,
            children: Vec::new(),
            local,
            world: WorldNode::default(),
            dirty: Dirty {
                transform: true,
                subtree: true,
            },
            index: None,
        }
    }
}

fn detached(id: NodeId) -> Error {
    log::debug!("rejected operation on removed node {id:?}");
    Error::DetachedNode(id)
}

fn invalid(property: Property, reason: &'static str) -> Error {
    log::debug!("rejected {property}: {reason}");
    Error::InvalidGeometry { property, reason }
}

fn check_finite(property: Property, v: Vector2) -> Result<Vector2, Error> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(invalid(property, "components must be finite"))
    }
}

impl SceneGraph {
    /// Create an empty scene graph with the default index configuration.
    pub fn new() -> Self {
        Self::with_index_config(QuadtreeConfig::default())
    }

    /// Create an empty scene graph whose spatial index snapshots use `config`.
    ///
    /// Only the leaf capacity and maximum depth are used; the bounds are refitted
    /// to the indexed nodes on every rebuild.
    pub fn with_index_config(config: QuadtreeConfig) -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            index_config: config,
        }
    }

    /// The index configuration used for spatial snapshots.
    pub fn index_config(&self) -> &QuadtreeConfig {
        &self.index_config
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Whether the graph has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(Option::is_none)
    }

    /// Iterate over the roots of every tree in the graph.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            Some(n) if n.parent.is_none() =>
            {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "NodeId uses 32-bit indices by design."
                )]
                Some(NodeId::new(i as u32, n.generation))
            }
            _ => None,
        })
    }

    // --- structure ---

    /// Create a free-standing root node with a default local transform.
    pub fn create_root(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(name.into(), LocalNode::default())
    }

    /// Create a child of `parent` with a default local transform.
    ///
    /// The child is appended after its existing siblings and starts dirty. It
    /// starts with the parent's [`NodeFlags::DISTANCE_RELATIVE`] setting; either
    /// way, a distance-relative parent scales the child's position.
    pub fn attach_node(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId, Error> {
        let parent_flags = self.get(parent).ok_or_else(|| detached(parent))?.local.flags;
        let mut local = LocalNode::default();
        local.flags.set(
            NodeFlags::DISTANCE_RELATIVE,
            parent_flags.contains(NodeFlags::DISTANCE_RELATIVE),
        );
        let id = self.alloc(name.into(), local);
        self.link_parent(id, parent);
        self.mark_subtree_dirty(Some(parent));
        Ok(id)
    }

    /// Move `id` (with its subtree) under `new_parent`, appending it after the
    /// existing children.
    ///
    /// Fails with [`Error::CyclicReparent`] if `new_parent` is `id` itself or one
    /// of its descendants.
    pub fn reparent_to(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), Error> {
        if !self.is_alive(id) {
            return Err(detached(id));
        }
        if !self.is_alive(new_parent) {
            return Err(detached(new_parent));
        }
        if id == new_parent || self.is_ancestor(id, new_parent) {
            log::debug!("rejected reparent of {id:?} under {new_parent:?}: cycle");
            return Err(Error::CyclicReparent {
                node: id,
                parent: new_parent,
            });
        }
        if let Some(old) = self.node(id).parent {
            self.unlink_parent(id, old);
            self.mark_subtree_dirty(Some(old));
        }
        self.link_parent(id, new_parent);
        let node = self.node_mut(id);
        node.index = None;
        node.dirty.transform = true;
        self.mark_subtree_dirty(Some(new_parent));
        Ok(())
    }

    /// Detach `id` from its parent, making it the root of its own tree.
    ///
    /// Does nothing for a node that already is a root.
    pub fn detach(&mut self, id: NodeId) -> Result<(), Error> {
        let parent = self.get(id).ok_or_else(|| detached(id))?.parent;
        if let Some(old) = parent {
            self.unlink_parent(id, old);
            self.mark_subtree_dirty(Some(old));
            let node = self.node_mut(id);
            node.dirty.transform = true;
            node.dirty.subtree = true;
        }
        Ok(())
    }

    /// Remove a node and its whole subtree.
    ///
    /// Every id in the subtree becomes stale immediately and is never returned by
    /// a query again, even before the next traversal rebuilds the index.
    pub fn remove(&mut self, id: NodeId) -> Result<(), Error> {
        let parent = self.get(id).ok_or_else(|| detached(id))?.parent;
        if let Some(p) = parent {
            self.unlink_parent(id, p);
            self.mark_subtree_dirty(Some(p));
        }
        let mut removed = 0_usize;
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(n.idx());
                removed += 1;
            }
        }
        log::trace!("removed {removed} nodes rooted at {id:?}");
        Ok(())
    }

    // --- local properties ---

    /// Set the local position (in parent space).
    pub fn set_pos(&mut self, id: NodeId, pos: impl Into<Vector2>) -> Result<(), Error> {
        let pos = check_finite(Property::Position, pos.into())?;
        self.update_local(id, |l| replace(&mut l.pos, pos))
    }

    /// Set the local scale. Both factors must be finite and greater than zero.
    pub fn set_scale(&mut self, id: NodeId, scale: impl Into<Scale>) -> Result<(), Error> {
        let scale: Scale = scale.into();
        if !scale.is_valid() {
            return Err(invalid(
                Property::Scale,
                "factors must be finite and greater than zero",
            ));
        }
        self.update_local(id, |l| replace(&mut l.scale, scale))
    }

    /// Set the local angle in degrees. See [`Vector2::rotated`] for the direction.
    pub fn set_angle(&mut self, id: NodeId, degrees: f64) -> Result<(), Error> {
        if !degrees.is_finite() {
            return Err(invalid(Property::Angle, "angle must be finite"));
        }
        self.update_local(id, |l| replace(&mut l.angle, degrees))
    }

    /// Set the rotation pivot, as an offset from the center of the rectangle in
    /// unscaled local units.
    pub fn set_rotation_center(
        &mut self,
        id: NodeId,
        center: impl Into<Vector2>,
    ) -> Result<(), Error> {
        let center = check_finite(Property::RotationCenter, center.into())?;
        self.update_local(id, |l| replace(&mut l.rotation_center, center))
    }

    /// Set which point of the rectangle is placed at `pos`.
    pub fn set_origin(&mut self, id: NodeId, origin: Origin) -> Result<(), Error> {
        self.update_local(id, |l| replace(&mut l.origin, origin))
    }

    /// Set the rectangle size before scaling. Components must be finite and non-negative.
    pub fn set_size(&mut self, id: NodeId, size: impl Into<Size>) -> Result<(), Error> {
        let size: Size = size.into();
        if !(size.width.is_finite() && size.height.is_finite()) {
            return Err(invalid(Property::Size, "components must be finite"));
        }
        if size.width < 0.0 || size.height < 0.0 {
            return Err(invalid(Property::Size, "components must not be negative"));
        }
        self.update_local(id, |l| replace(&mut l.size, size))
    }

    /// Set the depth added to the parent's relative depth.
    pub fn set_depth(&mut self, id: NodeId, depth: i32) -> Result<(), Error> {
        self.update_local(id, |l| replace(&mut l.depth, depth))
    }

    /// Hide or show a node together with its subtree.
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> Result<(), Error> {
        let node = self.node_opt_mut(id).ok_or_else(|| detached(id))?;
        if node.local.flags.contains(NodeFlags::VISIBLE) == hidden {
            node.local.flags.set(NodeFlags::VISIBLE, !hidden);
            self.mark_subtree_dirty(Some(id));
        }
        Ok(())
    }

    /// Shorthand for `set_hidden(id, true)`.
    pub fn hide(&mut self, id: NodeId) -> Result<(), Error> {
        self.set_hidden(id, true)
    }

    /// Shorthand for `set_hidden(id, false)`.
    pub fn show(&mut self, id: NodeId) -> Result<(), Error> {
        self.set_hidden(id, false)
    }

    /// Measure the local position in the node's relative scale.
    ///
    /// A distance-relative node also does this for its direct children,
    /// whatever their own flag says.
    pub fn set_distance_relative(&mut self, id: NodeId, enabled: bool) -> Result<(), Error> {
        self.update_local(id, |l| {
            let changed = l.flags.contains(NodeFlags::DISTANCE_RELATIVE) != enabled;
            l.flags.set(NodeFlags::DISTANCE_RELATIVE, enabled);
            changed
        })
    }

    // --- frame loop ---

    /// Recompute the tree containing `id` if anything in it changed.
    ///
    /// Walks the tree depth-first from its root, recomputing the relative
    /// transform of every node that is dirty or below a dirty node, then
    /// rebuilds the tree's spatial index snapshot. Returns whether anything was
    /// dirty. A second call without intervening mutation returns `false`.
    pub fn traverse(&mut self, id: NodeId) -> Result<bool, Error> {
        let root = self.root_of(id).ok_or_else(|| detached(id))?;
        let dirty = self.node(root).dirty;
        if !(dirty.transform || dirty.subtree) {
            return Ok(false);
        }
        let entries = self.update_world(root);
        let bounds = entries
            .iter()
            .map(|(_, aabb)| *aabb)
            .reduce(|acc, aabb| acc.union(&aabb))
            .unwrap_or_default();
        let mut index = Quadtree::with_config(self.index_config.with_bounds(bounds));
        for (entry, aabb) in entries {
            index.insert(entry, aabb);
        }
        log::trace!("indexed {} nodes under {root:?}", index.len());
        self.node_mut(root).index = Some(index);
        Ok(true)
    }

    /// Traverse every tree in the graph. Returns whether any of them was dirty.
    pub fn traverse_all(&mut self) -> bool {
        let roots: Vec<NodeId> = self.roots().collect();
        let mut any = false;
        for root in roots {
            any |= self.traverse(root).unwrap_or(false);
        }
        any
    }

    // --- queries ---

    /// Nodes of the tree containing `id` whose AABB overlaps `region`, in
    /// ascending relative depth (back to front).
    ///
    /// Nodes at equal depth keep their pre-order position: parents before
    /// children, siblings in insertion order. Results reflect the last
    /// [`traverse`](Self::traverse); before the first one the result is empty.
    pub fn query(&self, id: NodeId, region: &Aabb) -> Result<Vec<NodeId>, Error> {
        let mut hits = Vec::new();
        self.visit_shown(id, region, |entry| hits.push(entry))?;
        hits.sort_by_key(|entry| (entry.depth, entry.order));
        Ok(hits.into_iter().map(|entry| entry.id).collect())
    }

    /// Like [`query`](Self::query) without the depth ordering.
    pub fn query_unsorted(&self, id: NodeId, region: &Aabb) -> Result<Vec<NodeId>, Error> {
        let mut hits = Vec::new();
        self.visit_shown(id, region, |entry| hits.push(entry.id))?;
        Ok(hits)
    }

    /// Nodes whose AABB contains `point`, back to front.
    pub fn query_point(
        &self,
        id: NodeId,
        point: impl Into<Vector2>,
    ) -> Result<Vec<NodeId>, Error> {
        let p: Vector2 = point.into();
        self.query(id, &Aabb::new(p.x, p.y, 0.0, 0.0))
    }

    /// The front-most node whose (possibly rotated) rectangle contains `point`.
    ///
    /// Unlike [`query_point`](Self::query_point) this rejects points that fall
    /// inside a rotated node's AABB but outside the node itself.
    pub fn hit_test(
        &self,
        id: NodeId,
        point: impl Into<Vector2>,
    ) -> Result<Option<NodeId>, Error> {
        let p: Vector2 = point.into();
        let world = Point::from(p);
        let candidates = self.query_point(id, p)?;
        Ok(candidates.into_iter().rev().find(|&n| {
            let node = self.node(n);
            let local = node.world.transform.inverse() * world;
            rect_contains_closed(node.local.size.to_rect(), local)
        }))
    }

    // --- relative positioning ---

    /// `relative_pos(id) - relative_pos(other)`, traversing first if needed.
    pub fn position_relative_to(&mut self, id: NodeId, other: NodeId) -> Result<Vector2, Error> {
        self.traverse(id)?;
        self.traverse(other)?;
        Ok(self.node(id).world.frame.pos - self.node(other).world.frame.pos)
    }

    /// Set the local position of `id` so that its relative position becomes
    /// `relative_pos(other) + offset`.
    ///
    /// This is a one-shot placement: moving `other` later does not move `id`.
    /// Both trees are traversed first if they are dirty. The solve accounts for
    /// the parent's rotation and scale, the node's origin, and
    /// [`NodeFlags::DISTANCE_RELATIVE`].
    pub fn set_position_relative_to(
        &mut self,
        id: NodeId,
        other: NodeId,
        offset: impl Into<Vector2>,
    ) -> Result<(), Error> {
        let offset = check_finite(Property::Offset, offset.into())?;
        self.traverse(id)?;
        self.traverse(other)?;
        let target = self.node(other).world.frame.pos + offset;

        let node = self.node(id);
        let parent = match node.parent {
            Some(p) => self.node(p).world.frame,
            None => Frame::default(),
        };
        let local = &node.local;
        let s = (parent.scale * local.scale).to_vector();
        let corner = local.origin.offset(local.size) * s;
        let mut pos = (target - parent.pos).rotated(-parent.angle) - corner;
        if parent.distance_relative || local.flags.contains(NodeFlags::DISTANCE_RELATIVE) {
            pos = pos / s;
        }
        self.set_pos(id, pos)
    }

    // --- accessors ---

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// The name given at creation.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.name.as_str())
    }

    /// The first child of `parent` called `name`.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|&c| self.name(c) == Some(name))
    }

    /// Returns the parent of a node if live, or `None` for roots or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get the children of a node in insertion order, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[][..], |n| n.children.as_slice())
    }

    /// The root of the tree containing `id`.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = id;
        loop {
            match self.get(cur)?.parent {
                Some(p) => cur = p,
                None => return Some(cur),
            }
        }
    }

    /// Local position.
    pub fn pos(&self, id: NodeId) -> Option<Vector2> {
        self.get(id).map(|n| n.local.pos)
    }

    /// Local scale.
    pub fn scale(&self, id: NodeId) -> Option<Scale> {
        self.get(id).map(|n| n.local.scale)
    }

    /// Local angle in degrees.
    pub fn angle(&self, id: NodeId) -> Option<f64> {
        self.get(id).map(|n| n.local.angle)
    }

    /// Rotation pivot offset from the rectangle's center.
    pub fn rotation_center(&self, id: NodeId) -> Option<Vector2> {
        self.get(id).map(|n| n.local.rotation_center)
    }

    /// Anchor of the rectangle.
    pub fn origin(&self, id: NodeId) -> Option<Origin> {
        self.get(id).map(|n| n.local.origin)
    }

    /// Unscaled rectangle size.
    pub fn size(&self, id: NodeId) -> Option<Size> {
        self.get(id).map(|n| n.local.size)
    }

    /// Local depth.
    pub fn depth(&self, id: NodeId) -> Option<i32> {
        self.get(id).map(|n| n.local.depth)
    }

    /// Whether the node itself is marked hidden. Ancestors are not consulted.
    pub fn is_hidden(&self, id: NodeId) -> Option<bool> {
        self.get(id)
            .map(|n| !n.local.flags.contains(NodeFlags::VISIBLE))
    }

    /// Whether the local position is measured in the parent's scaled units.
    pub fn is_distance_relative(&self, id: NodeId) -> Option<bool> {
        self.get(id)
            .map(|n| n.local.flags.contains(NodeFlags::DISTANCE_RELATIVE))
    }

    /// Flags of the node.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.get(id).map(|n| n.local.flags)
    }

    /// World position of the node's top-left corner, as of the last traversal.
    pub fn relative_pos(&self, id: NodeId) -> Option<Vector2> {
        self.get(id).map(|n| n.world.frame.pos)
    }

    /// Product of the scales from the root down to this node.
    pub fn relative_scale(&self, id: NodeId) -> Option<Scale> {
        self.get(id).map(|n| n.world.frame.scale)
    }

    /// Sum of the angles from the root down to this node, in degrees.
    pub fn relative_angle(&self, id: NodeId) -> Option<f64> {
        self.get(id).map(|n| n.world.frame.angle)
    }

    /// Sum of the depths from the root down to this node.
    pub fn relative_depth(&self, id: NodeId) -> Option<i32> {
        self.get(id).map(|n| n.world.frame.depth)
    }

    /// Size after applying the relative scale.
    pub fn relative_size(&self, id: NodeId) -> Option<Size> {
        self.get(id).map(|n| {
            let s = n.world.frame.scale;
            Size::new(n.local.size.width * s.sx, n.local.size.height * s.sy)
        })
    }

    /// World-space AABB, as of the last traversal.
    pub fn aabb(&self, id: NodeId) -> Option<Aabb> {
        self.get(id).map(|n| n.world.aabb)
    }

    /// Affine mapping the node's rectangle `[0, w] × [0, h]` into world space.
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        self.get(id).map(|n| n.world.transform)
    }

    /// Whether the cached relative transform is stale, because the node or
    /// one of its ancestors changed since the last traversal.
    pub fn is_dirty(&self, id: NodeId) -> Option<bool> {
        let mut node = self.get(id)?;
        loop {
            if node.dirty.transform {
                return Some(true);
            }
            match node.parent {
                Some(p) => node = self.node(p),
                None => return Some(false),
            }
        }
    }

    /// Whether the last traversal produced a non-finite transform for the node.
    ///
    /// Such nodes are left out of the spatial index.
    pub fn is_degenerate(&self, id: NodeId) -> Option<bool> {
        self.get(id).map(|n| !n.world.finite)
    }

    // --- internals ---

    fn alloc(&mut self, name: String, local: LocalNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, name, local));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, name, local)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    fn get(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    /// Access a live node; panics if `id` is stale.
    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a live node mutably; panics if `id` is stale.
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        let parent_node = self.node_mut(parent);
        parent_node.children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        let p = self.node_mut(parent);
        p.children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.parent_of(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent_of(p);
        }
        false
    }

    /// Whether `id` belongs to the tree rooted at `root` and neither it nor
    /// any ancestor is hidden.
    fn is_shown_under(&self, id: NodeId, root: NodeId) -> bool {
        let mut cur = id;
        loop {
            let Some(node) = self.get(cur) else {
                return false;
            };
            if !node.local.flags.contains(NodeFlags::VISIBLE) {
                return false;
            }
            match node.parent {
                Some(p) => cur = p,
                None => return cur == root,
            }
        }
    }

    /// Visit the snapshot entries of the tree containing `id` that overlap
    /// `region` and are still shown in that tree.
    fn visit_shown(
        &self,
        id: NodeId,
        region: &Aabb,
        mut f: impl FnMut(Indexed),
    ) -> Result<(), Error> {
        let root = self.root_of(id).ok_or_else(|| detached(id))?;
        if let Some(index) = &self.node(root).index {
            index.visit(region, |entry| {
                if self.is_shown_under(entry.id, root) {
                    f(entry);
                }
            });
        }
        Ok(())
    }

    /// Apply `f` to the local state of `id`; if it reports a change, mark the
    /// node's transform dirty.
    fn update_local(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut LocalNode) -> bool,
    ) -> Result<(), Error> {
        let node = self.node_opt_mut(id).ok_or_else(|| detached(id))?;
        if f(&mut node.local) {
            node.dirty.transform = true;
            self.mark_subtree_dirty(Some(id));
        }
        Ok(())
    }

    /// Flag `from` and its ancestors as containing a change.
    fn mark_subtree_dirty(&mut self, from: Option<NodeId>) {
        let mut cur = from;
        while let Some(id) = cur {
            let node = self.node_mut(id);
            if node.dirty.subtree {
                break;
            }
            node.dirty.subtree = true;
            cur = node.parent;
        }
    }

    /// Recompute world data below `root` and collect the entries to index.
    fn update_world(&mut self, root: NodeId) -> Vec<(Indexed, Aabb)> {
        let mut entries = Vec::new();
        let mut recomputed = 0_usize;
        let mut order = 0_usize;
        // (node, parent frame, an ancestor was recomputed, an ancestor is hidden)
        let mut stack = vec![(root, Frame::default(), false, false)];

        while let Some((id, parent_frame, ancestor_dirty, ancestor_hidden)) = stack.pop() {
            let node = self.node_mut(id);
            let recompute = ancestor_dirty || node.dirty.transform;
            if recompute {
                let (frame, transform, aabb) = node.local.compose(&parent_frame);
                let finite = frame.is_finite() && aabb.is_finite();
                if !finite {
                    log::warn!(
                        "node {id:?} ({:?}) has a non-finite transform; leaving it out of the index",
                        node.name
                    );
                }
                node.world.frame = frame;
                node.world.transform = transform;
                node.world.aabb = aabb;
                node.world.finite = finite;
                recomputed += 1;
            }
            node.dirty = Dirty::default();

            let hidden = ancestor_hidden || !node.local.flags.contains(NodeFlags::VISIBLE);
            if !hidden && node.world.finite && node.local.size != Size::ZERO {
                let entry = Indexed {
                    id,
                    depth: node.world.frame.depth,
                    order,
                };
                entries.push((entry, node.world.aabb));
            }
            order += 1;

            // Reverse so children pop in insertion order.
            let frame = node.world.frame;
            for &child in node.children.iter().rev() {
                stack.push((child, frame, recompute, hidden));
            }
        }

        log::trace!(
            "traversed {order} nodes under {root:?}: {recomputed} recomputed, {} indexable",
            entries.len()
        );
        entries
    }
}

/// Store `value` in `slot`, reporting whether it differed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
