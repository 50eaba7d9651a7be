// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers, flags, anchors, and scale.

use core::ops::Mul;

use kurbo::Size;

use crate::vector::Vector2;

/// Identifier for a node in a [`SceneGraph`](crate::SceneGraph) (generational).
///
/// A slot index paired with a generation counter. When a node is removed its slot
/// may be recycled, but the generation is bumped, so an old `NodeId` never refers
/// to a different node. Accessors treat such a stale id as "not found".
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Pack the id into a single integer, for use as a key in external maps.
    ///
    /// Distinct ids of one graph always pack to distinct values.
    pub const fn to_bits(self) -> u64 {
        ((self.1 as u64) << 32) | self.0 as u64
    }
}

bitflags::bitflags! {
    /// Per-node behavior flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible. Clearing it hides the node and its whole subtree
        /// from queries.
        const VISIBLE           = 0b0000_0001;
        /// Local `pos` is measured in the parent's scaled units instead of
        /// world units.
        const DISTANCE_RELATIVE = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Anchor point of a node's rectangle.
///
/// The origin decides which point of the rectangle sits at the node's `pos`.
/// With [`Origin::TopLeft`] the top-left corner is placed at `pos`; with
/// [`Origin::Center`] the center is.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Top-left corner.
    #[default]
    TopLeft,
    /// Middle of the top edge.
    TopCenter,
    /// Top-right corner.
    TopRight,
    /// Middle of the left edge.
    CenterLeft,
    /// Center of the rectangle.
    Center,
    /// Middle of the right edge.
    CenterRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Middle of the bottom edge.
    BottomCenter,
    /// Bottom-right corner.
    BottomRight,
}

impl Origin {
    /// All anchors, row by row from the top.
    pub const ALL: [Self; 9] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::CenterLeft,
        Self::Center,
        Self::CenterRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// Fractions of the width and height between the top-left corner and the anchor.
    pub const fn factors(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopCenter => (0.5, 0.0),
            Self::TopRight => (1.0, 0.0),
            Self::CenterLeft => (0.0, 0.5),
            Self::Center => (0.5, 0.5),
            Self::CenterRight => (1.0, 0.5),
            Self::BottomLeft => (0.0, 1.0),
            Self::BottomCenter => (0.5, 1.0),
            Self::BottomRight => (1.0, 1.0),
        }
    }

    /// Offset from the anchor to the top-left corner for a rectangle of `size`.
    ///
    /// ```
    /// use canopy_scene::{Origin, Vector2};
    /// use kurbo::Size;
    ///
    /// assert_eq!(Origin::Center.offset(Size::new(1.0, 1.0)), Vector2::new(-0.5, -0.5));
    /// assert_eq!(Origin::TopLeft.offset(Size::new(1.0, 1.0)), Vector2::ZERO);
    /// ```
    pub fn offset(self, size: Size) -> Vector2 {
        let (fx, fy) = self.factors();
        Vector2::new(-fx * size.width, -fy * size.height)
    }
}

/// Non-uniform scale factors. Both must be finite and strictly positive on a node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Scale {
    /// Horizontal factor.
    pub sx: f64,
    /// Vertical factor.
    pub sy: f64,
}

impl Scale {
    /// No scaling.
    pub const ONE: Self = Self::new(1.0, 1.0);

    /// Create a scale from its factors.
    pub const fn new(sx: f64, sy: f64) -> Self {
        Self { sx, sy }
    }

    /// The same factor on both axes.
    pub const fn uniform(s: f64) -> Self {
        Self::new(s, s)
    }

    /// Whether both factors are finite and greater than zero.
    pub fn is_valid(self) -> bool {
        self.sx.is_finite() && self.sy.is_finite() && self.sx > 0.0 && self.sy > 0.0
    }

    /// The factors as a vector, for component-wise products.
    pub const fn to_vector(self) -> Vector2 {
        Vector2::new(self.sx, self.sy)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::ONE
    }
}

impl From<f64> for Scale {
    fn from(s: f64) -> Self {
        Self::uniform(s)
    }
}

impl From<(f64, f64)> for Scale {
    fn from((sx, sy): (f64, f64)) -> Self {
        Self::new(sx, sy)
    }
}

impl Mul for Scale {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.sx * rhs.sx, self.sy * rhs.sy)
    }
}
