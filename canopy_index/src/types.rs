// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types: the center/half-extent AABB and quadrant labels.

/// Axis-aligned bounding box in 2D, stored as a center point and half extents.
///
/// The box covers the closed rectangle
/// `[center_x - half_width, center_x + half_width] × [center_y - half_height, center_y + half_height]`.
/// All predicates use closed intervals, so boxes that only share an edge or a
/// corner overlap, and a point on the boundary is inside.
///
/// Half extents are expected to be non-negative. Debug builds assert this in
/// [`Aabb::new`]; use [`Aabb::from_min_max`] when the corners may arrive in any order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Center x.
    pub center_x: f64,
    /// Center y.
    pub center_y: f64,
    /// Half of the width.
    pub half_width: f64,
    /// Half of the height.
    pub half_height: f64,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

impl Aabb {
    /// Create a new AABB from its center and half extents.
    #[inline]
    pub fn new(center_x: f64, center_y: f64, half_width: f64, half_height: f64) -> Self {
        debug_assert!(
            !(half_width < 0.0 || half_height < 0.0),
            "AABB half extents must be non-negative"
        );
        Self {
            center_x,
            center_y,
            half_width,
            half_height,
        }
    }

    /// Create an AABB spanning two corners. The corners may be given in any order.
    #[inline]
    pub fn from_min_max(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let (min_x, max_x) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (min_y, max_y) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        let half_width = (max_x - min_x) * 0.5;
        let half_height = (max_y - min_y) * 0.5;
        Self {
            center_x: min_x + half_width,
            center_y: min_y + half_height,
            half_width,
            half_height,
        }
    }

    /// Left edge.
    #[inline]
    pub fn min_x(&self) -> f64 {
        self.center_x - self.half_width
    }

    /// Top edge.
    #[inline]
    pub fn min_y(&self) -> f64 {
        self.center_y - self.half_height
    }

    /// Right edge.
    #[inline]
    pub fn max_x(&self) -> f64 {
        self.center_x + self.half_width
    }

    /// Bottom edge.
    #[inline]
    pub fn max_y(&self) -> f64 {
        self.center_y + self.half_height
    }

    /// Whether `other` lies entirely inside this box (closed intervals).
    ///
    /// A box contains itself.
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x() <= other.min_x()
            && self.max_x() >= other.max_x()
            && self.min_y() <= other.min_y()
            && self.max_y() >= other.max_y()
    }

    /// Whether the point `(x, y)` lies inside this box (closed intervals).
    #[inline]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.min_x() <= x && x <= self.max_x() && self.min_y() <= y && y <= self.max_y()
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// The edge of the AABB is considered part of itself, so two AABBs that
    /// share an edge or a corner overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use canopy_index::Aabb;
    ///
    /// let a = Aabb::new(0.5, 0.5, 0.5, 0.5);
    /// assert!(a.overlaps(&Aabb::new(0.0, 0.0, 0.5, 0.5)));
    /// // Touching edges at x = 1.0.
    /// assert!(a.overlaps(&Aabb::new(1.5, 0.5, 0.5, 0.5)));
    /// assert!(!a.overlaps(&Aabb::new(1.6, 0.5, 0.5, 0.5)));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x() <= other.max_x()
            && self.max_x() >= other.min_x()
            && self.min_y() <= other.max_y()
            && self.max_y() >= other.min_y()
    }

    /// The smallest AABB enclosing both boxes.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self::from_min_max(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Whether every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.center_x.is_finite()
            && self.center_y.is_finite()
            && self.half_width.is_finite()
            && self.half_height.is_finite()
    }

    /// Whether the box has no area (a point or a line segment).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.half_width <= 0.0 || self.half_height <= 0.0
    }

    /// The quadrant of this box that the point `(x, y)` falls in.
    ///
    /// Points on the center lines belong to the right/bottom side. The point is
    /// not required to lie inside the box.
    #[inline]
    pub fn quadrant_of(&self, x: f64, y: f64) -> Quadrant {
        match (x < self.center_x, y < self.center_y) {
            (true, true) => Quadrant::TopLeft,
            (false, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BottomLeft,
            (false, false) => Quadrant::BottomRight,
        }
    }

    /// The sub-box covering one quadrant of this box.
    #[inline]
    pub fn split(&self, quadrant: Quadrant) -> Self {
        let hw = self.half_width * 0.5;
        let hh = self.half_height * 0.5;
        let (sx, sy) = match quadrant {
            Quadrant::TopLeft => (-1.0, -1.0),
            Quadrant::TopRight => (1.0, -1.0),
            Quadrant::BottomLeft => (-1.0, 1.0),
            Quadrant::BottomRight => (1.0, 1.0),
        };
        Self::new(self.center_x + sx * hw, self.center_y + sy * hh, hw, hh)
    }
}

/// One of the four quadrants of a box, in y-down orientation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Smaller x, smaller y.
    TopLeft = 0,
    /// Larger x, smaller y.
    TopRight = 1,
    /// Smaller x, larger y.
    BottomLeft = 2,
    /// Larger x, larger y.
    BottomRight = 3,
}

impl Quadrant {
    /// All quadrants in child-slot order.
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Child-slot offset of this quadrant.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::{Aabb, Quadrant};

    #[test]
    fn containment_and_overlap() {
        let a = Aabb::new(0.5, 0.5, 0.5, 0.5);
        let b = Aabb::new(0.5, 0.5, 0.4, 0.4);
        let c = Aabb::new(0.55, 0.55, 0.45, 0.45);
        let d = Aabb::new(0.0, 0.0, 0.5, 0.5);

        assert!(a.contains(&b));
        assert!(a.contains(&c), "c touches the right and bottom edges of a");
        assert!(a.overlaps(&c));
        assert!(a.overlaps(&d));
        assert!(a.contains_point(1.0, 1.0), "corner point is inside");
        assert!(a.contains_point(1.0 - 1e-7, 1.0 - 1e-7));
        assert!(!a.contains_point(1.0 + 1e-7, 0.5));
    }

    #[test]
    fn predicates_are_consistent() {
        let boxes = [
            Aabb::new(0.0, 0.0, 1.0, 1.0),
            Aabb::new(-100.0, -100.0, 99.0, 99.0),
            Aabb::new(-0.5, -0.5, 0.5, 0.5),
            Aabb::new(2.0, 0.0, 1.0, 0.0),
            Aabb::new(3.0, 3.0, 0.0, 0.0),
        ];
        for a in &boxes {
            for b in &boxes {
                if a.contains(b) || b.contains(a) {
                    assert!(a.overlaps(b), "containment implies overlap: {a:?} {b:?}");
                }
                let corners = [
                    (b.min_x(), b.min_y()),
                    (b.max_x(), b.min_y()),
                    (b.min_x(), b.max_y()),
                    (b.max_x(), b.max_y()),
                ];
                if corners.iter().any(|&(x, y)| a.contains_point(x, y)) {
                    assert!(a.overlaps(b), "corner inside implies overlap: {a:?} {b:?}");
                }
                assert_eq!(a.overlaps(b), b.overlaps(a), "overlap must be symmetric");
            }
        }
    }

    #[test]
    fn from_min_max_normalizes() {
        let a = Aabb::from_min_max(2.0, 3.0, -2.0, -1.0);
        assert_eq!(a, Aabb::new(0.0, 1.0, 2.0, 2.0));
        assert_eq!(a.min_x(), -2.0);
        assert_eq!(a.max_y(), 3.0);
    }

    #[test]
    fn split_covers_parent() {
        let a = Aabb::new(0.0, 0.0, 4.0, 2.0);
        let tl = a.split(Quadrant::TopLeft);
        assert_eq!(tl, Aabb::new(-2.0, -1.0, 2.0, 1.0));
        let union = Quadrant::ALL
            .iter()
            .map(|&q| a.split(q))
            .reduce(|acc, q| acc.union(&q))
            .unwrap();
        assert_eq!(union, a);
        assert_eq!(a.quadrant_of(-1.0, 1.0), Quadrant::BottomLeft);
        assert_eq!(a.quadrant_of(0.0, 0.0), Quadrant::BottomRight);
    }

    #[test]
    fn degenerate_boxes() {
        let point = Aabb::new(1.0, 1.0, 0.0, 0.0);
        assert!(point.is_degenerate());
        assert!(point.overlaps(&point));
        assert!(point.contains(&point));
        assert!(Aabb::new(0.0, 0.0, 1.0, 1.0).overlaps(&point));
        assert!(!Aabb::new(f64::NAN, 0.0, 1.0, 1.0).is_finite());
    }
}
