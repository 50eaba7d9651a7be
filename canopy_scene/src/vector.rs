// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-component vector used for positions, offsets, and pivots.

use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use kurbo::{Point, Vec2};

/// A 2D vector (or point) with `f64` components.
///
/// Arithmetic produces new values. `Vector2 * Vector2` and `Vector2 / Vector2`
/// are component-wise.
///
/// # Rotation convention
///
/// [`rotated`](Self::rotated) takes degrees. A positive angle turns `+x` towards
/// `-y`: on a y-down screen that reads as counter-clockwise.
///
/// ```
/// use canopy_scene::Vector2;
///
/// let v = Vector2::new(0.1, 0.1).rotated(90.0);
/// assert!(v.almost_equal(Vector2::new(0.1, -0.1), 1e-12));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

/// Points and vectors share one representation.
pub type Point2 = Vector2;

impl Vector2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a vector from its components.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f64 {
        Vec2::from(self).hypot()
    }

    /// Squared length.
    #[inline]
    pub fn magnitude(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// A unit vector in the same direction, or [`Vector2::ZERO`] for a zero-length input.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut v = self;
        if v.normalize() { v } else { Self::ZERO }
    }

    /// Scale to unit length in place.
    ///
    /// Returns `false` and leaves the vector untouched when its length is zero
    /// (or not finite).
    pub fn normalize(&mut self) -> bool {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return false;
        }
        self.x /= len;
        self.y /= len;
        true
    }

    /// Rotate about the origin by `degrees`. See the type docs for the direction.
    pub fn rotated(self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return self;
        }
        let Vec2 { x: cos, y: sin } = Vec2::from_angle(-degrees.to_radians());
        Self::new(cos * self.x - sin * self.y, sin * self.x + cos * self.y)
    }

    /// Rotate in place about the origin by `degrees`.
    #[inline]
    pub fn rotate(&mut self, degrees: f64) {
        *self = self.rotated(degrees);
    }

    /// Divide by a scalar, or `None` if `rhs` is zero.
    #[inline]
    pub fn checked_div(self, rhs: f64) -> Option<Self> {
        (rhs != 0.0).then(|| self / rhs)
    }

    /// Whether the Manhattan distance to `other` is at most `delta`.
    #[inline]
    pub fn almost_equal(self, other: Self, delta: f64) -> bool {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.max(-dx) + dy.max(-dy) <= delta
    }

    /// Whether both components are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Vector2 {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<Vec2> for Vector2 {
    #[inline]
    fn from(v: Vec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Point> for Vector2 {
    #[inline]
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Vector2> for Vec2 {
    #[inline]
    fn from(v: Vector2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Vector2> for Point {
    #[inline]
    fn from(v: Vector2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl Add for Vector2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Add<f64> for Vector2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: f64) -> Self {
        Self::new(self.x + rhs, self.y + rhs)
    }
}

impl Sub for Vector2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Sub<f64> for Vector2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: f64) -> Self {
        Self::new(self.x - rhs, self.y - rhs)
    }
}

impl Mul for Vector2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div for Vector2 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self::new(self.x / rhs.x, self.y / rhs.y)
    }
}

impl Div<f64> for Vector2 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl AddAssign for Vector2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vector2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<f64> for Vector2 {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}
