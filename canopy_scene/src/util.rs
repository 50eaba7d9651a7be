// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use canopy_index::Aabb;
use kurbo::{Affine, Point, Rect};

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box in world space.
pub(crate) fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let min_x = (a * rect.x0).min(a * rect.x1) + (c * rect.y0).min(c * rect.y1);
    let max_x = (a * rect.x0).max(a * rect.x1) + (c * rect.y0).max(c * rect.y1);
    let min_y = (b * rect.x0).min(b * rect.x1) + (d * rect.y0).min(d * rect.y1);
    let max_y = (b * rect.x0).max(b * rect.x1) + (d * rect.y0).max(d * rect.y1);
    Rect::new(min_x + e, min_y + f, max_x + e, max_y + f)
}

pub(crate) fn rect_to_aabb(r: Rect) -> Aabb {
    Aabb::from_min_max(r.x0, r.y0, r.x1, r.y1)
}

/// Closed-interval point-in-rect test. Kurbo's `Rect::contains` excludes the far edges.
pub(crate) fn rect_contains_closed(rect: Rect, p: Point) -> bool {
    rect.x0 <= p.x && p.x <= rect.x1 && rect.y0 <= p.y && p.y <= rect.y1
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use core::f64::consts::FRAC_PI_2;

    #[test]
    fn quarter_turn_bbox() {
        let bbox = transform_rect_bbox(Affine::rotate(FRAC_PI_2), Rect::new(0.0, 0.0, 2.0, 1.0));
        assert_abs_diff_eq!(bbox.x0, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bbox.y0, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bbox.x1, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bbox.y1, 2.0, epsilon = 1e-12);
        let aabb = rect_to_aabb(Rect::new(0.0, 0.0, 2.0, 4.0));
        assert_eq!(aabb, Aabb::new(1.0, 2.0, 1.0, 2.0));
    }

    #[test]
    fn closed_containment() {
        let r = Rect::new(0.0, 0.0, 1.0, 1.0);
        assert!(rect_contains_closed(r, Point::new(1.0, 1.0)));
        assert!(!r.contains(Point::new(1.0, 1.0)));
        assert!(!rect_contains_closed(r, Point::new(1.0, 1.01)));
    }
}
