// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Rect};

/// Whether the rectangle contains the point, all four edges inclusive.
///
/// Broad-phase culling must never drop a candidate sitting exactly on the
/// query box edge (boundary-ray endpoints do), so this deliberately differs
/// from half-open containment conventions.
#[inline]
pub(crate) fn rect_contains(rect: &Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Whether two rectangles overlap, shared edges included.
#[inline]
pub(crate) fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_edge_inclusive() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_contains(&rect, Point::new(0.0, 0.0)));
        assert!(rect_contains(&rect, Point::new(10.0, 10.0)));
        assert!(rect_contains(&rect, Point::new(5.0, 10.0)));
        assert!(!rect_contains(&rect, Point::new(10.1, 5.0)));
        assert!(!rect_contains(&rect, Point::new(5.0, -0.1)));
    }

    #[test]
    fn overlap_is_edge_inclusive() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_overlap(&a, &Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(rects_overlap(&a, &Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!rects_overlap(&a, &Rect::new(10.5, 0.0, 20.0, 10.0)));
    }
}
