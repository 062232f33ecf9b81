//! Geometric primitives and the small integer/real vector algebra used
//! throughout the pipeline.
//!
//! Paths live on the integer corner grid; everything downstream of vertex
//! adjustment works in `f64`. Cross products of integer vectors are computed
//! in `i64` so long contours cannot overflow them.

use serde::{Deserialize, Serialize};

/// Integer lattice point at a pixel corner. Pixel (x,y) occupies the unit
/// square [x,x+1]×[y,y+1]; y grows upward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    pub fn new(x: i32, y: i32) -> Self {
        IntPoint { x, y }
    }
}

/// Point in the real plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DPoint {
    pub x: f64,
    pub y: f64,
}

impl DPoint {
    pub fn new(x: f64, y: f64) -> Self {
        DPoint { x, y }
    }

    pub fn distance_to(&self, other: &DPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<IntPoint> for DPoint {
    fn from(p: IntPoint) -> Self {
        DPoint {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
}

/// Axis-aligned bounds in corner coordinates, inclusive on all sides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BBox {
    pub(crate) fn of_points(points: &[IntPoint]) -> Self {
        let Some(first) = points.first() else {
            return BBox::default();
        };
        let mut bbox = BBox {
            x0: first.x,
            y0: first.y,
            x1: first.x,
            y1: first.y,
        };
        for p in &points[1..] {
            bbox.x0 = bbox.x0.min(p.x);
            bbox.y0 = bbox.y0.min(p.y);
            bbox.x1 = bbox.x1.max(p.x);
            bbox.y1 = bbox.y1.max(p.y);
        }
        bbox
    }
}

/// Cross product p1 × p2 of integer vectors.
pub(crate) fn xprod(p1: IntPoint, p2: IntPoint) -> i64 {
    p1.x as i64 * p2.y as i64 - p1.y as i64 * p2.x as i64
}

/// (p1−p0) × (p2−p0): twice the signed area of the triangle p0 p1 p2.
pub(crate) fn dpara(p0: DPoint, p1: DPoint, p2: DPoint) -> f64 {
    let x1 = p1.x - p0.x;
    let y1 = p1.y - p0.y;
    let x2 = p2.x - p0.x;
    let y2 = p2.y - p0.y;
    x1 * y2 - x2 * y1
}

/// (p1−p0) × (p3−p2).
pub(crate) fn cprod(p0: DPoint, p1: DPoint, p2: DPoint, p3: DPoint) -> f64 {
    let x1 = p1.x - p0.x;
    let y1 = p1.y - p0.y;
    let x2 = p3.x - p2.x;
    let y2 = p3.y - p2.y;
    x1 * y2 - x2 * y1
}

/// (p1−p0) · (p2−p0).
pub(crate) fn iprod(p0: DPoint, p1: DPoint, p2: DPoint) -> f64 {
    let x1 = p1.x - p0.x;
    let y1 = p1.y - p0.y;
    let x2 = p2.x - p0.x;
    let y2 = p2.y - p0.y;
    x1 * x2 + y1 * y2
}

/// (p1−p0) · (p3−p2).
pub(crate) fn iprod1(p0: DPoint, p1: DPoint, p2: DPoint, p3: DPoint) -> f64 {
    let x1 = p1.x - p0.x;
    let y1 = p1.y - p0.y;
    let x2 = p3.x - p2.x;
    let y2 = p3.y - p2.y;
    x1 * x2 + y1 * y2
}

pub(crate) fn ddist(p: DPoint, q: DPoint) -> f64 {
    ((p.x - q.x) * (p.x - q.x) + (p.y - q.y) * (p.y - q.y)).sqrt()
}

/// Linear interpolation from a towards b.
pub(crate) fn interval(t: f64, a: DPoint, b: DPoint) -> DPoint {
    DPoint {
        x: a.x + t * (b.x - a.x),
        y: a.y + t * (b.y - a.y),
    }
}

/// The direction 90° counterclockwise from p2−p0, quantized to the nearest
/// major wind direction (N, NW, W, ...).
pub(crate) fn dorth_infty(p0: DPoint, p2: DPoint) -> IntPoint {
    IntPoint {
        x: -sgn(p2.y - p0.y),
        y: sgn(p2.x - p0.x),
    }
}

/// The unit square of radius 1 centered at p1 intersects the line p0–p2 iff
/// |dpara(p0,p1,p2)| <= ddenom(p0,p2).
pub(crate) fn ddenom(p0: DPoint, p2: DPoint) -> f64 {
    let r = dorth_infty(p0, p2);
    r.y as f64 * (p2.x - p0.x) - r.x as f64 * (p2.y - p0.y)
}

pub(crate) fn sgn(x: f64) -> i32 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// True iff a <= b < c cyclically.
pub(crate) fn cyclic(a: usize, b: usize, c: usize) -> bool {
    if a <= c {
        a <= b && b < c
    } else {
        a <= b || b < c
    }
}

/// Euclidean modulus into [0, n).
pub(crate) fn modn(a: i64, n: usize) -> usize {
    a.rem_euclid(n as i64) as usize
}

/// Floor division; the denominator must be positive.
pub(crate) fn floordiv(a: i64, n: i64) -> i64 {
    a.div_euclid(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyclic_ranges() {
        // plain range
        assert!(cyclic(2, 3, 5));
        assert!(cyclic(2, 2, 5));
        assert!(!cyclic(2, 5, 5));
        // wrapped range
        assert!(cyclic(5, 6, 2));
        assert!(cyclic(5, 1, 2));
        assert!(!cyclic(5, 3, 2));
    }

    #[test]
    fn test_modn_and_floordiv() {
        assert_eq!(modn(-1, 4), 3);
        assert_eq!(modn(4, 4), 0);
        assert_eq!(modn(7, 4), 3);
        assert_eq!(floordiv(7, 2), 3);
        assert_eq!(floordiv(-7, 2), -4);
        assert_eq!(floordiv(-1, 3), -1);
    }

    #[test]
    fn test_cross_products() {
        assert_eq!(xprod(IntPoint::new(1, 0), IntPoint::new(0, 1)), 1);
        assert_eq!(xprod(IntPoint::new(0, 1), IntPoint::new(1, 0)), -1);

        let p0 = DPoint::new(0.0, 0.0);
        let p1 = DPoint::new(2.0, 0.0);
        let p2 = DPoint::new(0.0, 3.0);
        assert_eq!(dpara(p0, p1, p2), 6.0);
        assert_eq!(iprod(p0, p1, p2), 0.0);
    }

    #[test]
    fn test_ddenom_diagonal() {
        // For a diagonal chord the quantized orthogonal is a diagonal too.
        let d = ddenom(DPoint::new(0.0, 0.0), DPoint::new(4.0, 4.0));
        assert_eq!(d, 8.0);
    }

    #[test]
    fn test_interval_midpoint() {
        let m = interval(0.5, DPoint::new(0.0, 0.0), DPoint::new(2.0, 4.0));
        assert_eq!(m, DPoint::new(1.0, 2.0));
    }
}
