//! Stage 4 of per-path analysis: smoothing and corner detection.
//!
//! Each adjusted polygon vertex becomes one curve segment. The vertex's α
//! measures how far the contour bulges between its neighbours; sharp
//! vertices (α past the configured threshold) become pointed corners, the
//! rest become cubic Béziers whose control points slide along the polygon
//! edges by α.

use crate::curve::{Curve, Segment};
use crate::geom::{ddenom, dpara, interval, DPoint};

/// Build the smoothed curve over the adjusted vertices.
pub(crate) fn smooth(vertex: &[DPoint], alphamax: f64) -> Curve {
    let m = vertex.len();
    let mut segments = vec![
        Segment::Corner {
            c1: DPoint::default(),
            end: DPoint::default(),
        };
        m
    ];
    let mut alpha_arr = vec![0.0f64; m];
    let mut alpha0_arr = vec![0.0f64; m];
    let mut beta_arr = vec![0.0f64; m];

    for i in 0..m {
        let j = (i + 1) % m;
        let k = (i + 2) % m;
        let p4 = interval(0.5, vertex[k], vertex[j]);

        let denom = ddenom(vertex[i], vertex[k]);
        let mut alpha = if denom != 0.0 {
            let dd = (dpara(vertex[i], vertex[j], vertex[k]) / denom).abs();
            let a = if dd > 1.0 { 1.0 - 1.0 / dd } else { 0.0 };
            a / 0.75
        } else {
            4.0 / 3.0
        };
        alpha0_arr[j] = alpha; // "original" value before cropping

        if alpha >= alphamax {
            segments[j] = Segment::Corner {
                c1: vertex[j],
                end: p4,
            };
        } else {
            alpha = alpha.clamp(0.55, 1.0);
            let p2 = interval(0.5 + 0.5 * alpha, vertex[i], vertex[j]);
            let p3 = interval(0.5 + 0.5 * alpha, vertex[k], vertex[j]);
            segments[j] = Segment::Bezier {
                c0: p2,
                c1: p3,
                end: p4,
            };
        }
        alpha_arr[j] = alpha;
        beta_arr[j] = 0.5;
    }

    Curve {
        segments,
        vertex: vertex.to_vec(),
        alpha: alpha_arr,
        alpha0: alpha0_arr,
        beta: beta_arr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_vertices() -> Vec<DPoint> {
        vec![
            DPoint::new(8.0, 24.0),
            DPoint::new(8.0, 8.0),
            DPoint::new(24.0, 8.0),
            DPoint::new(24.0, 24.0),
        ]
    }

    #[test]
    fn test_right_angles_become_corners() {
        let curve = smooth(&square_vertices(), 1.0);
        assert_eq!(curve.len(), 4);
        for (k, seg) in curve.segments().iter().enumerate() {
            assert!(seg.is_corner(), "segment {k} should be a corner");
        }
        // corner c1 is the vertex itself, end the midpoint to the next one
        let Segment::Corner { c1, end } = curve.segments()[1] else {
            unreachable!()
        };
        assert_eq!(c1, DPoint::new(8.0, 8.0));
        assert_eq!(end, DPoint::new(16.0, 8.0));
    }

    #[test]
    fn test_high_alphamax_suppresses_corners() {
        let curve = smooth(&square_vertices(), 1.334);
        for seg in curve.segments() {
            assert!(!seg.is_corner());
        }
        // cropped alpha lands in [0.55, 1]
        for k in 0..curve.len() {
            assert!((0.55..=1.0).contains(&curve.alpha(k)));
            assert_eq!(curve.beta(k), 0.5);
        }
    }

    #[test]
    fn test_zero_alphamax_yields_polygon() {
        // alphamax = 0 classifies every vertex as a corner
        let verts = vec![
            DPoint::new(0.0, 0.0),
            DPoint::new(10.0, 1.0),
            DPoint::new(20.0, 0.0),
            DPoint::new(10.0, -8.0),
        ];
        let curve = smooth(&verts, 0.0);
        assert!(curve.segments().iter().all(|s| s.is_corner()));
    }

    #[test]
    fn test_shallow_vertex_becomes_bezier() {
        // a nearly straight vertex has small alpha and smooths out
        let verts = vec![
            DPoint::new(0.0, 0.0),
            DPoint::new(10.0, 1.0),
            DPoint::new(20.0, 0.0),
            DPoint::new(10.0, -8.0),
        ];
        let curve = smooth(&verts, 1.0);
        // vertex 1 (the shallow bump) smooths; the sharp bottom vertex
        // stays pointed
        assert!(!curve.segments()[1].is_corner());
        assert!(curve.segments()[3].is_corner());
        // every segment ends at the midpoint between its vertex and the next
        let m = curve.len();
        for j in 0..m {
            let mid = interval(0.5, verts[j], verts[(j + 1) % m]);
            assert_eq!(curve.segments()[j].end(), mid);
        }
    }

    #[test]
    fn test_alpha0_records_uncropped_value() {
        let curve = smooth(&square_vertices(), 1.334);
        for k in 0..curve.len() {
            // right angles have raw alpha 7/6 which crops to 1
            assert!((curve.alpha0(k) - 7.0 / 6.0).abs() < 1e-9);
            assert_eq!(curve.alpha(k), 1.0);
        }
    }
}
