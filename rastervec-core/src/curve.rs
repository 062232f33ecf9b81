//! Curve segments and tessellation.
//!
//! A traced outline is a closed loop of segments. Each segment stores only
//! its control points and end point; its start point is the end of the
//! preceding segment, so continuity between consecutive segments is exact
//! by construction.

use serde::{Deserialize, Serialize};

use crate::geom::{interval, DPoint};

/// One segment of a closed curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// Pointed corner: two straight joints, start → c1 → end.
    Corner { c1: DPoint, end: DPoint },
    /// Cubic Bézier with control points c0 and c1.
    Bezier { c0: DPoint, c1: DPoint, end: DPoint },
}

impl Segment {
    pub fn end(&self) -> DPoint {
        match *self {
            Segment::Corner { end, .. } => end,
            Segment::Bezier { end, .. } => end,
        }
    }

    pub fn is_corner(&self) -> bool {
        matches!(self, Segment::Corner { .. })
    }

    /// Sample this segment given its start point.
    ///
    /// A corner contributes its two joint points (c1, end). A Bézier
    /// contributes `res + 1` samples for t = 0..1 via degree-3 forward
    /// differences; the first sample is the start point exactly.
    pub fn tessellate(&self, start: DPoint, res: u32) -> Vec<DPoint> {
        match *self {
            Segment::Corner { c1, end } => vec![c1, end],
            Segment::Bezier { c0, c1, end } => {
                let r = res.max(1) as usize;
                let h = 1.0 / r as f64;

                // power-basis coefficients: p(t) = ((a t + b) t + c) t + p0
                let ax = -start.x + 3.0 * c0.x - 3.0 * c1.x + end.x;
                let bx = 3.0 * start.x - 6.0 * c0.x + 3.0 * c1.x;
                let cx = 3.0 * (c0.x - start.x);
                let ay = -start.y + 3.0 * c0.y - 3.0 * c1.y + end.y;
                let by = 3.0 * start.y - 6.0 * c0.y + 3.0 * c1.y;
                let cy = 3.0 * (c0.y - start.y);

                let h2 = h * h;
                let h3 = h2 * h;
                let mut d1x = ax * h3 + bx * h2 + cx * h;
                let mut d2x = 6.0 * ax * h3 + 2.0 * bx * h2;
                let d3x = 6.0 * ax * h3;
                let mut d1y = ay * h3 + by * h2 + cy * h;
                let mut d2y = 6.0 * ay * h3 + 2.0 * by * h2;
                let d3y = 6.0 * ay * h3;

                let mut out = Vec::with_capacity(r + 1);
                let mut p = start;
                out.push(p);
                for _ in 0..r {
                    p.x += d1x;
                    d1x += d2x;
                    d2x += d3x;
                    p.y += d1y;
                    d1y += d2y;
                    d2y += d3y;
                    out.push(p);
                }
                out
            }
        }
    }
}

/// Closed curve: segments plus the per-vertex shape parameters the curve
/// optimizer consumes (raw and cropped α, split ratio β, polygon vertices).
#[derive(Clone, Debug, Default)]
pub struct Curve {
    pub(crate) segments: Vec<Segment>,
    pub(crate) vertex: Vec<DPoint>,
    pub(crate) alpha: Vec<f64>,
    pub(crate) alpha0: Vec<f64>,
    pub(crate) beta: Vec<f64>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Start point of the whole loop: the end of the last segment.
    pub fn start(&self) -> Option<DPoint> {
        self.segments.last().map(|s| s.end())
    }

    /// Start point of segment k, i.e. the end of its cyclic predecessor.
    pub fn start_of(&self, k: usize) -> DPoint {
        let m = self.segments.len();
        self.segments[(k + m - 1) % m].end()
    }

    /// Cropped α of the vertex belonging to segment k.
    pub fn alpha(&self, k: usize) -> f64 {
        self.alpha[k]
    }

    /// Raw α of the vertex belonging to segment k, before cropping.
    pub fn alpha0(&self, k: usize) -> f64 {
        self.alpha0[k]
    }

    /// Split ratio β of the vertex belonging to segment k.
    pub fn beta(&self, k: usize) -> f64 {
        self.beta[k]
    }

    /// Flatten the loop into a polyline. Each corner contributes its two
    /// joints; each Bézier contributes `res` fresh samples (its t=0 sample
    /// coincides with the running point and is dropped).
    pub fn tessellate(&self, res: u32) -> Vec<DPoint> {
        let mut out = Vec::new();
        let Some(mut cur) = self.start() else {
            return out;
        };
        for seg in &self.segments {
            let samples = seg.tessellate(cur, res);
            match seg {
                Segment::Corner { .. } => out.extend(samples),
                Segment::Bezier { .. } => out.extend(&samples[1..]),
            }
            cur = seg.end();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bezier() -> (DPoint, Segment) {
        (
            DPoint::new(1.0, 2.0),
            Segment::Bezier {
                c0: DPoint::new(2.0, 4.0),
                c1: DPoint::new(4.0, 4.5),
                end: DPoint::new(5.0, 2.0),
            },
        )
    }

    fn bezier_reference(t: f64, p0: DPoint, c0: DPoint, c1: DPoint, p3: DPoint) -> DPoint {
        let s = 1.0 - t;
        DPoint::new(
            s * s * s * p0.x + 3.0 * s * s * t * c0.x + 3.0 * s * t * t * c1.x + t * t * t * p3.x,
            s * s * s * p0.y + 3.0 * s * s * t * c0.y + 3.0 * s * t * t * c1.y + t * t * t * p3.y,
        )
    }

    #[test]
    fn test_bezier_tessellation_endpoints() {
        let (start, seg) = unit_bezier();
        for res in [1u32, 4, 10, 100] {
            let samples = seg.tessellate(start, res);
            assert_eq!(samples.len(), res as usize + 1);
            // exact start, end within res * epsilon-ish accumulation
            assert_eq!(samples[0], start);
            let end = seg.end();
            let tol = 1e-9 * res as f64;
            assert!(samples[res as usize].distance_to(&end) < tol);
        }
    }

    #[test]
    fn test_forward_differences_match_direct_evaluation() {
        let (start, seg) = unit_bezier();
        let Segment::Bezier { c0, c1, end } = seg else {
            unreachable!()
        };
        let res = 10;
        let samples = seg.tessellate(start, res);
        for (k, sample) in samples.iter().enumerate() {
            let t = k as f64 / res as f64;
            let reference = bezier_reference(t, start, c0, c1, end);
            assert!(
                sample.distance_to(&reference) < 1e-9,
                "sample {k} diverged: {sample:?} vs {reference:?}"
            );
        }
    }

    #[test]
    fn test_corner_tessellation() {
        let seg = Segment::Corner {
            c1: DPoint::new(3.0, 3.0),
            end: DPoint::new(3.0, 0.0),
        };
        let samples = seg.tessellate(DPoint::new(0.0, 3.0), 10);
        assert_eq!(samples, vec![DPoint::new(3.0, 3.0), DPoint::new(3.0, 0.0)]);
    }

    #[test]
    fn test_curve_polyline_has_no_duplicate_joints() {
        let m = 4usize;
        // a small diamond of four beziers
        let verts = [
            DPoint::new(1.0, 0.0),
            DPoint::new(2.0, 1.0),
            DPoint::new(1.0, 2.0),
            DPoint::new(0.0, 1.0),
        ];
        let mut segments = Vec::new();
        for i in 0..m {
            let a = verts[i];
            let b = verts[(i + 1) % m];
            segments.push(Segment::Bezier {
                c0: interval(1.0 / 3.0, a, b),
                c1: interval(2.0 / 3.0, a, b),
                end: b,
            });
        }
        let curve = Curve {
            segments,
            vertex: verts.to_vec(),
            alpha: vec![1.0; m],
            alpha0: vec![1.0; m],
            beta: vec![0.5; m],
        };
        let poly = curve.tessellate(5);
        assert_eq!(poly.len(), 4 * 5);
        for pair in poly.windows(2) {
            assert!(pair[0].distance_to(&pair[1]) > 1e-6);
        }
    }
}
