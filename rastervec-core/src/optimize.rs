//! Stage 5 of per-path analysis: curve optimization.
//!
//! Replaces maximal chains of consecutive Bézier segments that share a
//! convexity and bend by less than 179° with a single Bézier, when one fits
//! within the configured tolerance. Candidates are scored by a shortest-path
//! DP over segment count, penalty-tie-broken, mirroring the optimal-polygon
//! stage.

use crate::curve::{Curve, Segment};
use crate::geom::{cprod, ddist, dpara, interval, iprod, iprod1, sgn, DPoint};

/// cos(179°), the maximum admissible total bend of a merged chain.
const COS179: f64 = -0.999_847_695_156_391;

/// A fitted replacement candidate for segments i+1 ..= j.
#[derive(Clone, Copy, Debug, Default)]
struct Opti {
    pen: f64,
    c: [DPoint; 2],
    t: f64,
    s: f64,
    alpha: f64,
}

fn bezier_point(t: f64, p0: DPoint, p1: DPoint, p2: DPoint, p3: DPoint) -> DPoint {
    let s = 1.0 - t;
    DPoint::new(
        s * s * s * p0.x + 3.0 * (s * s * t) * p1.x + 3.0 * (t * t * s) * p2.x + t * t * t * p3.x,
        s * s * s * p0.y + 3.0 * (s * s * t) * p1.y + 3.0 * (t * t * s) * p2.y + t * t * t * p3.y,
    )
}

/// Parameter t in [0,1] where the Bézier (p0..p3) is tangent to the
/// direction q1−q0, if any. The tangency condition is a quadratic in t with
/// cross-product coefficients.
fn tangent(p0: DPoint, p1: DPoint, p2: DPoint, p3: DPoint, q0: DPoint, q1: DPoint) -> Option<f64> {
    // (1-t)^2 A + 2(1-t)t B + t^2 C = 0, rewritten as a t^2 + b t + c = 0
    let big_a = cprod(p0, p1, q0, q1);
    let big_b = cprod(p1, p2, q0, q1);
    let big_c = cprod(p2, p3, q0, q1);

    let a = big_a - 2.0 * big_b + big_c;
    let b = -2.0 * big_a + 2.0 * big_b;
    let c = big_a;

    let d = b * b - 4.0 * a * c;
    if a == 0.0 || d < 0.0 {
        return None;
    }
    let s = d.sqrt();
    let r1 = (-b + s) / (2.0 * a);
    let r2 = (-b - s) / (2.0 * a);
    if (0.0..=1.0).contains(&r1) {
        Some(r1)
    } else if (0.0..=1.0).contains(&r2) {
        Some(r2)
    } else {
        None
    }
}

/// Try to fit one Bézier over the chain from joint i+½ to joint j+½.
/// Returns the candidate and its squared-deviation penalty, or None when the
/// chain is unmergeable (mixed convexity, too much bend, or any skipped edge
/// or corner strays past the tolerance).
fn opti_penalty(
    curve: &Curve,
    i: usize,
    j: usize,
    opttolerance: f64,
    convc: &[i32],
    areac: &[f64],
) -> Option<Opti> {
    let m = curve.len();

    // a full loop can never be a single curve
    if i == j {
        return None;
    }

    let vertex = &curve.vertex;
    let seg_end = |k: usize| curve.segments[k].end();

    let i1 = (i + 1) % m;
    let mut k1 = i1;
    let conv = convc[k1];
    if conv == 0 {
        return None;
    }
    let d = ddist(vertex[i], vertex[i1]);

    // convexity, corner-freeness, and bend of everything in between
    let mut k = k1;
    while k != j {
        k1 = (k + 1) % m;
        let k2 = (k + 2) % m;
        if convc[k1] != conv {
            return None;
        }
        if sgn(cprod(vertex[i], vertex[i1], vertex[k1], vertex[k2])) != conv {
            return None;
        }
        if iprod1(vertex[i], vertex[i1], vertex[k1], vertex[k2])
            < d * ddist(vertex[k1], vertex[k2]) * COS179
        {
            return None;
        }
        k = k1;
    }

    // the chain we are replacing runs from the end joint of segment i to
    // the end joint of segment j, guided by the two outermost edges
    let p0 = seg_end(i);
    let mut p1 = vertex[i1];
    let mut p2 = vertex[j];
    let p3 = seg_end(j);

    // area enclosed between the chain and its chord, from the prefix cache
    let mut area = areac[j] - areac[i];
    area -= dpara(vertex[0], seg_end(i), seg_end(j)) / 2.0;
    if i >= j {
        area += areac[m];
    }

    // intersection o of the edges (v_i, v_i1) and (v_j, v_j1); t and s
    // locate o on each edge, A is the area of the triangle (p0, o, p3)
    let a1 = dpara(p0, p1, p2);
    let a2 = dpara(p0, p1, p3);
    let a3 = dpara(p0, p2, p3);
    let a4 = a1 + a3 - a2;
    if a2 == a1 {
        // the lines are parallel
        return None;
    }
    let t = a3 / (a3 - a4);
    let s = a2 / (a2 - a1);
    let big_a = a2 * t / 2.0;
    if big_a == 0.0 {
        // the lines are degenerate
        return None;
    }

    let r = area / big_a; // relative area
    let alpha = 2.0 - (4.0 - r / 0.3).sqrt();

    let res_c = [interval(t * alpha, p0, p1), interval(s * alpha, p3, p2)];
    p1 = res_c[0];
    p2 = res_c[1];
    let mut pen = 0.0;

    // deviation of the candidate from every skipped edge
    let mut k = i1;
    while k != j {
        let k1 = (k + 1) % m;
        let tt = tangent(p0, p1, p2, p3, vertex[k], vertex[k1])?;
        let pt = bezier_point(tt, p0, p1, p2, p3);
        let d = ddist(vertex[k], vertex[k1]);
        if d == 0.0 {
            return None;
        }
        let d1 = dpara(vertex[k], vertex[k1], pt) / d;
        if d1.abs() > opttolerance {
            return None;
        }
        if iprod(vertex[k], vertex[k1], pt) < 0.0 || iprod(vertex[k1], vertex[k], pt) < 0.0 {
            return None;
        }
        pen += d1 * d1;
        k = k1;
    }

    // deviation from every skipped corner joint
    let mut k = i;
    while k != j {
        let k1 = (k + 1) % m;
        let tt = tangent(p0, p1, p2, p3, seg_end(k), seg_end(k1))?;
        let pt = bezier_point(tt, p0, p1, p2, p3);
        let d = ddist(seg_end(k), seg_end(k1));
        if d == 0.0 {
            return None;
        }
        let mut d1 = dpara(seg_end(k), seg_end(k1), pt) / d;
        let mut d2 = dpara(seg_end(k), seg_end(k1), vertex[k1]) / d;
        d2 *= 0.75 * curve.alpha[k1];
        if d2 < 0.0 {
            d1 = -d1;
            d2 = -d2;
        }
        if d1 < d2 - opttolerance {
            return None;
        }
        if d1 < d2 {
            pen += (d1 - d2) * (d1 - d2);
        }
        k = k1;
    }

    Some(Opti {
        pen,
        c: res_c,
        t,
        s,
        alpha,
    })
}

/// Optimized variant of a smoothed curve.
pub(crate) fn optimize_curve(curve: &Curve, opttolerance: f64) -> Curve {
    let m = curve.len();

    // convexity per segment: the turn direction at Bézier vertices, 0 at
    // corners (corners never merge)
    let mut convc = vec![0i32; m];
    for i in 0..m {
        convc[i] = match curve.segments[i] {
            Segment::Bezier { .. } => sgn(dpara(
                curve.vertex[(i + m - 1) % m],
                curve.vertex[i],
                curve.vertex[(i + 1) % m],
            )),
            Segment::Corner { .. } => 0,
        };
    }

    // prefix areas under the curve, for O(1) chain areas in opti_penalty
    let mut areac = vec![0.0f64; m + 1];
    let mut area = 0.0;
    let p0 = curve.vertex[0];
    for i in 0..m {
        let i1 = (i + 1) % m;
        if let Segment::Bezier { .. } = curve.segments[i1] {
            let alpha = curve.alpha[i1];
            area += 0.3
                * alpha
                * (4.0 - alpha)
                * dpara(
                    curve.segments[i].end(),
                    curve.vertex[i1],
                    curve.segments[i1].end(),
                )
                / 2.0;
            area += dpara(p0, curve.segments[i].end(), curve.segments[i1].end()) / 2.0;
        }
        areac[i + 1] = area;
    }

    // shortest path over joints 0..m, fewest segments first, then penalty
    let mut pt_arr = vec![0usize; m + 1];
    let mut pen = vec![0.0f64; m + 1];
    let mut len_arr = vec![0usize; m + 1];
    let mut opt: Vec<Option<Opti>> = vec![None; m + 1];

    for j in 1..=m {
        pt_arr[j] = j - 1;
        pen[j] = pen[j - 1];
        len_arr[j] = len_arr[j - 1] + 1;
        opt[j] = None;
        for i in (0..j.saturating_sub(1)).rev() {
            let Some(o) = opti_penalty(curve, i, j % m, opttolerance, &convc, &areac) else {
                break;
            };
            if len_arr[j] > len_arr[i] + 1
                || (len_arr[j] == len_arr[i] + 1 && pen[j] > pen[i] + o.pen)
            {
                pt_arr[j] = i;
                pen[j] = pen[i] + o.pen;
                len_arr[j] = len_arr[i] + 1;
                opt[j] = Some(o);
            }
        }
    }

    let om = len_arr[m];
    let mut segments = Vec::with_capacity(om);
    let mut vertex = vec![DPoint::default(); om];
    let mut alpha = vec![0.0f64; om];
    let mut alpha0 = vec![0.0f64; om];
    let mut s_arr = vec![0.0f64; om];
    let mut t_arr = vec![0.0f64; om];
    segments.resize(
        om,
        Segment::Corner {
            c1: DPoint::default(),
            end: DPoint::default(),
        },
    );

    let mut j = m;
    for i in (0..om).rev() {
        let jm = j % m;
        match opt[j].filter(|_| pt_arr[j] != j - 1) {
            None => {
                segments[i] = curve.segments[jm];
                vertex[i] = curve.vertex[jm];
                alpha[i] = curve.alpha[jm];
                alpha0[i] = curve.alpha0[jm];
                s_arr[i] = 1.0;
                t_arr[i] = 1.0;
            }
            Some(o) => {
                segments[i] = Segment::Bezier {
                    c0: o.c[0],
                    c1: o.c[1],
                    end: curve.segments[jm].end(),
                };
                vertex[i] = interval(o.s, curve.segments[jm].end(), curve.vertex[jm]);
                alpha[i] = o.alpha;
                alpha0[i] = o.alpha;
                s_arr[i] = o.s;
                t_arr[i] = o.t;
            }
        }
        j = pt_arr[j];
    }

    // β splits each vertex between its adjacent fitted spans
    let mut beta = vec![0.0f64; om];
    for i in 0..om {
        let i1 = (i + 1) % om;
        beta[i] = s_arr[i] / (s_arr[i] + t_arr[i1]);
    }

    Curve {
        segments,
        vertex,
        alpha,
        alpha0,
        beta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smooth::smooth;

    fn smoothed_square() -> Curve {
        smooth(
            &[
                DPoint::new(8.0, 24.0),
                DPoint::new(8.0, 8.0),
                DPoint::new(24.0, 8.0),
                DPoint::new(24.0, 24.0),
            ],
            1.0,
        )
    }

    fn regular_polygon_curve(sides: usize, radius: f64) -> Curve {
        let verts: Vec<DPoint> = (0..sides)
            .map(|k| {
                let theta = std::f64::consts::TAU * k as f64 / sides as f64;
                DPoint::new(16.0 + radius * theta.cos(), 16.0 + radius * theta.sin())
            })
            .collect();
        smooth(&verts, 1.0)
    }

    #[test]
    fn test_corner_curve_is_left_alone() {
        let curve = smoothed_square();
        let optimized = optimize_curve(&curve, 0.2);
        assert_eq!(optimized.len(), 4);
        for (a, b) in curve.segments().iter().zip(optimized.segments()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_smooth_polygon_merges_segments() {
        // a 16-gon smooths into 16 shallow beziers which merge aggressively
        let curve = regular_polygon_curve(16, 8.0);
        assert!(curve.segments().iter().all(|s| !s.is_corner()));
        let optimized = optimize_curve(&curve, 0.5);
        assert!(
            optimized.len() < curve.len(),
            "expected merges: {} -> {}",
            curve.len(),
            optimized.len()
        );
        // every surviving joint is one of the original joints
        for seg in optimized.segments() {
            let end = seg.end();
            assert!(
                curve
                    .segments()
                    .iter()
                    .any(|orig| orig.end().distance_to(&end) < 1e-9),
                "joint {end:?} is not an original joint"
            );
        }
    }

    #[test]
    fn test_tight_tolerance_merges_less() {
        let curve = regular_polygon_curve(16, 8.0);
        let loose = optimize_curve(&curve, 1.0);
        let tight = optimize_curve(&curve, 0.01);
        assert!(loose.len() <= tight.len());
    }

    #[test]
    fn test_beta_defaults_to_half_on_copied_segments() {
        let curve = smoothed_square();
        let optimized = optimize_curve(&curve, 0.2);
        for k in 0..optimized.len() {
            assert!((optimized.beta(k) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_tangent_finds_parameter_on_arc() {
        // asymmetric arch: somewhere on it the tangent is horizontal
        let p0 = DPoint::new(0.0, 0.0);
        let p1 = DPoint::new(1.0, 2.0);
        let p2 = DPoint::new(3.0, 1.0);
        let p3 = DPoint::new(4.0, 0.0);
        let t = tangent(p0, p1, p2, p3, DPoint::new(0.0, 0.0), DPoint::new(1.0, 0.0)).unwrap();
        assert!((0.0..=1.0).contains(&t));
        // the derivative at t really is horizontal
        let s = 1.0 - t;
        let dy = 3.0 * s * s * (p1.y - p0.y)
            + 6.0 * s * t * (p2.y - p1.y)
            + 3.0 * t * t * (p3.y - p2.y);
        assert!(dy.abs() < 1e-9, "dy = {dy}");
        // x is monotone on this arch, so no vertical tangent exists
        assert!(tangent(p0, p1, p2, p3, DPoint::new(0.0, 0.0), DPoint::new(0.0, 1.0)).is_none());
    }
}
