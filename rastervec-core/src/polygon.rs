//! Stages 1 and 2 of per-path analysis: the longest straight subpath table
//! and the optimal polygon.
//!
//! Stage 1 computes, for every point i, the furthest point lon[i] such that
//! the arc i..lon[i] is "straight": at most three of the four axis
//! directions occur on it, and every intermediate point stays within a half
//! pixel of the chord. The straightness bookkeeping is done with a pair of
//! integer constraint vectors updated by rounding offsets; when a candidate
//! violates a constraint the furthest admissible point on the current
//! corner-to-corner run is recovered by floor division.
//!
//! Stage 2 picks the polygon with the fewest vertices whose edges are all
//! straight subpaths, breaking ties by the least total penalty. The penalty
//! of an edge is the root of (mean squared distance of the covered points
//! from the chord) × (edge length), evaluated in O(1) from the sum cache.

use crate::geom::{cyclic, floordiv, modn, xprod, IntPoint};
use crate::path::Sum;

const INFTY: i64 = 10_000_000;

/// Direction bin of a unit step, one of four axis directions.
fn dir_bin(to: IntPoint, from: IntPoint) -> usize {
    let v = 3 + 3 * (to.x - from.x) + (to.y - from.y);
    (v / 2) as usize
}

/// Direction bin of an arbitrary corner-to-corner displacement, binned by
/// component signs. Truncating division maps the nine sign combinations
/// onto the four bins.
fn dir_bin_signum(to: IntPoint, from: IntPoint) -> usize {
    let v = 3 + 3 * (to.x - from.x).signum() + (to.y - from.y).signum();
    (v / 2) as usize
}

/// Longest straight subpath table.
pub(crate) fn calc_lon(pt: &[IntPoint]) -> Vec<usize> {
    let n = pt.len();
    let mut nc = vec![0usize; n];
    let mut pivk = vec![0usize; n];

    // next-corner table: point from each point to the furthest future point
    // connected to it by a single horizontal or vertical run. The contour
    // construction guarantees a direction change at index 0, so k = 0 is a
    // valid seed.
    let mut k = 0usize;
    for i in (0..n).rev() {
        if pt[i].x != pt[k].x && pt[i].y != pt[k].y {
            k = i + 1;
        }
        nc[i] = k;
    }

    // pivot table: for each i, the furthest k such that all intermediate
    // points lie on a line from i to k
    for i in (0..n).rev() {
        let mut ct = [0i32; 4];
        ct[dir_bin(pt[modn(i as i64 + 1, n)], pt[i])] += 1;

        let mut constraint = [IntPoint::new(0, 0); 2];
        let mut k = nc[i];
        let mut k1 = i;
        let mut found = false;

        loop {
            ct[dir_bin_signum(pt[k], pt[k1])] += 1;

            // with all four directions present the path can no longer be
            // straight, whatever the constraints say
            if ct.iter().all(|&c| c > 0) {
                pivk[i] = k1;
                found = true;
                break;
            }

            let cur = IntPoint::new(pt[k].x - pt[i].x, pt[k].y - pt[i].y);
            if xprod(constraint[0], cur) < 0 || xprod(constraint[1], cur) > 0 {
                break;
            }

            if cur.x.abs() <= 1 && cur.y.abs() <= 1 {
                // too close to constrain anything
            } else {
                let off = IntPoint::new(
                    cur.x + if cur.y >= 0 && (cur.y > 0 || cur.x < 0) { 1 } else { -1 },
                    cur.y + if cur.x <= 0 && (cur.x < 0 || cur.y < 0) { 1 } else { -1 },
                );
                if xprod(constraint[0], off) >= 0 {
                    constraint[0] = off;
                }
                let off = IntPoint::new(
                    cur.x + if cur.y <= 0 && (cur.y < 0 || cur.x < 0) { 1 } else { -1 },
                    cur.y + if cur.x >= 0 && (cur.x > 0 || cur.y < 0) { 1 } else { -1 },
                );
                if xprod(constraint[1], off) <= 0 {
                    constraint[1] = off;
                }
            }

            k1 = k;
            k = nc[k1];
            if !cyclic(k, i, k1) {
                break;
            }
        }

        if !found {
            // k1 is the last corner satisfying the constraints and k the
            // first violating them; find the last admissible point on the
            // run k1 -> k. With a = c0×cur, b = c0×dk, c = c1×cur, d = c1×dk
            // the largest integer j with a+j*b >= 0 and c+j*d <= 0 is exact
            // in integer arithmetic.
            let dk = IntPoint::new(
                (pt[k].x - pt[k1].x).signum(),
                (pt[k].y - pt[k1].y).signum(),
            );
            let cur = IntPoint::new(pt[k1].x - pt[i].x, pt[k1].y - pt[i].y);
            let a = xprod(constraint[0], cur);
            let b = xprod(constraint[0], dk);
            let c = xprod(constraint[1], cur);
            let d = xprod(constraint[1], dk);

            let mut j = INFTY;
            if b < 0 {
                j = floordiv(a, -b);
            }
            if d > 0 {
                j = j.min(floordiv(-c, d));
            }
            pivk[i] = modn(k1 as i64 + j, n);
        }
    }

    // back-propagate pivots into lon
    let mut lon = vec![0usize; n];
    let mut j = pivk[n - 1];
    lon[n - 1] = j;
    for i in (0..n - 1).rev() {
        if cyclic(i + 1, pivk[i], j) {
            j = pivk[i];
        }
        lon[i] = j;
    }

    // final cyclic refinement across the wrap point
    let mut i = n - 1;
    while cyclic(modn(i as i64 + 1, n), j, lon[i]) {
        lon[i] = j;
        if i == 0 {
            break;
        }
        i -= 1;
    }

    lon
}

/// Penalty of the polygon edge from point i to point j. `j` may be `n`,
/// denoting point 0 reached with one full wrap.
pub(crate) fn penalty3(pt: &[IntPoint], sums: &[Sum], i: usize, j: usize) -> f64 {
    let n = pt.len();
    let (j, wrapped) = if j >= n { (j - n, true) } else { (j, false) };

    let (x, y, x2, xy, y2, k) = if !wrapped {
        (
            (sums[j + 1].x - sums[i].x) as f64,
            (sums[j + 1].y - sums[i].y) as f64,
            sums[j + 1].x2 - sums[i].x2,
            sums[j + 1].xy - sums[i].xy,
            sums[j + 1].y2 - sums[i].y2,
            (j + 1 - i) as f64,
        )
    } else {
        (
            (sums[j + 1].x - sums[i].x + sums[n].x) as f64,
            (sums[j + 1].y - sums[i].y + sums[n].y) as f64,
            sums[j + 1].x2 - sums[i].x2 + sums[n].x2,
            sums[j + 1].xy - sums[i].xy + sums[n].xy,
            sums[j + 1].y2 - sums[i].y2 + sums[n].y2,
            (j as i64 + 1 - i as i64 + n as i64) as f64,
        )
    };

    let px = (pt[i].x + pt[j].x) as f64 / 2.0 - pt[0].x as f64;
    let py = (pt[i].y + pt[j].y) as f64 / 2.0 - pt[0].y as f64;
    let ey = (pt[j].x - pt[i].x) as f64;
    let ex = -((pt[j].y - pt[i].y) as f64);

    let a = (x2 - 2.0 * x * px) / k + px * px;
    let b = (xy - x * py - y * px) / k + px * py;
    let c = (y2 - 2.0 * y * py) / k + py * py;

    (ex * ex * a + 2.0 * ex * ey * b + ey * ey * c).sqrt()
}

/// Optimal polygon: indices into `pt`, fewest vertices first, least total
/// penalty among polygons of that size.
pub(crate) fn best_polygon(pt: &[IntPoint], sums: &[Sum], lon: &[usize]) -> Vec<usize> {
    let n = pt.len();
    let mut pen = vec![0f64; n + 1];
    let mut prev = vec![0usize; n + 1];
    let mut clip0 = vec![0usize; n];
    let mut clip1 = vec![0usize; n + 1];
    let mut seg0 = vec![0usize; n + 1];
    let mut seg1 = vec![0usize; n + 1];

    // clip0[i]: furthest non-cyclic index reachable from i in one segment
    for i in 0..n {
        let mut c = modn(lon[modn(i as i64 - 1, n)] as i64 - 1, n);
        if c == i {
            c = modn(i as i64 + 1, n);
        }
        clip0[i] = if c < i { n } else { c };
    }

    // clip1[j]: smallest i with j <= clip0[i]
    let mut j = 1usize;
    for i in 0..n {
        while j <= clip0[i] {
            clip1[j] = i;
            j += 1;
        }
    }

    // seg0[j]: longest path from 0 with j segments
    let mut i = 0usize;
    let mut m = 0usize;
    while i < n {
        seg0[m] = i;
        i = clip0[i];
        m += 1;
    }
    seg0[m] = n;

    // seg1[j]: longest path to n with m - j segments
    let mut i = n;
    for j in (1..=m).rev() {
        seg1[j] = i;
        i = clip1[i];
    }
    seg1[0] = 0;

    // shortest-path DP over segment counts; the two outer loops jointly
    // cover at most n nodes, so worst case is quadratic but the inner loop
    // is short in practice
    pen[0] = 0.0;
    for j in 1..=m {
        for i in seg1[j]..=seg0[j] {
            let mut best = -1.0f64;
            for k in (clip1[i]..=seg0[j - 1]).rev() {
                let thispen = penalty3(pt, sums, k, i) + pen[k];
                if best < 0.0 || thispen < best {
                    prev[i] = k;
                    best = thispen;
                }
            }
            pen[i] = best;
        }
    }

    // read off the shortest path backwards
    let mut po = vec![0usize; m];
    let mut i = n;
    for j in (0..m).rev() {
        i = prev[i];
        po[j] = i;
    }
    po
}
