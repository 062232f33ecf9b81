//! Stage 3 of per-path analysis: vertex adjustment.
//!
//! Each polygon edge gets a best-fit line through the contour points it
//! covers: the centroid plus the principal eigenvector of their covariance,
//! both O(1) queries against the sum cache. The line is then encoded as a
//! singular symmetric 3×3 quadratic form whose value at a homogeneous point
//! is the squared distance to the line. A polygon vertex is relocated to the
//! point of the unit square around it that minimizes the sum of the two
//! adjacent edge forms.

use crate::geom::{modn, DPoint, IntPoint};
use crate::path::Sum;

/// Symmetric 3×3 quadratic form over homogeneous coordinates.
type QuadForm = [[f64; 3]; 3];

fn quadform(q: &QuadForm, w: DPoint) -> f64 {
    let v = [w.x, w.y, 1.0];
    let mut sum = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            sum += v[i] * q[i][j] * v[j];
        }
    }
    sum
}

/// Center and direction of the best-fit line through contour points i..j
/// (inclusive), in coordinates relative to point 0. Indices may exceed n or
/// be negative; each full wrap adds or removes one copy of the total sums.
fn pointslope(pt: &[IntPoint], sums: &[Sum], i: i64, j: i64) -> (DPoint, DPoint) {
    let n = pt.len() as i64;
    let mut i = i;
    let mut j = j;
    let mut r = 0i64;
    while j >= n {
        j -= n;
        r += 1;
    }
    while i >= n {
        i -= n;
        r -= 1;
    }
    while j < 0 {
        j += n;
        r -= 1;
    }
    while i < 0 {
        i += n;
        r += 1;
    }
    let (i, j) = (i as usize, j as usize);
    let nn = n as usize;

    let x = (sums[j + 1].x - sums[i].x + r * sums[nn].x) as f64;
    let y = (sums[j + 1].y - sums[i].y + r * sums[nn].y) as f64;
    let x2 = sums[j + 1].x2 - sums[i].x2 + r as f64 * sums[nn].x2;
    let xy = sums[j + 1].xy - sums[i].xy + r as f64 * sums[nn].xy;
    let y2 = sums[j + 1].y2 - sums[i].y2 + r as f64 * sums[nn].y2;
    let k = (j as i64 + 1 - i as i64 + r * n) as f64;

    let ctr = DPoint::new(x / k, y / k);

    let mut a = (x2 - x * x / k) / k;
    let b = (xy - x * y / k) / k;
    let mut c = (y2 - y * y / k) / k;

    // larger eigenvalue of the covariance matrix
    let lambda2 = (a + c + ((a - c) * (a - c) + 4.0 * b * b).sqrt()) / 2.0;
    a -= lambda2;
    c -= lambda2;

    let mut dir = DPoint::new(0.0, 0.0);
    let l;
    if a.abs() >= c.abs() {
        l = (a * a + b * b).sqrt();
        if l != 0.0 {
            dir = DPoint::new(-b / l, a / l);
        }
    } else {
        l = (c * c + b * b).sqrt();
        if l != 0.0 {
            dir = DPoint::new(-c / l, b / l);
        }
    }
    // l == 0 can happen when the eigenvalues coincide (e.g. k = 4); the
    // zero direction then yields a zero form downstream
    (ctr, dir)
}

/// Adjusted polygon vertices. For sign=false paths the output order is
/// reversed so every downstream curve has consistent winding; this is the
/// only place winding reversal happens.
pub(crate) fn adjust_vertices(
    pt: &[IntPoint],
    sums: &[Sum],
    po: &[usize],
    sign: bool,
) -> Vec<DPoint> {
    let m = po.len();
    let n = pt.len();
    let x0 = pt[0].x;
    let y0 = pt[0].y;

    let mut ctr = vec![DPoint::default(); m];
    let mut dir = vec![DPoint::default(); m];
    let mut q = vec![[[0.0f64; 3]; 3]; m];

    // best-fit line for each polygon edge
    for i in 0..m {
        let j = po[modn(i as i64 + 1, m)];
        let j = modn(j as i64 - po[i] as i64, n) + po[i];
        let (c, d) = pointslope(pt, sums, po[i] as i64, j as i64);
        ctr[i] = c;
        dir[i] = d;
    }

    // encode each line as a singular quadratic form measuring squared
    // distance from it
    for i in 0..m {
        let d = dir[i].x * dir[i].x + dir[i].y * dir[i].y;
        if d == 0.0 {
            continue;
        }
        let v = [
            dir[i].y,
            -dir[i].x,
            dir[i].x * ctr[i].y - dir[i].y * ctr[i].x,
        ];
        for l in 0..3 {
            for k in 0..3 {
                q[i][l][k] = v[l] * v[k] / d;
            }
        }
    }

    // relocate each vertex to the minimum of the sum of its two adjacent
    // forms over the unit square centered on the raw vertex
    let mut vertices = vec![DPoint::default(); m];
    for i in 0..m {
        // vertex in coordinates relative to point 0
        let s = DPoint::new((pt[po[i]].x - x0) as f64, (pt[po[i]].y - y0) as f64);

        let j = modn(i as i64 - 1, m);
        let mut qq: QuadForm = [[0.0; 3]; 3];
        for l in 0..3 {
            for k in 0..3 {
                qq[l][k] = q[j][l][k] + q[i][l][k];
            }
        }

        let mut w;
        loop {
            // unconstrained minimum of the combined form
            let det = qq[0][0] * qq[1][1] - qq[0][1] * qq[1][0];
            if det != 0.0 {
                w = DPoint::new(
                    (-qq[0][2] * qq[1][1] + qq[1][2] * qq[0][1]) / det,
                    (qq[0][2] * qq[1][0] - qq[1][2] * qq[0][0]) / det,
                );
                break;
            }
            // the matrix is singular: the lines are parallel. Add an
            // orthogonal axis through the center of the unit square and
            // solve again.
            let v = if qq[0][0] > qq[1][1] {
                [-qq[0][1], qq[0][0]]
            } else if qq[1][1] != 0.0 {
                [-qq[1][1], qq[1][0]]
            } else {
                [1.0, 0.0]
            };
            let d = v[0] * v[0] + v[1] * v[1];
            let v = [v[0], v[1], -v[1] * s.y - v[0] * s.x];
            for l in 0..3 {
                for k in 0..3 {
                    qq[l][k] += v[l] * v[k] / d;
                }
            }
        }

        let out = if (w.x - s.x).abs() <= 0.5 && (w.y - s.y).abs() <= 0.5 {
            w
        } else {
            // minimize over the boundary of the square: the four edges by
            // closed-form 1-D minimization, then the four corners
            let mut min = quadform(&qq, s);
            let mut best = s;

            if qq[0][0] != 0.0 {
                for z in 0..2 {
                    let wy = s.y - 0.5 + z as f64;
                    let wx = -(qq[0][1] * wy + qq[0][2]) / qq[0][0];
                    let cand = quadform(&qq, DPoint::new(wx, wy));
                    if (wx - s.x).abs() <= 0.5 && cand < min {
                        min = cand;
                        best = DPoint::new(wx, wy);
                    }
                }
            }
            if qq[1][1] != 0.0 {
                for z in 0..2 {
                    let wx = s.x - 0.5 + z as f64;
                    let wy = -(qq[1][0] * wx + qq[1][2]) / qq[1][1];
                    let cand = quadform(&qq, DPoint::new(wx, wy));
                    if (wy - s.y).abs() <= 0.5 && cand < min {
                        min = cand;
                        best = DPoint::new(wx, wy);
                    }
                }
            }
            for l in 0..2 {
                for k in 0..2 {
                    let cand_p = DPoint::new(s.x - 0.5 + l as f64, s.y - 0.5 + k as f64);
                    let cand = quadform(&qq, cand_p);
                    if cand < min {
                        min = cand;
                        best = cand_p;
                    }
                }
            }
            best
        };

        let idx = if sign { i } else { m - 1 - i };
        vertices[idx] = DPoint::new(out.x + x0 as f64, out.y + y0 as f64);
    }

    vertices
}
