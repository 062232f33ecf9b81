//! Contour extraction: closed pixel-boundary paths from a binary raster.
//!
//! The tracer repeatedly finds the next set pixel in scan order, follows the
//! boundary of its connected region with the foreground kept on a fixed
//! side, xor-fills the enclosed interior out of the working bitmap, and
//! despeckles. The sign of a contour is read from the untouched original
//! bitmap, since xor-filling turns hole interiors into set regions on the
//! working copy.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::bitmap::Bitmap;
use crate::config::{TraceConfig, TurnPolicy};
use crate::error::TraceResult;
use crate::geom::IntPoint;
use crate::path::Path;
use crate::progress::{CancelToken, ProgressSink, ProgressStage};

/// Extract all contours of the working bitmap, despeckled and in discovery
/// order (top-down scan, outer contours before the holes they contain).
pub(crate) fn extract_paths(
    original: &Bitmap,
    work: &mut Bitmap,
    config: &TraceConfig,
    progress: Option<&dyn ProgressSink>,
    cancel: &CancelToken,
) -> TraceResult<Vec<Path>> {
    let mut rng = match config.random_seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let height = work.height() as i32;
    let mut paths = Vec::new();
    let mut x = 0i32;
    let mut y = height - 1;

    while let Some((nx, ny)) = work.find_next_set(x, y) {
        cancel.check()?;
        x = nx;
        y = ny;

        let sign = original.get(x, y);
        let path = trace_contour(work, x, y, sign, config.turnpolicy, &mut rng);
        xor_path(work, &path);

        if path.raw_area() > config.turdsize {
            log::trace!(
                "contour at ({x},{y}): {} points, area {}, sign {}",
                path.len(),
                path.raw_area(),
                if sign { '+' } else { '-' }
            );
            paths.push(path);
        }

        if let Some(sink) = progress {
            sink.report(
                ProgressStage::PathListGeneration,
                (height - y) as f64 / height as f64,
            );
        }
    }

    if let Some(sink) = progress {
        sink.report(ProgressStage::PathListGeneration, 1.0);
    }
    Ok(paths)
}

/// Follow one closed contour starting from the upper-left corner of pixel
/// (x0, y0), which must be set in `work`.
fn trace_contour(
    work: &Bitmap,
    x0: i32,
    y0: i32,
    sign: bool,
    policy: TurnPolicy,
    rng: &mut SmallRng,
) -> Path {
    let start_x = x0;
    let start_y = y0 + 1;
    let mut x = start_x;
    let mut y = start_y;
    let mut dirx = 0i32;
    let mut diry = -1i32;
    let mut area: i64 = 0;
    let mut points = Vec::new();

    loop {
        points.push(IntPoint::new(x, y));

        x += dirx;
        y += diry;
        area = area.saturating_add(x as i64 * diry as i64);

        if x == start_x && y == start_y {
            break;
        }

        // the two pixels diagonally ahead of the new corner
        let c = work.get(x + (dirx + diry - 1) / 2, y + (diry - dirx - 1) / 2);
        let d = work.get(x + (dirx - diry - 1) / 2, y + (diry + dirx - 1) / 2);

        if c && !d {
            // ambiguous crossing: both continuations are valid
            if turn_right(policy, sign, work, x, y, rng) {
                let tmp = dirx;
                dirx = diry;
                diry = -tmp;
            } else {
                let tmp = dirx;
                dirx = -diry;
                diry = tmp;
            }
        } else if c {
            let tmp = dirx;
            dirx = diry;
            diry = -tmp;
        } else if !d {
            let tmp = dirx;
            dirx = -diry;
            diry = tmp;
        }
    }

    Path::new(points, area, sign)
}

/// Resolve an ambiguous crossing: true picks the right turn.
fn turn_right(
    policy: TurnPolicy,
    sign: bool,
    work: &Bitmap,
    x: i32,
    y: i32,
    rng: &mut SmallRng,
) -> bool {
    match policy {
        TurnPolicy::Right => true,
        TurnPolicy::Left => false,
        TurnPolicy::Black => sign,
        TurnPolicy::White => !sign,
        TurnPolicy::Majority => majority(work, x, y),
        TurnPolicy::Minority => !majority(work, x, y),
        TurnPolicy::Random => rng.gen::<bool>(),
    }
}

/// Whether the color in the local neighbourhood of vertex (x, y) is mostly
/// set. Votes ±1 along the edges of squares of growing radius; the first
/// radius with a nonzero total decides.
fn majority(bm: &Bitmap, x: i32, y: i32) -> bool {
    for radius in 2..5 {
        let mut ct = 0i32;
        for a in -radius + 1..=radius - 1 {
            ct += if bm.get(x + a, y + radius - 1) { 1 } else { -1 };
            ct += if bm.get(x + radius - 1, y + a - 1) { 1 } else { -1 };
            ct += if bm.get(x + a - 1, y - radius) { 1 } else { -1 };
            ct += if bm.get(x - radius, y + a) { 1 } else { -1 };
        }
        if ct > 0 {
            return true;
        } else if ct < 0 {
            return false;
        }
    }
    false
}

/// Xor the interior of a path onto the bitmap. Each horizontal excursion of
/// the contour flips the span between the current x and the word-aligned
/// reference column of point 0, so the enclosed region ends up inverted and
/// everything else is flipped an even number of times.
pub(crate) fn xor_path(bm: &mut Bitmap, path: &Path) {
    let points = path.points();
    if points.is_empty() {
        return;
    }
    let mut y1 = points[points.len() - 1].y;
    let xa = points[0].x & !63;
    for p in points {
        if p.y != y1 {
            bm.xor_range(p.x, p.y.min(y1), xa);
            y1 = p.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_rect(w: usize, h: usize, x0: i32, y0: i32, x1: i32, y1: i32) -> Bitmap {
        let mut bm = Bitmap::new(w, h).unwrap();
        for y in y0..=y1 {
            for x in x0..=x1 {
                bm.set(x, y);
            }
        }
        bm
    }

    fn extract(bm: &Bitmap, config: &TraceConfig) -> Vec<Path> {
        let mut work = bm.clone();
        work.clear_excess();
        extract_paths(bm, &mut work, config, None, &CancelToken::new()).unwrap()
    }

    #[test]
    fn test_rectangle_contour() {
        let bm = filled_rect(32, 32, 8, 8, 23, 23);
        let paths = extract(&bm, &TraceConfig::default());
        assert_eq!(paths.len(), 1);
        let p = &paths[0];
        assert!(p.sign());
        assert_eq!(p.len(), 64);
        assert_eq!(p.raw_area(), 256);
        // point 0 is the upper-left corner
        assert_eq!(p.points()[0], IntPoint::new(8, 24));
    }

    #[test]
    fn test_contour_closure_invariant() {
        let bm = filled_rect(32, 32, 8, 8, 23, 23);
        let paths = extract(&bm, &TraceConfig::default());
        let pts = paths[0].points();
        let n = pts.len();
        for i in 0..n {
            let a = pts[i];
            let b = pts[(i + 1) % n];
            let step = (a.x - b.x).abs() + (a.y - b.y).abs();
            assert_eq!(step, 1, "non-unit step between {a:?} and {b:?}");
        }
    }

    #[test]
    fn test_working_bitmap_drained() {
        let bm = filled_rect(32, 32, 8, 8, 23, 23);
        let mut work = bm.clone();
        work.clear_excess();
        extract_paths(
            &bm,
            &mut work,
            &TraceConfig::default(),
            None,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(work.count_set(), 0);
    }

    #[test]
    fn test_despeckle_drops_single_pixel() {
        let mut bm = Bitmap::new(16, 16).unwrap();
        bm.set(5, 5);
        let paths = extract(&bm, &TraceConfig::default());
        assert!(paths.is_empty());

        // with despeckling off the pixel survives as a 4-point diamond
        let config = TraceConfig {
            turdsize: 0,
            ..Default::default()
        };
        let paths = extract(&bm, &config);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 4);
        assert_eq!(paths[0].raw_area(), 1);
    }

    #[test]
    fn test_hole_has_negative_sign() {
        // 8..24 square with a 10..22 hole: a frame of width 2
        let mut bm = filled_rect(32, 32, 8, 8, 23, 23);
        for y in 10..22 {
            for x in 10..22 {
                bm.clear_pixel(x, y);
            }
        }
        let paths = extract(&bm, &TraceConfig::default());
        assert_eq!(paths.len(), 2);
        assert!(paths[0].sign());
        assert!(!paths[1].sign());
        assert!(paths[0].area() > 0);
        assert!(paths[1].area() < 0);
        // the hole contour is discovered after its enclosing contour
        assert!(paths[1].points()[0].y < paths[0].points()[0].y);
    }

    #[test]
    fn test_cancellation_aborts() {
        let bm = filled_rect(32, 32, 8, 8, 23, 23);
        let mut work = bm.clone();
        work.clear_excess();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = extract_paths(&bm, &mut work, &TraceConfig::default(), None, &cancel);
        assert!(result.is_err());
    }

    #[test]
    fn test_random_policy_is_seed_deterministic() {
        // an 8-connected diagonal of single pixels forces ambiguous crossings
        let mut bm = Bitmap::new(16, 16).unwrap();
        for i in 0..8 {
            bm.set(4 + i, 4 + i);
        }
        let config = TraceConfig {
            turnpolicy: TurnPolicy::Random,
            random_seed: Some(42),
            turdsize: 0,
            ..Default::default()
        };
        let a = extract(&bm, &config);
        let b = extract(&bm, &config);
        assert_eq!(a.len(), b.len());
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.points(), pb.points());
        }
    }

    #[test]
    fn test_xor_path_round_trip() {
        let bm = filled_rect(32, 32, 8, 8, 23, 23);
        let paths = extract(&bm, &TraceConfig::default());
        let mut scratch = Bitmap::new(32, 32).unwrap();
        xor_path(&mut scratch, &paths[0]);
        // interior of the contour is filled
        assert_eq!(scratch.count_set(), 256);
        assert!(scratch.get(8, 8));
        assert!(scratch.get(23, 23));
        assert!(!scratch.get(24, 8));
        xor_path(&mut scratch, &paths[0]);
        assert_eq!(scratch.count_set(), 0);
    }
}
