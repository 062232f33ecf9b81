//! End-to-end orchestration: contour extraction, nesting, parallel
//! per-path analysis, and assembly of the final outline tree.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use crate::bitmap::Bitmap;
use crate::config::TraceConfig;
use crate::contour;
use crate::error::TraceResult;
use crate::execution;
use crate::nesting::{self, NestNode};
use crate::optimize;
use crate::path::{calc_sums, Path, PathNode, Trace};
use crate::polygon;
use crate::progress::{CancelToken, ProgressSink, ProgressStage};
use crate::smooth;
use crate::vertex;

pub(crate) fn run(
    bitmap: &Bitmap,
    config: &TraceConfig,
    progress: Option<&dyn ProgressSink>,
    cancel: &CancelToken,
) -> TraceResult<Trace> {
    config.validate()?;

    let start_time = Instant::now();
    log::info!(
        "starting trace of {}x{} bitmap with config: {config:?}",
        bitmap.width(),
        bitmap.height()
    );

    // the tracer consumes a disposable clone; the input stays pristine so
    // contour signs can be read from it
    let mut work = bitmap.clone();
    work.clear_excess();
    let mut paths = contour::extract_paths(bitmap, &mut work, config, progress, cancel)?;
    log::debug!(
        "extracted {} contours in {:.2}ms",
        paths.len(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );

    if paths.is_empty() {
        log::debug!("no contours survived despeckling, returning empty trace");
        return Ok(Trace::default());
    }

    // the working bitmap doubles as nesting scratch; it is fully cleared
    // by the extraction loop's xor-fills
    let forest = nesting::resolve(&paths, &mut work, cancel)?;

    let total = paths.len();
    let done = AtomicUsize::new(0);
    // reports must be monotone within the stage; the lock orders them
    // across worker threads
    let high_water = Mutex::new(0.0f64);
    let results: Vec<TraceResult<()>> = execution::execute_parallel(&mut paths, |path| {
        analyze_path(path, config, cancel)?;
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(sink) = progress {
            let fraction = finished as f64 / total as f64;
            if let Ok(mut last) = high_water.lock() {
                if fraction > *last {
                    *last = fraction;
                    sink.report(ProgressStage::Tracing, fraction);
                }
            }
        }
        Ok(())
    });
    for result in results {
        result?;
    }

    let trace = assemble(paths, forest);
    log::info!(
        "traced {} outlines in {:.2}ms",
        trace.node_count(),
        start_time.elapsed().as_secs_f64() * 1000.0
    );
    Ok(trace)
}

/// Run the five analysis stages on one path, storing the final curve on it.
fn analyze_path(path: &mut Path, config: &TraceConfig, cancel: &CancelToken) -> TraceResult<()> {
    cancel.check()?;
    let sums = calc_sums(&path.points);
    let lon = polygon::calc_lon(&path.points);

    cancel.check()?;
    let po = polygon::best_polygon(&path.points, &sums, &lon);
    drop(lon);

    cancel.check()?;
    let vertices = vertex::adjust_vertices(&path.points, &sums, &po, path.sign);
    drop(sums);
    drop(po);

    cancel.check()?;
    let curve = smooth::smooth(&vertices, config.alphamax);

    cancel.check()?;
    let final_curve = if config.opttolerance > 0.0 {
        optimize::optimize_curve(&curve, config.opttolerance)
    } else {
        curve
    };
    path.curve = Some(final_curve);
    Ok(())
}

fn assemble(paths: Vec<Path>, forest: Vec<NestNode>) -> Trace {
    let mut slots: Vec<Option<Path>> = paths.into_iter().map(Some).collect();
    Trace {
        roots: build_nodes(forest, &mut slots),
    }
}

fn build_nodes(entries: Vec<NestNode>, slots: &mut [Option<Path>]) -> Vec<PathNode> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let children = build_nodes(entry.children, slots);
            let mut path = slots[entry.index].take()?;
            let curve = path.curve.take().unwrap_or_default();
            Some(PathNode {
                path,
                curve,
                children,
            })
        })
        .collect()
}
