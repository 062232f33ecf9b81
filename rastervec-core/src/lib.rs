//! # rastervec-core
//!
//! Core bitmap-to-vector tracing engine for the rastervec project.
//! Given a binary raster, produces a tree of closed outlines, each a loop of
//! straight and cubic Bézier segments approximating the boundary between
//! foreground and background pixels (Potrace-style tracing, Selinger 2003).
//!
//! The pipeline runs in three phases:
//! - contour extraction with configurable ambiguity resolution,
//! - nesting resolution into an outline tree,
//! - five per-path analysis stages (straight subpaths, optimal polygon,
//!   vertex adjustment, smoothing, curve optimization), parallel across
//!   paths.

pub mod bitmap;
pub mod config;
pub mod curve;
pub mod error;
pub mod execution;
pub mod geom;
pub mod path;
pub mod progress;

mod contour;
mod nesting;
mod optimize;
mod pipeline;
mod polygon;
mod smooth;
mod vertex;

// Re-export main types for convenience
pub use bitmap::Bitmap;
pub use config::{TraceConfig, TurnPolicy};
pub use curve::{Curve, Segment};
pub use error::{TraceError, TraceResult};
pub use geom::{BBox, DPoint, IntPoint};
pub use path::{Path, PathNode, Trace, TraceIter};
pub use progress::{CancelToken, ProgressSink, ProgressStage};

/// Trace a binary raster into an outline tree.
///
/// Set bits are foreground. An all-background raster (after despeckling)
/// yields an empty trace, not an error.
///
/// # Errors
/// Returns [`TraceError::InvalidParameter`] when the configuration is out
/// of range.
pub fn trace_bitmap(bitmap: &Bitmap, config: &TraceConfig) -> TraceResult<Trace> {
    pipeline::run(bitmap, config, None, &CancelToken::new())
}

/// Trace a binary raster with progress reporting and cooperative
/// cancellation.
///
/// The sink receives [`ProgressStage::PathListGeneration`] reports during
/// contour extraction and [`ProgressStage::Tracing`] reports during
/// parallel per-path analysis, each with a monotone fraction in [0, 1].
/// When `cancel` fires the pipeline fails fast with
/// [`TraceError::Cancelled`] and no partial tree is returned.
pub fn trace_bitmap_with(
    bitmap: &Bitmap,
    config: &TraceConfig,
    progress: Option<&dyn ProgressSink>,
    cancel: &CancelToken,
) -> TraceResult<Trace> {
    pipeline::run(bitmap, config, progress, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_raster_gives_empty_trace() {
        let bm = Bitmap::new(1, 1).unwrap();
        let trace = trace_bitmap(&bm, &TraceConfig::default()).unwrap();
        assert!(trace.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bm = Bitmap::new(8, 8).unwrap();
        let config = TraceConfig {
            turdsize: -5,
            ..Default::default()
        };
        let result = trace_bitmap(&bm, &config);
        assert!(matches!(
            result,
            Err(TraceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_simple_square_smoke() {
        let mut bm = Bitmap::new(16, 16).unwrap();
        for y in 4..12 {
            for x in 4..12 {
                bm.set(x, y);
            }
        }
        let trace = trace_bitmap(&bm, &TraceConfig::default()).unwrap();
        assert_eq!(trace.roots().len(), 1);
        let node = &trace.roots()[0];
        assert!(node.sign());
        assert!(!node.curve().is_empty());
        assert!(node.children().is_empty());
    }
}
