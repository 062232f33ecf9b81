//! Progress reporting and cooperative cancellation contracts.
//!
//! The core never spawns timers or threads for observability; it reports
//! through whatever sink the caller provides and polls the cancellation
//! token at the documented checkpoints (per traced contour, per nesting
//! step, and between per-path analysis stages).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{TraceError, TraceResult};

/// Pipeline phases visible to a progress sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// Contour extraction and despeckling.
    PathListGeneration,
    /// Parallel per-path analysis.
    Tracing,
}

/// Receiver for progress reports.
///
/// `fraction` is in [0, 1] and is monotonically non-decreasing within each
/// stage. Implementations must be cheap; reports fire from worker threads.
pub trait ProgressSink: Sync {
    fn report(&self, stage: ProgressStage, fraction: f64);
}

/// Cooperative cancellation token, cloneable across threads.
///
/// Cancellation is checked at loop boundaries only; an in-flight numeric
/// stage finishes its current path before the pipeline aborts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Checkpoint: error out if cancellation was requested.
    pub(crate) fn check(&self) -> TraceResult<()> {
        if self.is_cancelled() {
            Err(TraceError::Cancelled)
        } else {
            Ok(())
        }
    }
}
