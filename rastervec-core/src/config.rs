//! Configuration types for the tracing pipeline

use serde::{Deserialize, Serialize};

use crate::error::{TraceError, TraceResult};

/// Tie-break rule for ambiguous diagonal crossings during contour tracing.
///
/// At a corner where both diagonal neighbours carry the same color the edge
/// follower has two equally valid continuations; the policy picks one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPolicy {
    /// Always take the right turn.
    Right,
    /// Always take the left turn.
    Left,
    /// Turn right on foreground contours, left on background ones.
    Black,
    /// Turn right on background contours, left on foreground ones.
    White,
    /// Follow the locally dominant color.
    Majority,
    /// Go against the locally dominant color.
    #[default]
    Minority,
    /// Fair coin flip from a per-invocation PRNG.
    Random,
}

/// Configuration for a trace run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Drop contours whose enclosed area is at most this many pixels
    /// (despeckling).
    pub turdsize: i64,

    /// Resolution rule for ambiguous crossings.
    pub turnpolicy: TurnPolicy,

    /// Corner threshold for smoothing: 0.0 yields a pure polygon,
    /// values near 4/3 produce no corners at all.
    pub alphamax: f64,

    /// Maximum per-segment deviation allowed when merging Bézier chains;
    /// 0.0 disables curve optimization entirely.
    pub opttolerance: f64,

    /// Seed for the `Random` turn policy PRNG. `None` seeds from entropy;
    /// set it for reproducible output.
    pub random_seed: Option<u64>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            turdsize: 2,
            turnpolicy: TurnPolicy::Minority,
            alphamax: 1.0,
            opttolerance: 0.2,
            random_seed: None,
        }
    }
}

impl TraceConfig {
    pub const MAX_TURDSIZE: i64 = 1000;
    pub const MAX_ALPHAMAX: f64 = 1.334;
    pub const MAX_OPTTOLERANCE: f64 = 5.0;

    /// Validate parameter ranges. Called before the pipeline starts; an
    /// invalid configuration never begins tracing.
    pub fn validate(&self) -> TraceResult<()> {
        if !(0..=Self::MAX_TURDSIZE).contains(&self.turdsize) {
            return Err(TraceError::invalid_parameter(format!(
                "turdsize {} out of range [0, {}]",
                self.turdsize,
                Self::MAX_TURDSIZE
            )));
        }
        if self.alphamax.is_nan() || !(0.0..=Self::MAX_ALPHAMAX).contains(&self.alphamax) {
            return Err(TraceError::invalid_parameter(format!(
                "alphamax {} out of range [0, {}]",
                self.alphamax,
                Self::MAX_ALPHAMAX
            )));
        }
        if self.opttolerance.is_nan()
            || !(0.0..=Self::MAX_OPTTOLERANCE).contains(&self.opttolerance)
        {
            return Err(TraceError::invalid_parameter(format!(
                "opttolerance {} out of range [0, {}]",
                self.opttolerance,
                Self::MAX_OPTTOLERANCE
            )));
        }
        Ok(())
    }
}
