//! Named estimation strategies.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::EstimationResult;
use crate::peaks::PeakCountEstimator;
use crate::ratio::RatioEstimator;
use crate::types::{SampleWindow, VitalsEstimate};
use crate::validator::ScreenedChannels;

/// Which estimator turns a validated window into vitals.
///
/// Serialized as `{"kind": "ratio", ...}` or `{"kind": "peak_count", ...}`
/// with the estimator's parameters inline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum EstimationStrategy {
    /// Empirical red/IR ratio model over a short fixed-count burst.
    Ratio(RatioEstimator),
    /// IR peak counting over a timed window.
    PeakCount(PeakCountEstimator),
}

impl EstimationStrategy {
    pub fn ratio() -> Self {
        Self::Ratio(RatioEstimator::default())
    }

    pub fn peak_count() -> Self {
        Self::PeakCount(PeakCountEstimator::default())
    }

    /// Short identifier used in logs and the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ratio(_) => "ratio",
            Self::PeakCount(_) => "peak_count",
        }
    }

    /// Channels the validator must screen for this estimator.
    ///
    /// Peak counting only reads IR, so a window without a red channel
    /// (heart-rate mode) must not be discarded.
    pub fn screened_channels(&self) -> ScreenedChannels {
        match self {
            Self::Ratio(_) => ScreenedChannels::Both,
            Self::PeakCount(_) => ScreenedChannels::IrOnly,
        }
    }

    /// Run the selected estimator on a validated window.
    pub fn estimate(&self, window: &SampleWindow) -> EstimationResult<VitalsEstimate> {
        match self {
            Self::Ratio(est) => est.estimate(window.samples()),
            Self::PeakCount(est) => est.estimate(window),
        }
    }
}

impl Default for EstimationStrategy {
    fn default() -> Self {
        Self::ratio()
    }
}

impl fmt::Display for EstimationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
