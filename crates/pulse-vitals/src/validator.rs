//! Presence/strength filter applied before estimation.
//!
//! The MAX30100 reports low counts on both channels when no finger covers
//! the window. Anything at or below the threshold is treated as noise.
//! Which channels are screened depends on what the estimator consumes:
//! the ratio model needs both, peak counting only looks at IR.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{RawSample, SampleWindow};

/// Channels a sample must clear the threshold on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScreenedChannels {
    /// Red and IR.
    #[default]
    Both,
    /// IR only; red may be absent (heart-rate-only sensor mode).
    IrOnly,
}

/// Drops samples whose screened intensities are at or below a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleValidator {
    threshold: u32,
    channels: ScreenedChannels,
}

impl SampleValidator {
    /// Intensity (ADC counts) a channel must exceed to count as valid.
    pub const DEFAULT_THRESHOLD: u32 = 1000;

    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            channels: ScreenedChannels::Both,
        }
    }

    #[must_use]
    pub fn with_channels(mut self, channels: ScreenedChannels) -> Self {
        self.channels = channels;
        self
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn channels(&self) -> ScreenedChannels {
        self.channels
    }

    /// Every screened channel strictly above the threshold.
    #[must_use]
    pub fn is_valid(&self, sample: &RawSample) -> bool {
        let ir_ok = sample.ir > self.threshold;
        match self.channels {
            ScreenedChannels::Both => ir_ok && sample.red > self.threshold,
            ScreenedChannels::IrOnly => ir_ok,
        }
    }

    /// Filter a window, keeping order and elapsed time.
    ///
    /// Returns the filtered window and the number of samples kept. An
    /// empty input yields an empty window; enforcing a minimum count is
    /// left to the estimator.
    pub fn validate(&self, window: SampleWindow) -> (SampleWindow, usize) {
        let elapsed = window.elapsed();
        let total = window.len();
        let kept: Vec<RawSample> = window
            .into_samples()
            .into_iter()
            .filter(|s| self.is_valid(s))
            .collect();
        let count = kept.len();
        debug!(
            total,
            valid = count,
            threshold = self.threshold,
            channels = ?self.channels,
            "validated sample window"
        );
        (SampleWindow::new(kept, elapsed), count)
    }
}

impl Default for SampleValidator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn window(pairs: &[(u32, u32)]) -> SampleWindow {
        let t = Instant::now();
        SampleWindow::new(
            pairs.iter().map(|&(r, i)| RawSample::new(r, i, t)).collect(),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn weak_samples_are_all_dropped() {
        let (valid, count) =
            SampleValidator::default().validate(window(&[(1000, 5000), (5000, 1000), (0, 0), (999, 999)]));
        assert_eq!(count, 0);
        assert!(valid.is_empty());
    }

    #[test]
    fn threshold_is_exclusive() {
        let v = SampleValidator::default();
        let t = Instant::now();
        assert!(!v.is_valid(&RawSample::new(1000, 1001, t)));
        assert!(v.is_valid(&RawSample::new(1001, 1001, t)));
    }

    #[test]
    fn mixed_window_keeps_order() {
        let (valid, count) =
            SampleValidator::default().validate(window(&[(2000, 4000), (10, 10), (2100, 4100)]));
        assert_eq!(count, 2);
        let reds: Vec<u32> = valid.samples().iter().map(|s| s.red).collect();
        assert_eq!(reds, vec![2000, 2100]);
        assert_eq!(valid.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let (valid, count) = SampleValidator::default().validate(SampleWindow::default());
        assert_eq!(count, 0);
        assert!(valid.is_empty());
    }

    #[test]
    fn ir_only_keeps_samples_without_red() {
        let v = SampleValidator::default().with_channels(ScreenedChannels::IrOnly);
        let (valid, count) = v.validate(window(&[(0, 4000), (0, 900), (2000, 4100)]));
        assert_eq!(count, 2);
        let irs: Vec<u32> = valid.samples().iter().map(|s| s.ir).collect();
        assert_eq!(irs, vec![4000, 4100]);
    }

    #[test]
    fn custom_threshold() {
        let (_, count) = SampleValidator::new(0).validate(window(&[(1, 1), (0, 5)]));
        assert_eq!(count, 1);
    }
}
