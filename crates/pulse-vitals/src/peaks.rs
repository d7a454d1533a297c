//! Peak-counting heart-rate estimator over the IR waveform.
//!
//! Each cardiac cycle produces one systolic peak in the IR absorption
//! signal. Counting peaks across a window of known length gives beats per
//! minute without any filtering, which is crude but cheap enough to run on
//! the sensor host.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EstimationResult;
use crate::ratio::{red_ir_ratio, spo2_from_ratio};
use crate::types::{SampleWindow, VitalsEstimate};

/// Where the peak-count strategy takes its SpO2 value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Spo2Source {
    /// Ratio model over the same window.
    #[default]
    RatioFormula,
    /// Raw red intensity of the last sample, unscaled.
    ///
    /// Not a saturation value. Exists only to reproduce readings from
    /// older firmware and must be selected explicitly.
    LastRedSample,
}

/// Locate local maxima in `signal`.
///
/// Behaves like the classic `find_peaks(x, height, distance)`:
///
/// - a peak is strictly greater than its left neighbour and strictly
///   greater than the first differing sample on its right; flat tops
///   report their middle index (rounded down);
/// - the first and last samples are never peaks;
/// - peaks below `min_height` are dropped first;
/// - then, taking peaks from highest to lowest, every remaining peak closer
///   than `min_distance` samples to a kept one is removed.
///
/// Returned indices are in ascending order.
#[must_use]
pub fn find_peaks(signal: &[f64], min_distance: usize, min_height: Option<f64>) -> Vec<usize> {
    let mut peaks = local_maxima(signal);
    if let Some(h) = min_height {
        peaks.retain(|&p| signal[p] >= h);
    }
    if min_distance > 1 && peaks.len() > 1 {
        peaks = select_by_distance(signal, &peaks, min_distance);
    }
    peaks
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < i_max && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left = i;
                let right = ahead - 1;
                peaks.push((left + right) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

fn select_by_distance(x: &[f64], peaks: &[usize], distance: usize) -> Vec<usize> {
    let n = peaks.len();
    let mut keep = vec![true; n];

    // Ascending by height; ties keep index order so the later peak wins.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| x[peaks[a]].total_cmp(&x[peaks[b]]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

/// Heart rate from IR peak count, SpO2 per [`Spo2Source`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PeakCountEstimator {
    /// Minimum separation between peaks, in samples.
    pub min_distance: usize,
    /// Peaks must reach this fraction of the window maximum.
    pub height_factor: f64,
    /// Below this many samples both outputs are 0.
    pub min_samples: usize,
    pub spo2_source: Spo2Source,
}

impl PeakCountEstimator {
    pub const DEFAULT_MIN_DISTANCE: usize = 15;
    pub const DEFAULT_HEIGHT_FACTOR: f64 = 0.6;
    pub const DEFAULT_MIN_SAMPLES: usize = 10;

    #[must_use]
    pub fn with_spo2_source(mut self, source: Spo2Source) -> Self {
        self.spo2_source = source;
        self
    }

    /// Number of qualifying IR peaks in the window.
    #[must_use]
    pub fn count_peaks(&self, window: &SampleWindow) -> usize {
        let ir = window.ir_signal();
        let max = ir.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        find_peaks(&ir, self.min_distance, Some(self.height_factor * max)).len()
    }

    /// Estimate from a validated window.
    ///
    /// Heart rate is `peaks / seconds * 60` when more than one peak is
    /// found and 0 otherwise. A window shorter than `min_samples` yields
    /// `(0, 0)`.
    ///
    /// # Errors
    ///
    /// Only the ratio SpO2 source can fail, with `DivisionByZero` on an
    /// all-zero IR channel.
    pub fn estimate(&self, window: &SampleWindow) -> EstimationResult<VitalsEstimate> {
        if window.len() < self.min_samples {
            debug!(samples = window.len(), required = self.min_samples, "window too short for peak count");
            return Ok(VitalsEstimate::none());
        }

        let peaks = self.count_peaks(window);
        let secs = window.elapsed().as_secs_f64();
        let heart_rate = if peaks > 1 && secs > 0.0 {
            peaks as f64 / secs * 60.0
        } else {
            0.0
        };

        let spo2 = match self.spo2_source {
            Spo2Source::RatioFormula => spo2_from_ratio(red_ir_ratio(window.samples())?),
            Spo2Source::LastRedSample => {
                let red = window.last().map_or(0.0, |s| f64::from(s.red));
                warn!(red, "reporting raw red intensity as SpO2 (legacy parity mode)");
                red
            }
        };

        debug!(peaks, secs, heart_rate, spo2, "peak-count estimate");
        Ok(VitalsEstimate { heart_rate, spo2 })
    }
}

impl Default for PeakCountEstimator {
    fn default() -> Self {
        Self {
            min_distance: Self::DEFAULT_MIN_DISTANCE,
            height_factor: Self::DEFAULT_HEIGHT_FACTOR,
            min_samples: Self::DEFAULT_MIN_SAMPLES,
            spo2_source: Spo2Source::default(),
        }
    }
}
