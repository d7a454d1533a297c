//! Ratio-of-averages SpO2 / heart-rate estimator.
//!
//! A fixed empirical linear model over the mean red and IR intensities of
//! a window. It is not a calibrated R-curve and the heart-rate mapping has
//! no physiological basis beyond tracking the ratio; the coefficients are
//! kept as-is so readings stay comparable with existing deployments.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EstimationError, EstimationResult};
use crate::types::{RawSample, VitalsEstimate};

/// SpO2 clamp range (%).
pub const SPO2_RANGE: (f64, f64) = (85.0, 100.0);
/// Heart-rate clamp range (bpm).
pub const HEART_RATE_RANGE: (f64, f64) = (50.0, 120.0);

/// Estimator mapping the red/IR ratio onto SpO2 and heart rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RatioEstimator {
    /// Minimum number of valid samples required.
    pub min_valid: usize,
}

impl RatioEstimator {
    pub const DEFAULT_MIN_VALID: usize = 5;

    pub fn new(min_valid: usize) -> Self {
        Self { min_valid }
    }

    /// Estimate from already-validated samples.
    ///
    /// # Errors
    ///
    /// [`EstimationError::InsufficientSamples`] when fewer than
    /// `min_valid` samples are present, [`EstimationError::DivisionByZero`]
    /// when the IR mean is zero.
    pub fn estimate(&self, samples: &[RawSample]) -> EstimationResult<VitalsEstimate> {
        if samples.len() < self.min_valid {
            return Err(EstimationError::InsufficientSamples {
                got: samples.len(),
                required: self.min_valid,
            });
        }
        let ratio = red_ir_ratio(samples)?;
        let estimate = VitalsEstimate {
            heart_rate: heart_rate_from_ratio(ratio),
            spo2: spo2_from_ratio(ratio),
        };
        debug!(
            samples = samples.len(),
            ratio,
            spo2 = estimate.spo2,
            heart_rate = estimate.heart_rate,
            "ratio estimate"
        );
        Ok(estimate)
    }
}

impl Default for RatioEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_VALID)
    }
}

/// Arithmetic means of the red and IR channels, `None` for no samples.
pub fn channel_means(samples: &[RawSample]) -> Option<(f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let (red, ir) = samples.iter().fold((0.0, 0.0), |(r, i), s| {
        (r + f64::from(s.red), i + f64::from(s.ir))
    });
    Some((red / n, ir / n))
}

/// `avg_red / avg_ir` over the samples.
///
/// An empty slice has a zero IR mean and reports `DivisionByZero`.
pub fn red_ir_ratio(samples: &[RawSample]) -> EstimationResult<f64> {
    let (avg_red, avg_ir) = channel_means(samples).unwrap_or((0.0, 0.0));
    if avg_ir == 0.0 {
        return Err(EstimationError::DivisionByZero);
    }
    Ok(avg_red / avg_ir)
}

/// `clamp(110 - 25 * ratio, 85, 100)`
#[must_use]
pub fn spo2_from_ratio(ratio: f64) -> f64 {
    (110.0 - 25.0 * ratio).clamp(SPO2_RANGE.0, SPO2_RANGE.1)
}

/// `clamp(70 + (ratio - 0.5) * 30, 50, 120)`
#[must_use]
pub fn heart_rate_from_ratio(ratio: f64) -> f64 {
    (70.0 + (ratio - 0.5) * 30.0).clamp(HEART_RATE_RANGE.0, HEART_RATE_RANGE.1)
}
