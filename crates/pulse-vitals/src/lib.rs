//! Pulse-oximetry estimation core.
//!
//! Turns raw red/IR photodetector samples from a MAX30100-class optical
//! sensor into a heart-rate and SpO2 estimate, and decides whether a
//! reading is alert-worthy.
//!
//! # Architecture
//!
//! A read cycle feeds one [`SampleWindow`] through three stages:
//!
//! 1. **Validation** ([`SampleValidator`]): drops samples whose screened
//!    intensity is at or below the presence threshold (finger absent,
//!    signal too weak). The strategy picks the channels to screen.
//! 2. **Estimation** ([`EstimationStrategy`]): either the empirical
//!    red/IR ratio model ([`RatioEstimator`]) or peak counting over the
//!    IR waveform ([`PeakCountEstimator`]).
//! 3. **Range check** ([`AlertPolicy`]): compares heart rate, SpO2 and
//!    body temperature against fixed bounds.
//!
//! Nothing here performs I/O; acquisition lives in `pulse-hardware`.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use pulse_vitals::{
//!     AlertPolicy, EstimationStrategy, RawSample, SampleValidator, SampleWindow,
//! };
//!
//! let start = Instant::now();
//! let samples = (0..20)
//!     .map(|i| RawSample::new(2000, 4000, start + Duration::from_millis(100 * i)))
//!     .collect();
//! let window = SampleWindow::new(samples, Duration::from_secs(2));
//!
//! let (valid, count) = SampleValidator::default().validate(window);
//! assert_eq!(count, 20);
//!
//! let estimate = EstimationStrategy::default().estimate(&valid).unwrap();
//! assert!((estimate.spo2 - 97.5).abs() < 1e-9);
//! assert!((estimate.heart_rate - 70.0).abs() < 1e-9);
//!
//! let alert = AlertPolicy::default().is_alert(estimate.heart_rate, estimate.spo2, 36.8);
//! assert!(!alert);
//! ```

pub mod alert;
pub mod error;
pub mod peaks;
pub mod ratio;
pub mod strategy;
pub mod types;
pub mod validator;

pub use alert::{AlertPolicy, RangeViolation, Vital};
pub use error::{EstimationError, EstimationResult};
pub use peaks::{find_peaks, PeakCountEstimator, Spo2Source};
pub use ratio::RatioEstimator;
pub use strategy::EstimationStrategy;
pub use types::{EnvironmentReading, RawSample, SampleWindow, VitalsEstimate};
pub use validator::{SampleValidator, ScreenedChannels};
