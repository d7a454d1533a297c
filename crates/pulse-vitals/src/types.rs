//! Vital sign domain types.

use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One raw photodetector reading from the optical sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// Red LED channel intensity (ADC counts).
    pub red: u32,
    /// Infrared LED channel intensity (ADC counts).
    pub ir: u32,
    /// When the sample was taken.
    pub timestamp: Instant,
}

impl RawSample {
    pub fn new(red: u32, ir: u32, timestamp: Instant) -> Self {
        Self { red, ir, timestamp }
    }

    /// Sample stamped with the current instant.
    #[must_use]
    pub fn now(red: u32, ir: u32) -> Self {
        Self::new(red, ir, Instant::now())
    }
}

/// Ordered samples from a single acquisition, plus how long it took.
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    samples: Vec<RawSample>,
    elapsed: Duration,
}

impl SampleWindow {
    pub fn new(samples: Vec<RawSample>, elapsed: Duration) -> Self {
        Self { samples, elapsed }
    }

    pub fn samples(&self) -> &[RawSample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<RawSample> {
        self.samples
    }

    /// Wall-clock length of the acquisition.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// IR channel as floating point, in acquisition order.
    #[must_use]
    pub fn ir_signal(&self) -> Vec<f64> {
        self.samples.iter().map(|s| f64::from(s.ir)).collect()
    }

    pub fn last(&self) -> Option<&RawSample> {
        self.samples.last()
    }
}

/// Heart rate and SpO2 derived from one window.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VitalsEstimate {
    /// Beats per minute. `0.0` means no detectable pulse.
    pub heart_rate: f64,
    /// Blood oxygen saturation in percent.
    pub spo2: f64,
}

impl VitalsEstimate {
    /// Estimate carrying no pulse and no saturation.
    pub fn none() -> Self {
        Self {
            heart_rate: 0.0,
            spo2: 0.0,
        }
    }
}

/// Ambient reading from the temperature/humidity sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnvironmentReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}
