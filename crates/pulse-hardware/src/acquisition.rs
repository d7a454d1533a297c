//! Sample acquisition from the optical sensor.

use std::thread;
use std::time::{Duration, Instant};

use pulse_vitals::{EstimationStrategy, RawSample, SampleWindow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::HardwareError;
use crate::port::OpticalSensor;

/// How long to sample and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AcquisitionPlan {
    /// Fixed number of polls.
    Count {
        samples: usize,
        interval_ms: u64,
        /// Pause between enabling the sensor and the first poll.
        #[serde(default)]
        settle_ms: u64,
    },
    /// Poll until the window has elapsed.
    Duration {
        window_ms: u64,
        interval_ms: u64,
        #[serde(default)]
        settle_ms: u64,
    },
}

impl AcquisitionPlan {
    /// 20 polls 100 ms apart after a 2 s settle. Suits the ratio model.
    pub fn burst() -> Self {
        Self::Count {
            samples: 20,
            interval_ms: 100,
            settle_ms: 2_000,
        }
    }

    /// 10 s of polling every 10 ms. Suits peak counting.
    pub fn timed() -> Self {
        Self::Duration {
            window_ms: 10_000,
            interval_ms: 10,
            settle_ms: 0,
        }
    }

    /// Plan that gives `strategy` the data it was tuned on.
    pub fn recommended_for(strategy: &EstimationStrategy) -> Self {
        match strategy {
            EstimationStrategy::Ratio(_) => Self::burst(),
            EstimationStrategy::PeakCount(_) => Self::timed(),
        }
    }

    pub fn interval(&self) -> Duration {
        match *self {
            Self::Count { interval_ms, .. } | Self::Duration { interval_ms, .. } => {
                Duration::from_millis(interval_ms)
            }
        }
    }

    pub fn settle(&self) -> Duration {
        match *self {
            Self::Count { settle_ms, .. } | Self::Duration { settle_ms, .. } => {
                Duration::from_millis(settle_ms)
            }
        }
    }
}

impl Default for AcquisitionPlan {
    fn default() -> Self {
        Self::burst()
    }
}

/// Scope during which the optical sensor is powered.
///
/// Opening enables the sensor; dropping shuts it down, whether the
/// acquisition finished, returned an error or panicked.
pub struct SensorSession<'a, S: OpticalSensor + ?Sized> {
    sensor: &'a mut S,
}

impl<'a, S: OpticalSensor + ?Sized> SensorSession<'a, S> {
    pub fn open(sensor: &'a mut S) -> Result<Self, HardwareError> {
        sensor.enable()?;
        debug!("optical sensor enabled");
        Ok(Self { sensor })
    }

    /// Read one pair and stamp it.
    pub fn read_sample(&mut self) -> Result<RawSample, HardwareError> {
        let (red, ir) = self.sensor.read_one()?;
        Ok(RawSample::now(red, ir))
    }
}

impl<S: OpticalSensor + ?Sized> Drop for SensorSession<'_, S> {
    fn drop(&mut self) {
        match self.sensor.shutdown() {
            Ok(()) => debug!("optical sensor shut down"),
            Err(e) => warn!(error = %e, "optical sensor shutdown failed"),
        }
    }
}

/// Collect one window according to `plan`.
///
/// Any driver error aborts the acquisition; there is no per-sample retry.
pub fn acquire<S>(sensor: &mut S, plan: &AcquisitionPlan) -> Result<SampleWindow, HardwareError>
where
    S: OpticalSensor + ?Sized,
{
    let mut session = SensorSession::open(sensor)?;

    let settle = plan.settle();
    if !settle.is_zero() {
        thread::sleep(settle);
    }

    let interval = plan.interval();
    let start = Instant::now();
    let mut samples = Vec::new();

    match *plan {
        AcquisitionPlan::Count { samples: n, .. } => {
            samples.reserve(n);
            for _ in 0..n {
                samples.push(session.read_sample()?);
                thread::sleep(interval);
            }
        }
        AcquisitionPlan::Duration { window_ms, .. } => {
            let window = Duration::from_millis(window_ms);
            while start.elapsed() < window {
                samples.push(session.read_sample()?);
                thread::sleep(interval);
            }
        }
    }

    let elapsed = start.elapsed();
    drop(session);

    info!(samples = samples.len(), elapsed_ms = elapsed.as_millis() as u64, "acquired sample window");
    Ok(SampleWindow::new(samples, elapsed))
}
