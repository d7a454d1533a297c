//! Simulated devices, used only when simulation is switched on explicitly.
//!
//! The oximeter synthesises a pulsatile PPG trace from wall-clock time so
//! both acquisition plans see a realistic rate; the environment sensor
//! wanders around a resting body temperature.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use pulse_vitals::EnvironmentReading;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::HardwareError;
use crate::port::{Actuator, EnvironmentSensor, OpticalSensor};

/// Synthetic MAX30100.
pub struct SimulatedOximeter {
    rng: StdRng,
    heart_rate_bpm: f64,
    red_dc: f64,
    ir_dc: f64,
    /// Pulsatile amplitude as a fraction of DC.
    perfusion: f64,
    noise: f64,
    finger_present: bool,
    started: Option<Instant>,
}

impl SimulatedOximeter {
    /// 72 bpm with a red/IR DC ratio of 0.5.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            heart_rate_bpm: 72.0,
            red_dc: 25_000.0,
            ir_dc: 50_000.0,
            perfusion: 0.04,
            noise: 2.0,
            finger_present: true,
            started: None,
        }
    }

    #[must_use]
    pub fn with_heart_rate(mut self, bpm: f64) -> Self {
        self.heart_rate_bpm = bpm;
        self
    }

    #[must_use]
    pub fn with_dc_levels(mut self, red: f64, ir: f64) -> Self {
        self.red_dc = red;
        self.ir_dc = ir;
        self
    }

    /// Without a finger both channels read near the ambient floor.
    #[must_use]
    pub fn with_finger(mut self, present: bool) -> Self {
        self.finger_present = present;
        self
    }

    fn channel(&mut self, dc: f64, phase: f64) -> u32 {
        let jitter = self.rng.gen_range(-self.noise..=self.noise);
        let value = dc * (1.0 + self.perfusion * phase) + jitter;
        value.clamp(0.0, f64::from(u16::MAX)) as u32
    }
}

impl OpticalSensor for SimulatedOximeter {
    fn enable(&mut self) -> Result<(), HardwareError> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn read_one(&mut self) -> Result<(u32, u32), HardwareError> {
        let started = self.started.ok_or(HardwareError::NotInitialized {
            device: "simulated MAX30100",
        })?;
        if !self.finger_present {
            let floor = self.rng.gen_range(0..400);
            return Ok((floor, floor));
        }
        let t = started.elapsed().as_secs_f64();
        let phase = pulse_shape((t * self.heart_rate_bpm / 60.0).fract()) * 2.0 - 1.0;
        let red = self.channel(self.red_dc, phase);
        let ir = self.channel(self.ir_dc, phase);
        Ok((red, ir))
    }

    fn shutdown(&mut self) -> Result<(), HardwareError> {
        self.started = None;
        Ok(())
    }
}

/// One beat in `[0, 1)` mapped to `[0, 1]`: linear systolic upstroke over
/// the first 15 %, then exponential diastolic decay. Strictly monotonic on
/// each side so jitter does not create spurious maxima.
fn pulse_shape(beat: f64) -> f64 {
    const RISE: f64 = 0.15;
    if beat < RISE {
        beat / RISE
    } else {
        (-(beat - RISE) * 4.0).exp()
    }
}

/// Synthetic DHT11.
pub struct SimulatedEnvironment {
    rng: StdRng,
    temperature: f64,
    humidity: f64,
}

impl SimulatedEnvironment {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            temperature: 36.6,
            humidity: 45.0,
        }
    }

    #[must_use]
    pub fn with_baseline(mut self, temperature: f64, humidity: f64) -> Self {
        self.temperature = temperature;
        self.humidity = humidity;
        self
    }
}

impl EnvironmentSensor for SimulatedEnvironment {
    fn read_environment(&mut self) -> Result<EnvironmentReading, HardwareError> {
        let dt = self.rng.gen_range(-0.2..=0.2);
        let dh = self.rng.gen_range(-2.0..=2.0);
        Ok(EnvironmentReading {
            temperature: ((self.temperature + dt) * 10.0).round() / 10.0,
            humidity: (self.humidity + dh).round(),
        })
    }
}

/// Buzzer that records every state it is driven to.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBuzzer {
    history: Arc<Mutex<Vec<bool>>>,
}

impl SimulatedBuzzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the recorded states, oldest first.
    pub fn history(&self) -> Arc<Mutex<Vec<bool>>> {
        Arc::clone(&self.history)
    }

    pub fn last(&self) -> Option<bool> {
        self.history.lock().last().copied()
    }
}

impl Actuator for SimulatedBuzzer {
    fn set_output(&mut self, active: bool) -> Result<(), HardwareError> {
        info!(active, "simulated buzzer");
        self.history.lock().push(active);
        Ok(())
    }
}
