//! The reading handed to the presentation layer.
//!
//! Field names on the wire are the ones existing dashboards consume:
//! `spo2`, `frecuencia`, `temperatura`, `humedad`, `edad`, `ejercicio`,
//! `alerta`.

use pulse_vitals::{EnvironmentReading, VitalsEstimate};
use serde::{Deserialize, Serialize};

/// Whether the subject was exercising when measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExerciseFlag {
    #[serde(rename = "si")]
    Yes,
    #[default]
    #[serde(rename = "no")]
    No,
}

/// Static subject data reported alongside every reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Demographics {
    pub age: u32,
    pub exercise: ExerciseFlag,
}

impl Default for Demographics {
    fn default() -> Self {
        Self {
            age: 25,
            exercise: ExerciseFlag::No,
        }
    }
}

/// One assembled reading. Built per request and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalsSnapshot {
    pub spo2: f64,
    #[serde(rename = "frecuencia")]
    pub heart_rate: f64,
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    #[serde(rename = "humedad")]
    pub humidity: f64,
    #[serde(rename = "edad")]
    pub age: u32,
    #[serde(rename = "ejercicio")]
    pub exercise: ExerciseFlag,
    #[serde(rename = "alerta")]
    pub alert: bool,
}

impl VitalsSnapshot {
    /// Combine one cycle's outputs, rounding measurements to 0.1.
    pub fn assemble(
        estimate: &VitalsEstimate,
        environment: &EnvironmentReading,
        alert: bool,
        demographics: &Demographics,
    ) -> Self {
        Self {
            spo2: round1(estimate.spo2),
            heart_rate: round1(estimate.heart_rate),
            temperature: round1(environment.temperature),
            humidity: round1(environment.humidity),
            age: demographics.age,
            exercise: demographics.exercise,
            alert,
        }
    }

    /// Substitute for a failed cycle: all measurements zero, alert raised.
    ///
    /// Age and exercise flag are the configured demographics, exactly as in
    /// a successful reading; with the default config that is 25 / `"no"`.
    pub fn fail_safe(demographics: &Demographics) -> Self {
        Self {
            spo2: 0.0,
            heart_rate: 0.0,
            temperature: 0.0,
            humidity: 0.0,
            age: demographics.age,
            exercise: demographics.exercise,
            alert: true,
        }
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
