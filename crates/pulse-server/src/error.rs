//! Error types for the monitor service.
//!
//! ```text
//! MonitorError
//! ├── SensorUnavailable   (device missing or bus failure)
//! ├── InvalidReading      (device answered with garbage, retries exhausted)
//! ├── InsufficientSamples (too few valid optical samples)
//! ├── DivisionByZero      (IR mean of zero)
//! └── Busy                (another cycle holds the hardware)
//! ConfigError             (config file loading / validation)
//! ```

use std::path::PathBuf;

use pulse_hardware::HardwareError;
use pulse_vitals::EstimationError;
use thiserror::Error;

/// Result alias for read-cycle operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Why a read cycle produced no snapshot.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Sensor unavailable: {0}")]
    SensorUnavailable(#[source] HardwareError),

    #[error("Invalid reading: {0}")]
    InvalidReading(#[source] HardwareError),

    #[error("Insufficient valid samples: need {required}, got {got}")]
    InsufficientSamples {
        got: usize,
        required: usize,
    },

    #[error("Division by zero in red/IR ratio")]
    DivisionByZero,

    #[error("A read cycle is already in progress")]
    Busy,
}

impl MonitorError {
    /// Classify a failed environment read after retries.
    pub fn from_environment(err: HardwareError) -> Self {
        if err.is_null_reading() {
            Self::InvalidReading(err)
        } else {
            Self::SensorUnavailable(err)
        }
    }

    /// Short machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SensorUnavailable(_) => "sensor_unavailable",
            Self::InvalidReading(_) => "invalid_reading",
            Self::InsufficientSamples { .. } => "insufficient_samples",
            Self::DivisionByZero => "division_by_zero",
            Self::Busy => "busy",
        }
    }
}

impl From<EstimationError> for MonitorError {
    fn from(err: EstimationError) -> Self {
        match err {
            EstimationError::InsufficientSamples { got, required } => {
                Self::InsufficientSamples { got, required }
            }
            EstimationError::DivisionByZero => Self::DivisionByZero,
        }
    }
}

/// Errors produced when loading or validating a [`MonitorConfig`].
///
/// [`MonitorConfig`]: crate::config::MonitorConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },

    /// The config file could not be read.
    #[error("Cannot read config file `{path}`: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("Cannot parse config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
