//! Ports the read cycle drives. Adapters live in the sibling modules.
//!
//! All methods take `&mut self`: a device is owned by exactly one
//! hardware context and accessed under its lock.

use pulse_vitals::EnvironmentReading;

use crate::error::HardwareError;

/// Red/IR photodetector (MAX30100 class).
pub trait OpticalSensor: Send {
    /// Power up and start sampling.
    fn enable(&mut self) -> Result<(), HardwareError>;

    /// Take the next `(red, ir)` pair.
    fn read_one(&mut self) -> Result<(u32, u32), HardwareError>;

    /// Power down. Safe to call when already off.
    fn shutdown(&mut self) -> Result<(), HardwareError>;
}

/// Ambient temperature and humidity sensor. One attempt per call.
pub trait EnvironmentSensor: Send {
    fn read_environment(&mut self) -> Result<EnvironmentReading, HardwareError>;
}

/// Binary output such as a buzzer.
pub trait Actuator: Send {
    fn set_output(&mut self, active: bool) -> Result<(), HardwareError>;
}

/// Stand-in for a device that failed to initialise.
///
/// Every call fails with [`HardwareError::Unavailable`], so read cycles
/// fall back to the fail-safe snapshot instead of the process exiting.
#[derive(Debug, Clone)]
pub struct UnavailableDevice {
    device: &'static str,
    reason: String,
}

impl UnavailableDevice {
    pub fn new(device: &'static str, reason: impl Into<String>) -> Self {
        Self {
            device,
            reason: reason.into(),
        }
    }

    fn error(&self) -> HardwareError {
        HardwareError::Unavailable {
            device: self.device,
            reason: self.reason.clone(),
        }
    }
}

impl OpticalSensor for UnavailableDevice {
    fn enable(&mut self) -> Result<(), HardwareError> {
        Err(self.error())
    }

    fn read_one(&mut self) -> Result<(u32, u32), HardwareError> {
        Err(self.error())
    }

    fn shutdown(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }
}

impl EnvironmentSensor for UnavailableDevice {
    fn read_environment(&mut self) -> Result<EnvironmentReading, HardwareError> {
        Err(self.error())
    }
}

impl Actuator for UnavailableDevice {
    fn set_output(&mut self, _active: bool) -> Result<(), HardwareError> {
        Err(self.error())
    }
}
