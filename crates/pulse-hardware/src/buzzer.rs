//! Piezo buzzer on a GPIO output.

use rppal::gpio::{Gpio, OutputPin};
use tracing::info;

use crate::error::HardwareError;
use crate::port::Actuator;

pub struct GpioBuzzer {
    pin: OutputPin,
}

impl GpioBuzzer {
    /// Claim `bcm` as an output, driven low.
    pub fn open(bcm: u8) -> Result<Self, HardwareError> {
        let map = |e: rppal::gpio::Error| HardwareError::Gpio {
            pin: bcm,
            message: e.to_string(),
        };
        let pin = Gpio::new().map_err(map)?.get(bcm).map_err(map)?.into_output_low();
        Ok(Self { pin })
    }
}

impl Actuator for GpioBuzzer {
    fn set_output(&mut self, active: bool) -> Result<(), HardwareError> {
        if active {
            self.pin.set_high();
            info!(pin = self.pin.pin(), "buzzer on");
        } else {
            self.pin.set_low();
            info!(pin = self.pin.pin(), "buzzer off");
        }
        Ok(())
    }
}
