//! Error types for sensor and actuator access.

use thiserror::Error;

/// Errors raised by device adapters.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// The device was used before it was enabled.
    #[error("{device} not initialized")]
    NotInitialized {
        device: &'static str,
    },

    /// The device failed to come up at start-up and is out of service.
    #[error("{device} unavailable: {reason}")]
    Unavailable {
        device: &'static str,
        reason: String,
    },

    /// I2C transfer failed.
    #[error("I2C error on {device} (register {register:#04x}): {message}")]
    I2c {
        device: &'static str,
        register: u8,
        message: String,
    },

    /// GPIO setup or access failed.
    #[error("GPIO error on pin {pin}: {message}")]
    Gpio {
        pin: u8,
        message: String,
    },

    /// The device answered but produced no usable value.
    #[error("{device} returned no reading")]
    NoReading {
        device: &'static str,
    },

    /// Frame checksum does not match its payload.
    #[error("Checksum mismatch: computed {computed:#04x}, frame carries {expected:#04x}")]
    Checksum {
        computed: u8,
        expected: u8,
    },

    /// The device did not respond in time.
    #[error("Timeout waiting for {what}")]
    Timeout {
        what: &'static str,
    },

    /// The chip on the bus is not the one we expected.
    #[error("Unexpected part id: expected {expected:#04x}, got {got:#04x}")]
    UnexpectedPartId {
        expected: u8,
        got: u8,
    },
}

impl HardwareError {
    /// The device responded, but with nothing trustworthy.
    ///
    /// Retrying may help; exhausting retries on this kind means the
    /// reading is invalid rather than the sensor being gone.
    #[must_use]
    pub fn is_null_reading(&self) -> bool {
        matches!(self, Self::NoReading { .. } | Self::Checksum { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_reading_classification() {
        assert!(HardwareError::NoReading { device: "DHT11" }.is_null_reading());
        assert!(HardwareError::Checksum { computed: 1, expected: 2 }.is_null_reading());
        assert!(!HardwareError::Timeout { what: "response" }.is_null_reading());
        assert!(!HardwareError::Unavailable { device: "DHT11", reason: "gone".into() }.is_null_reading());
    }

    #[test]
    fn display_formats_hex() {
        let e = HardwareError::UnexpectedPartId { expected: 0x11, got: 0x15 };
        assert_eq!(e.to_string(), "Unexpected part id: expected 0x11, got 0x15");
    }
}
