//! DHT11 temperature/humidity sensor.
//!
//! Single-wire protocol: the host pulls the line low for at least 18 ms,
//! the sensor answers with an 80 µs low / 80 µs high preamble, then sends
//! 40 bits. Every bit starts with ~50 µs low; the following high pulse is
//! ~27 µs for a 0 and ~70 µs for a 1.
//!
//! Frame layout (5 bytes): humidity integer, humidity decimal, temperature
//! integer, temperature decimal (bit 7 = below zero), checksum.

use pulse_vitals::EnvironmentReading;

use crate::error::HardwareError;

const DEVICE: &str = "DHT11";

/// High pulses longer than this (µs) encode a 1.
pub const ONE_THRESHOLD_US: u32 = 50;

/// Low byte of the sum of the four payload bytes.
pub fn checksum(frame: &[u8; 5]) -> u8 {
    frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Decode one 5-byte frame.
///
/// A frame with zero humidity is treated as no reading: the DHT11 cannot
/// report below 20 %RH and an idle line decodes to all zeros.
pub fn decode_frame(frame: &[u8; 5]) -> Result<EnvironmentReading, HardwareError> {
    let computed = checksum(frame);
    if computed != frame[4] {
        return Err(HardwareError::Checksum {
            computed,
            expected: frame[4],
        });
    }
    if frame[0] == 0 && frame[1] == 0 {
        return Err(HardwareError::NoReading { device: DEVICE });
    }

    let humidity = f64::from(frame[0]) + f64::from(frame[1]) / 10.0;
    let magnitude = f64::from(frame[2]) + f64::from(frame[3] & 0x7F) / 10.0;
    let temperature = if frame[3] & 0x80 != 0 { -magnitude } else { magnitude };

    Ok(EnvironmentReading {
        temperature,
        humidity,
    })
}

/// Pack the last 40 high-pulse widths (µs) into a frame, MSB first.
pub fn bits_to_frame(high_pulses_us: &[u32]) -> Result<[u8; 5], HardwareError> {
    if high_pulses_us.len() < 40 {
        return Err(HardwareError::NoReading { device: DEVICE });
    }
    let bits = &high_pulses_us[high_pulses_us.len() - 40..];
    let mut frame = [0u8; 5];
    for (i, &width) in bits.iter().enumerate() {
        if width > ONE_THRESHOLD_US {
            frame[i / 8] |= 0x80 >> (i % 8);
        }
    }
    Ok(frame)
}

#[cfg(feature = "rpi")]
pub use hw::Dht11;

#[cfg(feature = "rpi")]
mod hw {
    use std::thread;
    use std::time::{Duration, Instant};

    use pulse_vitals::EnvironmentReading;
    use rppal::gpio::{Gpio, IoPin, Level, Mode};
    use tracing::debug;

    use super::{bits_to_frame, decode_frame, DEVICE};
    use crate::error::HardwareError;
    use crate::port::EnvironmentSensor;

    /// Bit-banged DHT11 on one BCM pin.
    pub struct Dht11 {
        pin: IoPin,
        bcm: u8,
    }

    impl Dht11 {
        pub fn open(bcm: u8) -> Result<Self, HardwareError> {
            let gpio = Gpio::new().map_err(|e| HardwareError::Gpio {
                pin: bcm,
                message: e.to_string(),
            })?;
            let pin = gpio
                .get(bcm)
                .map_err(|e| HardwareError::Gpio {
                    pin: bcm,
                    message: e.to_string(),
                })?
                .into_io(Mode::Output);
            Ok(Self { pin, bcm })
        }

        fn wait_for(&self, level: Level, timeout: Duration) -> Result<Duration, HardwareError> {
            let start = Instant::now();
            while self.pin.read() != level {
                if start.elapsed() > timeout {
                    return Err(HardwareError::NoReading { device: DEVICE });
                }
            }
            Ok(start.elapsed())
        }

        fn read_pulses(&mut self) -> Result<Vec<u32>, HardwareError> {
            self.pin.set_mode(Mode::Output);
            self.pin.set_high();
            thread::sleep(Duration::from_millis(1));
            self.pin.set_low();
            thread::sleep(Duration::from_millis(18));
            self.pin.set_high();
            self.pin.set_mode(Mode::Input);

            // Preamble: low 80 µs, high 80 µs.
            let short = Duration::from_micros(200);
            self.wait_for(Level::Low, short)
                .map_err(|_| HardwareError::Timeout { what: "DHT11 response" })?;
            self.wait_for(Level::High, short)?;
            self.wait_for(Level::Low, short)?;

            let mut pulses = Vec::with_capacity(40);
            for _ in 0..40 {
                self.wait_for(Level::High, Duration::from_micros(100))?;
                let width = self.wait_for(Level::Low, Duration::from_micros(120))?;
                pulses.push(width.as_micros() as u32);
            }
            Ok(pulses)
        }
    }

    impl EnvironmentSensor for Dht11 {
        fn read_environment(&mut self) -> Result<EnvironmentReading, HardwareError> {
            let pulses = self.read_pulses()?;
            let frame = bits_to_frame(&pulses)?;
            debug!(pin = self.bcm, frame = ?frame, "DHT11 frame");
            decode_frame(&frame)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn framed(payload: [u8; 4]) -> [u8; 5] {
        let mut f = [payload[0], payload[1], payload[2], payload[3], 0];
        f[4] = checksum(&f);
        f
    }

    #[test]
    fn decodes_typical_frame() {
        let r = decode_frame(&framed([45, 0, 36, 8])).unwrap();
        assert_relative_eq!(r.humidity, 45.0);
        assert_relative_eq!(r.temperature, 36.8);
    }

    #[test]
    fn negative_temperature() {
        let r = decode_frame(&framed([60, 0, 2, 0x85])).unwrap();
        assert_relative_eq!(r.temperature, -2.5);
    }

    #[test]
    fn checksum_wraps() {
        assert_eq!(checksum(&[200, 100, 0, 0, 0]), 44);
    }

    #[test]
    fn bad_checksum_is_null_reading() {
        let err = decode_frame(&[45, 0, 36, 8, 0]).unwrap_err();
        assert!(matches!(err, HardwareError::Checksum { computed: 89, expected: 0 }));
        assert!(err.is_null_reading());
    }

    #[test]
    fn idle_line_is_no_reading() {
        assert!(matches!(decode_frame(&[0; 5]), Err(HardwareError::NoReading { .. })));
    }

    #[test]
    fn pulse_widths_to_frame() {
        // 45 %RH, 36.0 C, checksum 0x51
        let byte = |b: u8| (0..8).map(move |i| if b & (0x80 >> i) != 0 { 70 } else { 27 });
        let mut pulses: Vec<u32> = vec![80]; // preamble high, ignored
        for b in [0x2D, 0, 0x24, 0x00, 0x51] {
            pulses.extend(byte(b));
        }
        let frame = bits_to_frame(&pulses).unwrap();
        assert_eq!(frame, [0x2D, 0, 0x24, 0, 0x51]);
        let r = decode_frame(&frame).unwrap();
        assert_relative_eq!(r.humidity, 45.0);
        assert_relative_eq!(r.temperature, 36.0);
    }

    #[test]
    fn short_pulse_train_is_no_reading() {
        assert!(bits_to_frame(&[70; 39]).is_err());
    }
}
