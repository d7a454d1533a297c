//! MAX30100 pulse oximeter: register map, configuration codec and driver.
//!
//! The chip samples red and IR LED reflections into a 16-entry FIFO. Each
//! entry is four bytes, IR first, both big-endian. The driver only needs
//! a byte-level [`RegisterBus`]; the `rppal` implementation is behind the
//! `rpi` feature.

use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::HardwareError;
use crate::port::OpticalSensor;

const DEVICE: &str = "MAX30100";

/// Fixed 7-bit I2C address.
pub const I2C_ADDRESS: u16 = 0x57;

/// Value of [`reg::PART_ID`] on a genuine part.
pub const EXPECTED_PART_ID: u8 = 0x11;

/// FIFO depth in samples; pointers wrap modulo this.
pub const FIFO_DEPTH: u8 = 16;

/// How long `read_one` waits for a fresh FIFO entry.
pub const FIFO_WAIT: Duration = Duration::from_millis(50);

/// Register addresses.
pub mod reg {
    pub const INTERRUPT_STATUS: u8 = 0x00;
    pub const FIFO_WR_PTR: u8 = 0x02;
    pub const OVF_COUNTER: u8 = 0x03;
    pub const FIFO_RD_PTR: u8 = 0x04;
    pub const FIFO_DATA: u8 = 0x05;
    pub const MODE_CONFIG: u8 = 0x06;
    pub const SPO2_CONFIG: u8 = 0x07;
    pub const LED_CONFIG: u8 = 0x09;
    pub const PART_ID: u8 = 0xFF;
}

/// MODE_CONFIG bits.
pub const MODE_SHUTDOWN: u8 = 0x80;
pub const MODE_RESET: u8 = 0x40;
/// SPO2_CONFIG high-resolution (16-bit ADC) bit.
pub const SPO2_HI_RES: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// IR only.
    HeartRate,
    /// Red and IR.
    Spo2,
}

impl Mode {
    pub fn bits(self) -> u8 {
        match self {
            Self::HeartRate => 0x02,
            Self::Spo2 => 0x03,
        }
    }
}

/// Supported sample rates in Hz, indexed by register code.
pub const SAMPLE_RATES_HZ: [u16; 8] = [50, 100, 167, 200, 400, 600, 800, 1000];

/// Supported LED pulse widths in µs, indexed by register code.
pub const PULSE_WIDTHS_US: [u16; 4] = [200, 400, 800, 1600];

/// LED drive currents in mA, indexed by the 4-bit register code.
pub const LED_CURRENTS_MA: [f64; 16] = [
    0.0, 4.4, 7.6, 11.0, 14.2, 17.4, 20.8, 24.0, 27.1, 30.6, 33.8, 37.0, 40.2, 43.6, 46.8, 50.0,
];

/// Chip configuration applied on enable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Max30100Config {
    pub mode: Mode,
    pub sample_rate_hz: u16,
    pub pulse_width_us: u16,
    pub red_current_ma: f64,
    pub ir_current_ma: f64,
    pub high_resolution: bool,
}

impl Default for Max30100Config {
    /// SpO2 mode, 100 Hz, 1600 µs pulses, 11 mA on both LEDs.
    fn default() -> Self {
        Self {
            mode: Mode::Spo2,
            sample_rate_hz: 100,
            pulse_width_us: 1600,
            red_current_ma: 11.0,
            ir_current_ma: 11.0,
            high_resolution: true,
        }
    }
}

impl Max30100Config {
    /// MODE_CONFIG value for running (shutdown bit clear).
    pub fn mode_register(&self) -> u8 {
        self.mode.bits()
    }

    /// SPO2_CONFIG value. Unsupported rates and widths snap to the
    /// nearest supported one.
    pub fn spo2_register(&self) -> u8 {
        let rate = nearest_index(&SAMPLE_RATES_HZ, self.sample_rate_hz);
        let width = nearest_index(&PULSE_WIDTHS_US, self.pulse_width_us);
        let hi_res = if self.high_resolution { SPO2_HI_RES } else { 0 };
        hi_res | (rate << 2) | width
    }

    /// LED_CONFIG value: red current in the high nibble, IR in the low.
    pub fn led_register(&self) -> u8 {
        (led_current_code(self.red_current_ma) << 4) | led_current_code(self.ir_current_ma)
    }
}

fn nearest_index(table: &[u16], value: u16) -> u8 {
    let (idx, _) = table
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| v.abs_diff(value))
        .unwrap_or((0, &0));
    idx as u8
}

/// 4-bit code for the supported current closest to `ma`.
pub fn led_current_code(ma: f64) -> u8 {
    let mut best = 0;
    for (code, &level) in LED_CURRENTS_MA.iter().enumerate() {
        if (level - ma).abs() < (LED_CURRENTS_MA[best] - ma).abs() {
            best = code;
        }
    }
    best as u8
}

/// Unread FIFO entries given the write/read pointers and overflow counter.
///
/// Equal pointers mean empty, unless the overflow counter shows the FIFO
/// filled up and wrapped.
pub fn fifo_pending(write_ptr: u8, read_ptr: u8, overflow: u8) -> u8 {
    let pending = write_ptr.wrapping_sub(read_ptr) % FIFO_DEPTH;
    if pending == 0 && overflow != 0 {
        FIFO_DEPTH
    } else {
        pending
    }
}

/// Split one FIFO entry into `(red, ir)`.
pub fn decode_fifo_sample(bytes: [u8; 4]) -> (u32, u32) {
    let ir = u32::from(u16::from_be_bytes([bytes[0], bytes[1]]));
    let red = u32::from(u16::from_be_bytes([bytes[2], bytes[3]]));
    (red, ir)
}

/// Byte-level register access.
pub trait RegisterBus: Send {
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), HardwareError>;
    fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), HardwareError>;

    fn read_register(&mut self, register: u8) -> Result<u8, HardwareError> {
        let mut buf = [0u8; 1];
        self.read_registers(register, &mut buf)?;
        Ok(buf[0])
    }
}

/// MAX30100 driver over any [`RegisterBus`].
pub struct Max30100<B> {
    bus: B,
    config: Max30100Config,
    enabled: bool,
}

impl<B: RegisterBus> Max30100<B> {
    /// Probe the part id, reset the chip and leave it shut down.
    pub fn new(mut bus: B, config: Max30100Config) -> Result<Self, HardwareError> {
        let part = bus.read_register(reg::PART_ID)?;
        if part != EXPECTED_PART_ID {
            return Err(HardwareError::UnexpectedPartId {
                expected: EXPECTED_PART_ID,
                got: part,
            });
        }
        bus.write_register(reg::MODE_CONFIG, MODE_RESET)?;
        bus.write_register(reg::MODE_CONFIG, MODE_SHUTDOWN | config.mode_register())?;
        info!(
            spo2_config = %format!("{:#04x}", config.spo2_register()),
            led_config = %format!("{:#04x}", config.led_register()),
            "MAX30100 detected"
        );
        Ok(Self {
            bus,
            config,
            enabled: false,
        })
    }

    pub fn config(&self) -> &Max30100Config {
        &self.config
    }

    fn pending_samples(&mut self) -> Result<u8, HardwareError> {
        let write_ptr = self.bus.read_register(reg::FIFO_WR_PTR)?;
        let overflow = self.bus.read_register(reg::OVF_COUNTER)?;
        let read_ptr = self.bus.read_register(reg::FIFO_RD_PTR)?;
        Ok(fifo_pending(write_ptr, read_ptr, overflow))
    }

    /// Poll until the FIFO holds an unread entry or [`FIFO_WAIT`] passes.
    fn wait_for_sample(&mut self) -> Result<(), HardwareError> {
        let start = Instant::now();
        loop {
            if self.pending_samples()? > 0 {
                return Ok(());
            }
            if start.elapsed() >= FIFO_WAIT {
                debug!("MAX30100 FIFO empty");
                return Err(HardwareError::NoReading { device: DEVICE });
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn clear_fifo(&mut self) -> Result<(), HardwareError> {
        self.bus.write_register(reg::FIFO_WR_PTR, 0)?;
        self.bus.write_register(reg::OVF_COUNTER, 0)?;
        self.bus.write_register(reg::FIFO_RD_PTR, 0)
    }
}

impl<B: RegisterBus> OpticalSensor for Max30100<B> {
    fn enable(&mut self) -> Result<(), HardwareError> {
        self.bus.write_register(reg::SPO2_CONFIG, self.config.spo2_register())?;
        self.bus.write_register(reg::LED_CONFIG, self.config.led_register())?;
        self.clear_fifo()?;
        self.bus.write_register(reg::MODE_CONFIG, self.config.mode_register())?;
        self.enabled = true;
        Ok(())
    }

    fn read_one(&mut self) -> Result<(u32, u32), HardwareError> {
        if !self.enabled {
            return Err(HardwareError::NotInitialized { device: DEVICE });
        }
        self.wait_for_sample()?;
        let mut buf = [0u8; 4];
        self.bus.read_registers(reg::FIFO_DATA, &mut buf)?;
        let (red, ir) = decode_fifo_sample(buf);
        debug!(red, ir, "MAX30100 sample");
        Ok((red, ir))
    }

    fn shutdown(&mut self) -> Result<(), HardwareError> {
        let mode = self.bus.read_register(reg::MODE_CONFIG)?;
        self.bus.write_register(reg::MODE_CONFIG, mode | MODE_SHUTDOWN)?;
        self.enabled = false;
        Ok(())
    }
}

/// `rppal` I2C bus bound to one slave address.
#[cfg(feature = "rpi")]
pub struct RppalI2cBus {
    i2c: rppal::i2c::I2c,
}

#[cfg(feature = "rpi")]
impl RppalI2cBus {
    pub fn open(bus: u8, address: u16) -> Result<Self, HardwareError> {
        let map = |e: rppal::i2c::Error| HardwareError::I2c {
            device: DEVICE,
            register: 0,
            message: e.to_string(),
        };
        let mut i2c = rppal::i2c::I2c::with_bus(bus).map_err(map)?;
        i2c.set_slave_address(address).map_err(map)?;
        Ok(Self { i2c })
    }
}

#[cfg(feature = "rpi")]
impl RegisterBus for RppalI2cBus {
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), HardwareError> {
        self.i2c
            .write(&[register, value])
            .map(|_| ())
            .map_err(|e| HardwareError::I2c {
                device: DEVICE,
                register,
                message: e.to_string(),
            })
    }

    fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), HardwareError> {
        self.i2c
            .write_read(&[register], buf)
            .map_err(|e| HardwareError::I2c {
                device: DEVICE,
                register,
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Register file with a scripted FIFO.
    struct FakeBus {
        regs: [u8; 256],
        fifo: VecDeque<[u8; 4]>,
        writes: Vec<(u8, u8)>,
    }

    impl FakeBus {
        fn new(part_id: u8) -> Self {
            let mut regs = [0u8; 256];
            regs[reg::PART_ID as usize] = part_id;
            Self {
                regs,
                fifo: VecDeque::new(),
                writes: Vec::new(),
            }
        }

        /// Chip side: append a sample and advance the write pointer.
        fn push_sample(&mut self, entry: [u8; 4]) {
            self.fifo.push_back(entry);
            let wr = &mut self.regs[reg::FIFO_WR_PTR as usize];
            *wr = (*wr + 1) % FIFO_DEPTH;
        }
    }

    impl RegisterBus for FakeBus {
        fn write_register(&mut self, register: u8, value: u8) -> Result<(), HardwareError> {
            self.regs[register as usize] = value;
            self.writes.push((register, value));
            Ok(())
        }

        fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), HardwareError> {
            if register == reg::FIFO_DATA {
                // An empty FIFO keeps returning the last entry, like the chip.
                let entry = self.fifo.pop_front().unwrap_or([0xAA; 4]);
                buf.copy_from_slice(&entry);
                let rd = &mut self.regs[reg::FIFO_RD_PTR as usize];
                *rd = (*rd + 1) % FIFO_DEPTH;
            } else {
                buf[0] = self.regs[register as usize];
            }
            Ok(())
        }
    }

    #[test]
    fn default_config_registers() {
        let cfg = Max30100Config::default();
        assert_eq!(cfg.mode_register(), 0x03);
        // hi-res | 100 Hz (code 1) << 2 | 1600 us (code 3)
        assert_eq!(cfg.spo2_register(), 0x40 | 0x04 | 0x03);
        // 11 mA is code 3 on both LEDs
        assert_eq!(cfg.led_register(), 0x33);
    }

    #[test]
    fn led_current_snaps_to_nearest() {
        assert_eq!(led_current_code(0.0), 0);
        assert_eq!(led_current_code(11.0), 3);
        assert_eq!(led_current_code(12.0), 3);
        assert_eq!(led_current_code(49.0), 15);
        assert_eq!(led_current_code(80.0), 15);
    }

    #[test]
    fn fifo_entry_is_ir_then_red() {
        assert_eq!(decode_fifo_sample([0x0F, 0xA0, 0x07, 0xD0]), (2000, 4000));
    }

    #[test]
    fn rejects_wrong_part() {
        let err = Max30100::new(FakeBus::new(0x15), Max30100Config::default()).err();
        assert!(matches!(err, Some(HardwareError::UnexpectedPartId { got: 0x15, .. })));
    }

    #[test]
    fn enable_read_shutdown_cycle() {
        let bus = FakeBus::new(EXPECTED_PART_ID);
        let mut dev = Max30100::new(bus, Max30100Config::default()).unwrap();

        assert!(matches!(dev.read_one(), Err(HardwareError::NotInitialized { .. })));

        dev.enable().unwrap();
        assert_eq!(dev.bus.regs[reg::MODE_CONFIG as usize], 0x03);
        assert_eq!(dev.bus.regs[reg::LED_CONFIG as usize], 0x33);
        dev.bus.push_sample([0x0F, 0xA0, 0x07, 0xD0]);
        assert_eq!(dev.read_one().unwrap(), (2000, 4000));

        dev.shutdown().unwrap();
        assert_eq!(dev.bus.regs[reg::MODE_CONFIG as usize], 0x83);
        assert!(dev.read_one().is_err());
    }

    #[test]
    fn empty_fifo_is_never_reread() {
        let mut dev =
            Max30100::new(FakeBus::new(EXPECTED_PART_ID), Max30100Config::default()).unwrap();
        dev.enable().unwrap();
        dev.bus.push_sample([0x0F, 0xA0, 0x07, 0xD0]);
        assert_eq!(dev.read_one().unwrap(), (2000, 4000));

        // Pointers are equal again: no second read of FIFO_DATA.
        let err = dev.read_one().unwrap_err();
        assert!(matches!(err, HardwareError::NoReading { device: "MAX30100" }));
        assert_eq!(dev.bus.regs[reg::FIFO_RD_PTR as usize], 1);
    }

    #[test]
    fn fifo_pending_counts_wrapped_pointers() {
        assert_eq!(fifo_pending(0, 0, 0), 0);
        assert_eq!(fifo_pending(5, 2, 0), 3);
        assert_eq!(fifo_pending(1, 14, 0), 3);
        assert_eq!(fifo_pending(7, 7, 2), FIFO_DEPTH);
    }

    #[test]
    fn construction_resets_then_parks_in_shutdown() {
        let dev = Max30100::new(FakeBus::new(EXPECTED_PART_ID), Max30100Config::default()).unwrap();
        assert_eq!(
            dev.bus.writes,
            vec![(reg::MODE_CONFIG, MODE_RESET), (reg::MODE_CONFIG, 0x83)]
        );
    }
}
