//! Device ownership and start-up wiring.

use std::fmt;

use pulse_hardware::{
    Actuator, EnvironmentSensor, OpticalSensor, RetryingEnvironment, SimulatedBuzzer,
    SimulatedEnvironment, SimulatedOximeter, UnavailableDevice,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::MonitorConfig;

/// Where readings come from, reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorSource {
    Hardware,
    Simulated,
}

impl fmt::Display for SensorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hardware => "hardware",
            Self::Simulated => "simulated",
        })
    }
}

/// Every device a read cycle touches, owned in one place.
pub struct HardwareContext {
    pub optical: Box<dyn OpticalSensor>,
    pub environment: Box<dyn EnvironmentSensor>,
    pub actuator: Box<dyn Actuator>,
    pub source: SensorSource,
}

impl HardwareContext {
    pub fn new(
        optical: Box<dyn OpticalSensor>,
        environment: Box<dyn EnvironmentSensor>,
        actuator: Box<dyn Actuator>,
        source: SensorSource,
    ) -> Self {
        Self {
            optical,
            environment,
            actuator,
            source,
        }
    }

    /// Simulated devices seeded from the config.
    pub fn simulated(config: &MonitorConfig) -> Self {
        let seed = config.simulation_seed;
        info!(seed, "using simulated sensors");
        Self::new(
            Box::new(SimulatedOximeter::new(seed)),
            Box::new(RetryingEnvironment::new(
                SimulatedEnvironment::new(seed.wrapping_add(1)),
                config.environment_retry,
            )),
            Box::new(SimulatedBuzzer::new()),
            SensorSource::Simulated,
        )
    }

    /// Open the real devices. A device that fails to come up is replaced
    /// by an [`UnavailableDevice`] so the service still answers.
    #[cfg(feature = "rpi")]
    pub fn open(config: &MonitorConfig) -> Self {
        use pulse_hardware::buzzer::GpioBuzzer;
        use pulse_hardware::dht11::Dht11;
        use pulse_hardware::max30100::{Max30100, RppalI2cBus};
        use tracing::error;

        let hw = &config.hardware;

        let optical: Box<dyn OpticalSensor> = match RppalI2cBus::open(hw.i2c_bus, hw.max30100_address)
            .and_then(|bus| Max30100::new(bus, hw.max30100))
        {
            Ok(dev) => {
                info!(bus = hw.i2c_bus, address = hw.max30100_address, "MAX30100 initialised");
                Box::new(dev)
            }
            Err(e) => {
                error!(error = %e, "MAX30100 initialisation failed");
                Box::new(UnavailableDevice::new("MAX30100", e.to_string()))
            }
        };

        let environment: Box<dyn EnvironmentSensor> = match Dht11::open(hw.dht_pin) {
            Ok(dev) => {
                info!(pin = hw.dht_pin, "DHT11 initialised");
                Box::new(RetryingEnvironment::new(dev, config.environment_retry))
            }
            Err(e) => {
                error!(pin = hw.dht_pin, error = %e, "DHT11 initialisation failed");
                Box::new(UnavailableDevice::new("DHT11", e.to_string()))
            }
        };

        let actuator: Box<dyn Actuator> = match GpioBuzzer::open(hw.buzzer_pin) {
            Ok(dev) => {
                info!(pin = hw.buzzer_pin, "buzzer initialised (low)");
                Box::new(dev)
            }
            Err(e) => {
                error!(pin = hw.buzzer_pin, error = %e, "buzzer initialisation failed");
                Box::new(UnavailableDevice::new("buzzer", e.to_string()))
            }
        };

        Self::new(optical, environment, actuator, SensorSource::Hardware)
    }

    /// Without the `rpi` feature there is no peripheral access at all.
    #[cfg(not(feature = "rpi"))]
    pub fn open(_config: &MonitorConfig) -> Self {
        const REASON: &str = "built without the `rpi` feature";
        warn!("{REASON}; every read will return the fail-safe snapshot (use --simulate for test data)");
        Self::new(
            Box::new(UnavailableDevice::new("MAX30100", REASON)),
            Box::new(UnavailableDevice::new("DHT11", REASON)),
            Box::new(UnavailableDevice::new("buzzer", REASON)),
            SensorSource::Hardware,
        )
    }

    /// Simulated or real devices, as configured.
    pub fn from_config(config: &MonitorConfig) -> Self {
        if config.simulate {
            Self::simulated(config)
        } else {
            Self::open(config)
        }
    }

    /// Buzzer low and optical sensor powered down. Errors are logged.
    pub fn park(&mut self) {
        if let Err(e) = self.actuator.set_output(false) {
            warn!(error = %e, "could not drive buzzer low");
        }
        if let Err(e) = self.optical.shutdown() {
            warn!(error = %e, "could not shut down optical sensor");
        }
    }
}

impl fmt::Debug for HardwareContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareContext")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
