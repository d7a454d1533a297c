//! Sensor hardware for the pulse monitor.
//!
//! The estimation core never talks to a device directly. It sees three
//! ports ([`OpticalSensor`], [`EnvironmentSensor`], [`Actuator`]) and
//! this crate supplies the adapters behind them:
//!
//! | Port | Raspberry Pi (`rpi` feature) | Simulation |
//! |------|------------------------------|------------|
//! | Optical | [`max30100::Max30100`] over `rppal` I2C | [`SimulatedOximeter`] |
//! | Environment | `dht11::Dht11` bit-banged on GPIO | [`SimulatedEnvironment`] |
//! | Actuator | `buzzer::GpioBuzzer` | [`SimulatedBuzzer`] |
//!
//! Register and frame codecs ([`max30100`], [`dht11`]) are pure and
//! compile everywhere; only the bus access is feature-gated.
//!
//! [`acquire`] collects one [`pulse_vitals::SampleWindow`] inside a
//! [`SensorSession`], which powers the optical sensor down on every exit
//! path. [`RetryingEnvironment`] wraps an environment sensor with a
//! bounded [`RetryPolicy`].

pub mod acquisition;
#[cfg(feature = "rpi")]
pub mod buzzer;
pub mod dht11;
pub mod error;
pub mod max30100;
pub mod port;
pub mod retry;
pub mod simulated;

pub use acquisition::{acquire, AcquisitionPlan, SensorSession};
pub use error::HardwareError;
pub use port::{Actuator, EnvironmentSensor, OpticalSensor, UnavailableDevice};
pub use retry::{RetryPolicy, RetryingEnvironment};
pub use simulated::{SimulatedBuzzer, SimulatedEnvironment, SimulatedOximeter};
