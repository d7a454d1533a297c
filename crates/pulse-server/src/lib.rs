//! Pulse monitor service.
//!
//! Wires the estimation core (`pulse-vitals`) to the device adapters
//! (`pulse-hardware`) and serves the result over HTTP.
//!
//! A request triggers one read cycle in [`VitalsMonitor`]:
//!
//! ```text
//! environment read (retried) -> acquire window -> validate -> estimate
//!     -> range check -> buzzer -> VitalsSnapshot
//! ```
//!
//! Cycles are serialized by the lock around the [`HardwareContext`]. Any
//! failure inside a cycle yields the fail-safe snapshot with the alert
//! raised.

pub mod api;
pub mod config;
pub mod error;
pub mod hardware;
pub mod monitor;
pub mod snapshot;

pub use config::MonitorConfig;
pub use error::{ConfigError, MonitorError, MonitorResult};
pub use hardware::{HardwareContext, SensorSource};
pub use monitor::{BusyPolicy, CycleStats, VitalsMonitor};
pub use snapshot::{Demographics, ExerciseFlag, VitalsSnapshot};
