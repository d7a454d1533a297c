//! The read cycle.
//!
//! [`VitalsMonitor`] owns the [`HardwareContext`] behind a mutex. Each
//! cycle holds the lock from the first environment read until the buzzer
//! has been set, so two cycles never share a device.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use pulse_hardware::{acquire, AcquisitionPlan};
use pulse_vitals::{AlertPolicy, EstimationStrategy, SampleValidator};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::hardware::{HardwareContext, SensorSource};
use crate::snapshot::{Demographics, VitalsSnapshot};

/// What to do with a request that arrives while a cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyPolicy {
    /// Wait for the running cycle, then run a fresh one.
    #[default]
    Queue,
    /// Fail immediately with [`MonitorError::Busy`].
    Reject,
}

/// Counters exposed by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub failures: u64,
    pub in_flight: bool,
    pub last_error: Option<String>,
}

/// Runs read cycles against one set of devices.
pub struct VitalsMonitor {
    hardware: Mutex<HardwareContext>,
    source: SensorSource,
    plan: AcquisitionPlan,
    validator: SampleValidator,
    strategy: EstimationStrategy,
    alert_policy: AlertPolicy,
    demographics: Demographics,
    cycles: AtomicU64,
    failures: AtomicU64,
    in_flight: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl VitalsMonitor {
    pub fn new(hardware: HardwareContext, config: &MonitorConfig) -> Self {
        Self {
            source: hardware.source,
            hardware: Mutex::new(hardware),
            plan: config.acquisition.plan,
            validator: SampleValidator::new(config.acquisition.validity_threshold)
                .with_channels(config.strategy.screened_channels()),
            strategy: config.strategy,
            alert_policy: config.alert_policy,
            demographics: config.demographics,
            cycles: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    pub fn source(&self) -> SensorSource {
        self.source
    }

    pub fn strategy(&self) -> &EstimationStrategy {
        &self.strategy
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        self.alert_policy
    }

    pub fn stats(&self) -> CycleStats {
        CycleStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            last_error: self.last_error.lock().clone(),
        }
    }

    /// Run one cycle, waiting for the hardware if needed. Errors are
    /// returned as-is; the buzzer is only driven on success.
    pub fn run_cycle(&self) -> MonitorResult<VitalsSnapshot> {
        let mut hw = self.hardware.lock();
        self.cycle_locked(&mut hw)
    }

    /// Like [`run_cycle`](Self::run_cycle) but fails with
    /// [`MonitorError::Busy`] instead of waiting.
    pub fn try_run_cycle(&self) -> MonitorResult<VitalsSnapshot> {
        let mut hw = self.hardware.try_lock().ok_or(MonitorError::Busy)?;
        self.cycle_locked(&mut hw)
    }

    /// Snapshot for presentation.
    ///
    /// Any cycle failure is logged, the buzzer is driven high and the
    /// fail-safe snapshot is returned. The only error left is
    /// [`MonitorError::Busy`] under [`BusyPolicy::Reject`].
    pub fn read_snapshot(&self, busy: BusyPolicy) -> MonitorResult<VitalsSnapshot> {
        let mut hw = match busy {
            BusyPolicy::Queue => self.hardware.lock(),
            BusyPolicy::Reject => match self.hardware.try_lock() {
                Some(guard) => guard,
                None => {
                    warn!("read requested while a cycle is in progress; rejecting");
                    return Err(MonitorError::Busy);
                }
            },
        };

        match self.cycle_locked(&mut hw) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                *self.last_error.lock() = Some(e.to_string());
                error!(kind = e.kind(), error = %e, "read cycle failed; serving fail-safe snapshot");
                drive_actuator(&mut hw, true);
                Ok(VitalsSnapshot::fail_safe(&self.demographics))
            }
        }
    }

    /// Buzzer low, optical sensor off. Waits for a running cycle.
    pub fn shutdown(&self) {
        let mut hw = self.hardware.lock();
        hw.park();
        info!("hardware parked");
    }

    fn cycle_locked(&self, hw: &mut HardwareContext) -> MonitorResult<VitalsSnapshot> {
        self.in_flight.store(true, Ordering::Relaxed);
        let started = Instant::now();
        let result = self.cycle_steps(hw);
        self.in_flight.store(false, Ordering::Relaxed);
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(cycle, elapsed_ms = started.elapsed().as_millis() as u64, ok = result.is_ok(), "cycle finished");
        result
    }

    fn cycle_steps(&self, hw: &mut HardwareContext) -> MonitorResult<VitalsSnapshot> {
        let environment = hw
            .environment
            .read_environment()
            .map_err(MonitorError::from_environment)?;
        info!(
            temperature = environment.temperature,
            humidity = environment.humidity,
            "environment read"
        );

        let window =
            acquire(hw.optical.as_mut(), &self.plan).map_err(MonitorError::SensorUnavailable)?;
        let total = window.len();
        let (valid, count) = self.validator.validate(window);
        info!(total, valid = count, "optical samples screened");

        let estimate = self.strategy.estimate(&valid)?;
        info!(
            strategy = self.strategy.name(),
            heart_rate = estimate.heart_rate,
            spo2 = estimate.spo2,
            "vitals estimated"
        );

        let violations =
            self.alert_policy
                .violations(estimate.heart_rate, estimate.spo2, environment.temperature);
        for v in &violations {
            warn!(vital = %v.vital, value = v.value, min = v.min, max = v.max, "out of range");
        }
        let alert = !violations.is_empty();
        info!(alert, policy = self.alert_policy.name(), "range check");

        drive_actuator(hw, alert);

        Ok(VitalsSnapshot::assemble(
            &estimate,
            &environment,
            alert,
            &self.demographics,
        ))
    }
}

/// Set the buzzer; failures are logged and never abort the cycle.
fn drive_actuator(hw: &mut HardwareContext, active: bool) {
    if let Err(e) = hw.actuator.set_output(active) {
        warn!(active, error = %e, "buzzer update failed");
    }
}
