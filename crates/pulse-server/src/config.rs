//! Service configuration.
//!
//! Loaded from a JSON file (`--config`), every section optional; CLI flags
//! override individual fields afterwards. All defaults reproduce the
//! reference deployment: ratio strategy on a 20-sample burst, tight alert
//! band, DHT11 on BCM 7, buzzer on BCM 18.

use std::path::Path;

use pulse_hardware::max30100::{Max30100Config, I2C_ADDRESS};
use pulse_hardware::{AcquisitionPlan, RetryPolicy};
use pulse_vitals::{AlertPolicy, EstimationStrategy, SampleValidator};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::monitor::BusyPolicy;
use crate::snapshot::Demographics;

/// How optical samples are collected and screened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub plan: AcquisitionPlan,
    /// Samples with either channel at or below this are discarded.
    pub validity_threshold: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            plan: AcquisitionPlan::burst(),
            validity_threshold: SampleValidator::DEFAULT_THRESHOLD,
        }
    }
}

/// Bus and pin assignment (BCM numbering).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub i2c_bus: u8,
    pub max30100_address: u16,
    pub max30100: Max30100Config,
    pub dht_pin: u8,
    pub buzzer_pin: u8,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            max30100_address: I2C_ADDRESS,
            max30100: Max30100Config::default(),
            dht_pin: 7,
            buzzer_pin: 18,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    pub acquisition: AcquisitionConfig,
    pub strategy: EstimationStrategy,
    pub alert_policy: AlertPolicy,
    /// Retry applied to each environment read.
    pub environment_retry: RetryPolicy,
    pub busy_policy: BusyPolicy,
    /// Replace every device with a simulated one.
    pub simulate: bool,
    /// Seed for the simulated devices.
    pub simulation_seed: u64,
    pub hardware: HardwareConfig,
    pub demographics: Demographics,
}

impl MonitorConfig {
    /// Load and validate a JSON config file.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: MonitorConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))
    }

    /// Switch strategy and move to the acquisition plan it was tuned on.
    #[must_use]
    pub fn with_strategy(mut self, strategy: EstimationStrategy) -> Self {
        self.acquisition.plan = AcquisitionPlan::recommended_for(&strategy);
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.acquisition.plan {
            AcquisitionPlan::Count { samples, .. } if samples == 0 => {
                return Err(ConfigError::invalid_value("acquisition.plan.samples", "must be > 0"));
            }
            AcquisitionPlan::Duration { window_ms, .. } if window_ms == 0 => {
                return Err(ConfigError::invalid_value("acquisition.plan.window_ms", "must be > 0"));
            }
            _ => {}
        }

        match self.strategy {
            EstimationStrategy::Ratio(r) if r.min_valid == 0 => {
                return Err(ConfigError::invalid_value("strategy.min_valid", "must be > 0"));
            }
            EstimationStrategy::PeakCount(p) => {
                if !(p.height_factor > 0.0 && p.height_factor <= 1.0) {
                    return Err(ConfigError::invalid_value(
                        "strategy.height_factor",
                        format!("must be in (0, 1], got {}", p.height_factor),
                    ));
                }
                if p.min_distance == 0 {
                    return Err(ConfigError::invalid_value("strategy.min_distance", "must be > 0"));
                }
            }
            _ => {}
        }

        if self.environment_retry.max_attempts == 0 {
            return Err(ConfigError::invalid_value(
                "environment_retry.max_attempts",
                "must be >= 1",
            ));
        }

        // BCM pins on the 40-pin header.
        let pins = [
            ("hardware.dht_pin", self.hardware.dht_pin),
            ("hardware.buzzer_pin", self.hardware.buzzer_pin),
        ];
        for (field, pin) in pins {
            if pin > 27 {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("BCM pin {pin} is not on the header"),
                ));
            }
        }
        if self.hardware.dht_pin == self.hardware.buzzer_pin {
            return Err(ConfigError::invalid_value(
                "hardware.buzzer_pin",
                "must differ from hardware.dht_pin",
            ));
        }

        if self.demographics.age > 150 {
            return Err(ConfigError::invalid_value("demographics.age", "must be <= 150"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_vitals::Spo2Source;

    #[test]
    fn defaults_validate() {
        let cfg = MonitorConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.acquisition.plan, AcquisitionPlan::burst());
        assert_eq!(cfg.acquisition.validity_threshold, 1000);
        assert_eq!(cfg.alert_policy, AlertPolicy::Tight);
        assert_eq!(cfg.environment_retry.max_attempts, 5);
        assert_eq!(cfg.hardware.buzzer_pin, 18);
        assert_eq!(cfg.demographics.age, 25);
        assert!(!cfg.simulate);
    }

    #[test]
    fn empty_json_is_default() {
        let cfg: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, MonitorConfig::default());
    }

    #[test]
    fn partial_json_overrides() {
        let cfg: MonitorConfig = serde_json::from_str(
            r#"{
                "strategy": {"kind": "peak_count", "spo2_source": "last_red_sample"},
                "alert_policy": "clinical",
                "busy_policy": "reject",
                "hardware": {"buzzer_pin": 23}
            }"#,
        )
        .unwrap();
        cfg.validate().unwrap();
        match cfg.strategy {
            EstimationStrategy::PeakCount(p) => assert_eq!(p.spo2_source, Spo2Source::LastRedSample),
            other => panic!("unexpected strategy {other}"),
        }
        assert_eq!(cfg.alert_policy, AlertPolicy::Clinical);
        assert_eq!(cfg.busy_policy, BusyPolicy::Reject);
        assert_eq!(cfg.hardware.buzzer_pin, 23);
        assert_eq!(cfg.hardware.dht_pin, 7);
    }

    #[test]
    fn with_strategy_switches_plan() {
        let cfg = MonitorConfig::default().with_strategy(EstimationStrategy::peak_count());
        assert_eq!(cfg.acquisition.plan, AcquisitionPlan::timed());
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = MonitorConfig::default();
        cfg.environment_retry.max_attempts = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { field: "environment_retry.max_attempts", .. })
        ));

        let mut cfg = MonitorConfig::default();
        cfg.hardware.buzzer_pin = cfg.hardware.dht_pin;
        assert!(cfg.validate().is_err());

        let mut cfg = MonitorConfig::default();
        cfg.acquisition.plan = AcquisitionPlan::Count { samples: 0, interval_ms: 100, settle_ms: 0 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir().join(format!("pulse-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("monitor.json");
        let cfg = MonitorConfig::default().with_strategy(EstimationStrategy::peak_count());
        std::fs::write(&path, cfg.to_json_pretty().unwrap()).unwrap();
        assert_eq!(MonitorConfig::from_json(&path).unwrap(), cfg);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_file_read_error() {
        let err = MonitorConfig::from_json(Path::new("/nonexistent/pulse.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
