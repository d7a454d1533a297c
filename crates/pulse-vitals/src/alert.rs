//! Range checks that decide whether a reading raises the alarm.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Vital checked by an [`AlertPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Vital {
    HeartRate,
    Spo2,
    Temperature,
}

impl fmt::Display for Vital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HeartRate => "heart_rate",
            Self::Spo2 => "spo2",
            Self::Temperature => "temperature",
        })
    }
}

/// A vital outside the policy's accepted band (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeViolation {
    pub vital: Vital,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} outside [{}, {}]", self.vital, self.value, self.min, self.max)
    }
}

/// Bounds applied to a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlertPolicy {
    /// Normal resting band: hr 60-100, SpO2 95-100, temp 36-37.5.
    #[default]
    Tight,
    /// Only clinically concerning values: hr outside 50-120, SpO2 below
    /// 90 or temperature above 38.
    Clinical,
}

impl AlertPolicy {
    /// `(min, max)` accepted for a vital, inclusive.
    #[must_use]
    pub fn bounds(&self, vital: Vital) -> (f64, f64) {
        match (self, vital) {
            (Self::Tight, Vital::HeartRate) => (60.0, 100.0),
            (Self::Tight, Vital::Spo2) => (95.0, 100.0),
            (Self::Tight, Vital::Temperature) => (36.0, 37.5),
            (Self::Clinical, Vital::HeartRate) => (50.0, 120.0),
            (Self::Clinical, Vital::Spo2) => (90.0, f64::INFINITY),
            (Self::Clinical, Vital::Temperature) => (f64::NEG_INFINITY, 38.0),
        }
    }

    /// Every vital outside its band. NaN is always out of range.
    #[must_use]
    pub fn violations(&self, heart_rate: f64, spo2: f64, temperature: f64) -> Vec<RangeViolation> {
        [
            (Vital::HeartRate, heart_rate),
            (Vital::Spo2, spo2),
            (Vital::Temperature, temperature),
        ]
        .into_iter()
        .filter_map(|(vital, value)| {
            let (min, max) = self.bounds(vital);
            let in_range = min <= value && value <= max;
            (!in_range).then_some(RangeViolation { vital, value, min, max })
        })
        .collect()
    }

    #[must_use]
    pub fn is_alert(&self, heart_rate: f64, spo2: f64, temperature: f64) -> bool {
        !self.violations(heart_rate, spo2, temperature).is_empty()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tight => "tight",
            Self::Clinical => "clinical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tight_normal_reading() {
        assert!(!AlertPolicy::Tight.is_alert(80.0, 98.0, 36.5));
    }

    #[test]
    fn tight_tachycardia() {
        assert!(AlertPolicy::Tight.is_alert(110.0, 98.0, 36.5));
    }

    #[test]
    fn tight_low_saturation() {
        let v = AlertPolicy::Tight.violations(80.0, 90.0, 36.5);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].vital, Vital::Spo2);
        assert!((v[0].min - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tight_bounds_are_inclusive() {
        assert!(!AlertPolicy::Tight.is_alert(60.0, 95.0, 36.0));
        assert!(!AlertPolicy::Tight.is_alert(100.0, 100.0, 37.5));
        assert!(AlertPolicy::Tight.is_alert(100.1, 100.0, 37.5));
    }

    #[test]
    fn zero_reading_alerts_under_both_policies() {
        assert!(AlertPolicy::Tight.is_alert(0.0, 0.0, 0.0));
        assert!(AlertPolicy::Clinical.is_alert(0.0, 0.0, 0.0));
    }

    #[test]
    fn clinical_tolerates_mild_deviation() {
        assert!(!AlertPolicy::Clinical.is_alert(110.0, 92.0, 37.9));
        assert!(AlertPolicy::Clinical.is_alert(110.0, 89.9, 37.0));
        assert!(AlertPolicy::Clinical.is_alert(80.0, 98.0, 38.1));
        assert!(AlertPolicy::Clinical.is_alert(49.0, 98.0, 37.0));
    }

    #[test]
    fn nan_is_out_of_range() {
        assert!(AlertPolicy::Clinical.is_alert(f64::NAN, 98.0, 37.0));
    }

    #[test]
    fn violation_display() {
        let v = AlertPolicy::Tight.violations(120.0, 98.0, 36.5);
        assert_eq!(v[0].to_string(), "heart_rate = 120 outside [60, 100]");
    }
}
