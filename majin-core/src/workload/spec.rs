//! Workload shape parameters

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Shape of a simulated workload
///
/// All values are in ticks (seconds) or requests per second. The workload is
/// immutable for the lifetime of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadSpec {
    /// Base amplitude of the rate curve
    #[serde(rename = "base_load", alias = "load")]
    pub load: f64,
    /// Per-tick additive drift
    pub trend: f64,
    /// Ticks per seasonal cycle; 0 gives a flat curve
    pub period: f64,
    /// Mean and standard deviation of the half-normal noise; 0 disables noise
    pub noise: f64,
    /// Bursts start with probability 1/burst_frequency per eligible tick; 0 disables bursts
    pub burst_frequency: f64,
    /// Rate multiplier while a burst is active
    pub burst_index: f64,
    /// Ticks a triggered burst stays active
    pub burst_duration: f64,
    /// Total ticks to run; 0 runs forever
    pub duration: f64,
}

impl Default for WorkloadSpec {
    fn default() -> Self {
        Self {
            load: 1.0,
            trend: 0.0,
            period: 60.0,
            noise: 0.0,
            burst_frequency: 0.0,
            burst_index: 1.0,
            burst_duration: 30.0,
            duration: 0.0,
        }
    }
}

impl WorkloadSpec {
    /// Spec with every term disabled and a flat `load`
    ///
    /// Convenient base for building specs field by field.
    pub fn flat(load: f64) -> Self {
        Self {
            load,
            trend: 0.0,
            period: 0.0,
            noise: 0.0,
            burst_frequency: 0.0,
            burst_index: 1.0,
            burst_duration: 0.0,
            duration: 0.0,
        }
    }

    /// Whether the simulation stops on its own
    pub fn is_bounded(&self) -> bool {
        self.duration != 0.0
    }

    /// Check the workload before handing it to a simulator
    ///
    /// The simulator never validates; callers that accept user input run
    /// this first so bad parameters surface before any load is offered.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("base_load", self.load),
            ("trend", self.trend),
            ("period", self.period),
            ("noise", self.noise),
            ("burst_frequency", self.burst_frequency),
            ("burst_index", self.burst_index),
            ("burst_duration", self.burst_duration),
            ("duration", self.duration),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Config(format!("{name} must be finite, got {value}")));
        }

        if self.noise < 0.0 {
            return Err(Error::Config(format!("noise must be >= 0, got {}", self.noise)));
        }
        if self.period < 0.0 {
            return Err(Error::Config(format!("period must be >= 0, got {}", self.period)));
        }
        if self.burst_frequency < 0.0 || (self.burst_frequency > 0.0 && self.burst_frequency < 1.0)
        {
            return Err(Error::Config(format!(
                "burst_frequency must be 0 or >= 1, got {}",
                self.burst_frequency
            )));
        }
        if self.burst_duration < 0.0 {
            return Err(Error::Config(format!(
                "burst_duration must be >= 0, got {}",
                self.burst_duration
            )));
        }
        if self.duration < 0.0 || self.duration.fract() != 0.0 {
            return Err(Error::Config(format!(
                "duration must be a whole number of seconds >= 0, got {}",
                self.duration
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let spec = WorkloadSpec::default();
        assert_eq!(spec.load, 1.0);
        assert_eq!(spec.period, 60.0);
        assert_eq!(spec.burst_index, 1.0);
        assert_eq!(spec.burst_duration, 30.0);
        assert!(!spec.is_bounded());
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            WorkloadSpec { noise: -1.0, ..WorkloadSpec::default() },
            WorkloadSpec { period: -5.0, ..WorkloadSpec::default() },
            WorkloadSpec { burst_frequency: 0.5, ..WorkloadSpec::default() },
            WorkloadSpec { burst_frequency: -2.0, ..WorkloadSpec::default() },
            WorkloadSpec { burst_duration: -1.0, ..WorkloadSpec::default() },
            WorkloadSpec { duration: 2.5, ..WorkloadSpec::default() },
            WorkloadSpec { duration: -10.0, ..WorkloadSpec::default() },
            WorkloadSpec { load: f64::NAN, ..WorkloadSpec::default() },
            WorkloadSpec { trend: f64::INFINITY, ..WorkloadSpec::default() },
        ];

        for spec in cases {
            assert!(
                matches!(spec.validate(), Err(Error::Config(_))),
                "expected {:?} to be rejected",
                spec
            );
        }
    }

    #[test]
    fn test_validate_accepts_negative_trend() {
        let spec = WorkloadSpec { trend: -3.0, duration: 10.0, ..WorkloadSpec::default() };
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let spec: WorkloadSpec = toml::from_str("base_load = 100\nnoise = 5.5\n").unwrap();
        assert_eq!(spec.load, 100.0);
        assert_eq!(spec.noise, 5.5);
        assert_eq!(spec.period, 60.0);
        assert_eq!(spec.burst_index, 1.0);
    }

    #[test]
    fn test_deserialize_load_alias() {
        let spec: WorkloadSpec = toml::from_str("load = 7\n").unwrap();
        assert_eq!(spec.load, 7.0);
    }

    #[test]
    fn test_deserialize_rejects_unknown_keys() {
        assert!(toml::from_str::<WorkloadSpec>("bursts = 3\n").is_err());
    }
}
