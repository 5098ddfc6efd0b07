//! System configuration entities
//!
//! `SystemConfiguration` holds the versioned catalogs of allowed job types
//! and skills. `WeightsConfig` holds the versioned scoring weights with
//! exactly one active version at any time; weight sets are validated on
//! load and cached in-process.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::SchedulingError;

/// Versioned catalogs of allowed job types and skills
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfiguration {
    pub id: Uuid,
    pub version: u32,
    pub allowed_job_types: Vec<String>,
    pub allowed_skills: Vec<String>,
}

impl SystemConfiguration {
    pub fn new(version: u32, allowed_job_types: Vec<String>, allowed_skills: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            version,
            allowed_job_types,
            allowed_skills,
        }
    }

    pub fn is_job_type_allowed(&self, job_type: &str) -> bool {
        let wanted = job_type.trim().to_lowercase();
        self.allowed_job_types
            .iter()
            .any(|t| t.trim().to_lowercase() == wanted)
    }

    pub fn is_skill_allowed(&self, skill: &str) -> bool {
        let wanted = skill.trim().to_lowercase();
        self.allowed_skills
            .iter()
            .any(|s| s.trim().to_lowercase() == wanted)
    }
}

/// Rotation-boost settings inside a weights config
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RotationConfig {
    pub enabled: bool,
    /// Maximum additive boost, `[0, 20]`
    pub boost: f64,
    /// Utilization below which the boost applies, `(0, 1)`
    pub under_utilization_threshold: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            boost: 5.0,
            under_utilization_threshold: 0.5,
        }
    }
}

/// Versioned scoring weights; exactly one version is active at a time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightsConfig {
    pub version: u32,
    /// Weight of the availability factor, `[0, 1]`
    pub availability_weight: f64,
    /// Weight of the rating factor, `[0, 1]`
    pub rating_weight: f64,
    /// Weight of the distance factor, `[0, 1]`
    pub distance_weight: f64,
    /// Ordered tie-breaker names, informational
    #[serde(default)]
    pub tie_breakers: Vec<String>,
    #[serde(default)]
    pub rotation: RotationConfig,
    pub is_active: bool,
}

impl WeightsConfig {
    /// The stock weight set shipped with the scheduler
    pub fn default_active() -> Self {
        Self {
            version: 1,
            availability_weight: 0.5,
            rating_weight: 0.3,
            distance_weight: 0.2,
            tie_breakers: vec![
                "earliestStart".into(),
                "sameDayUtilization".into(),
                "nextLegTravel".into(),
            ],
            rotation: RotationConfig::default(),
            is_active: true,
        }
    }

    /// Validates ranges and the weight sum; failures are `InvalidConfig`
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if self.version < 1 {
            return Err(SchedulingError::InvalidConfig(
                "weights version must be >= 1".into(),
            ));
        }
        for (name, weight) in [
            ("availability", self.availability_weight),
            ("rating", self.rating_weight),
            ("distance", self.distance_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(SchedulingError::InvalidConfig(format!(
                    "{name} weight {weight} outside [0, 1]"
                )));
            }
        }
        let sum = self.availability_weight + self.rating_weight + self.distance_weight;
        if (sum - 1.0).abs() > 0.001 {
            return Err(SchedulingError::InvalidConfig(format!(
                "weights sum to {sum}, expected 1.0"
            )));
        }
        if !(0.0..=20.0).contains(&self.rotation.boost) {
            return Err(SchedulingError::InvalidConfig(format!(
                "rotation boost {} outside [0, 20]",
                self.rotation.boost
            )));
        }
        let threshold = self.rotation.under_utilization_threshold;
        if threshold <= 0.0 || threshold >= 1.0 {
            return Err(SchedulingError::InvalidConfig(format!(
                "rotation threshold {threshold} outside (0, 1)"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        WeightsConfig::default_active().validate().unwrap();
    }

    #[test]
    fn test_rejects_weight_outside_unit_interval() {
        let mut config = WeightsConfig::default_active();
        config.availability_weight = 1.2;
        config.rating_weight = -0.2;
        assert!(matches!(
            config.validate(),
            Err(SchedulingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let mut config = WeightsConfig::default_active();
        config.distance_weight = 0.4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_rotation_threshold() {
        let mut config = WeightsConfig::default_active();
        config.rotation.under_utilization_threshold = 1.0;
        assert!(config.validate().is_err());
        config.rotation.under_utilization_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_job_type_catalog_is_case_insensitive() {
        let config = SystemConfiguration::new(
            1,
            vec!["Flooring".into(), "HVAC".into()],
            vec!["flooring".into(), "hvac".into()],
        );
        assert!(config.is_job_type_allowed("flooring"));
        assert!(config.is_job_type_allowed("hvac"));
        assert!(!config.is_job_type_allowed("roofing"));
        assert!(config.is_skill_allowed("HVAC"));
    }
}
