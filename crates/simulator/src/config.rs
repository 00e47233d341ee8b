// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Simulation configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! scenario_path = "scenarios/circular_wait.json"
//! policy = "detection_with_recovery"
//! detect_interval = 2
//! extra_steps = 5
//! max_steps = 100
//! recovery_method = "terminate"
//! verbose = false
//! ```

use std::path::{Path, PathBuf};

use deadlock_engine::{AllocationPolicy, RecoveryMethod};

use crate::SimulationError;

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulationConfig {
    /// Scenario file to load. Optional so a config file can be shared
    /// across scenarios given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_path: Option<PathBuf>,
    #[serde(default)]
    pub policy: AllocationPolicy,
    /// Run detection every N steps.
    #[serde(default = "default_detect_interval")]
    pub detect_interval: u32,
    /// Steps simulated past the last scheduled event.
    #[serde(default = "default_extra_steps")]
    pub extra_steps: u32,
    /// Hard cap on the number of steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u32>,
    #[serde(default)]
    pub recovery_method: RecoveryMethod,
    /// Log the full ledger tables after every step.
    #[serde(default)]
    pub verbose: bool,
}

fn default_detect_interval() -> u32 {
    1
}

fn default_extra_steps() -> u32 {
    5
}

impl SimulationConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SimulationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SimulationError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, SimulationError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| SimulationError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, SimulationError> {
        toml::to_string_pretty(self)
            .map_err(|e| SimulationError::Config(format!("TOML serialise error: {e}")))
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.detect_interval == 0 {
            return Err(SimulationError::Config(
                "detect_interval must be at least 1".into(),
            ));
        }
        if self.extra_steps == 0 {
            return Err(SimulationError::Config(
                "extra_steps must be at least 1 so the last scheduled step runs".into(),
            ));
        }
        if self.max_steps == Some(0) {
            return Err(SimulationError::Config("max_steps must be at least 1".into()));
        }
        Ok(())
    }

    /// Number of steps to simulate for a schedule whose last event is at
    /// `max_step`.
    pub fn step_budget(&self, max_step: u32) -> u32 {
        let budget = max_step.saturating_add(self.extra_steps);
        match self.max_steps {
            Some(cap) => budget.min(cap),
            None => budget,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scenario_path: None,
            policy: AllocationPolicy::Avoidance,
            detect_interval: default_detect_interval(),
            extra_steps: default_extra_steps(),
            max_steps: None,
            recovery_method: RecoveryMethod::Terminate,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = SimulationConfig::default();
        assert_eq!(c.policy, AllocationPolicy::Avoidance);
        assert_eq!(c.detect_interval, 1);
        assert_eq!(c.extra_steps, 5);
        assert_eq!(c.max_steps, None);
        assert!(!c.verbose);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
scenario_path = "scenarios/circular_wait.json"
policy = "detection_with_recovery"
detect_interval = 3
max_steps = 20
verbose = true
"#;
        let c = SimulationConfig::from_toml(toml).unwrap();
        assert_eq!(
            c.scenario_path,
            Some(PathBuf::from("scenarios/circular_wait.json"))
        );
        assert_eq!(c.policy, AllocationPolicy::DetectionWithRecovery);
        assert_eq!(c.detect_interval, 3);
        assert_eq!(c.extra_steps, 5);
        assert_eq!(c.max_steps, Some(20));
        assert_eq!(c.recovery_method, RecoveryMethod::Terminate);
        assert!(c.verbose);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(SimulationConfig::from_toml("").unwrap(), SimulationConfig::default());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = SimulationConfig {
            policy: AllocationPolicy::DetectionOnly,
            max_steps: Some(7),
            ..Default::default()
        };
        let back = SimulationConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(SimulationConfig::from_toml("policy = \"optimistic\"").is_err());
        assert!(SimulationConfig::from_toml("detect_interval = 0").is_err());
        assert!(SimulationConfig::from_toml("extra_steps = 0").is_err());
        assert!(SimulationConfig::from_toml("max_steps = 0").is_err());
    }

    #[test]
    fn test_step_budget() {
        let mut c = SimulationConfig::default();
        assert_eq!(c.step_budget(4), 9);
        c.max_steps = Some(3);
        assert_eq!(c.step_budget(4), 3);
        c.max_steps = Some(50);
        assert_eq!(c.step_budget(4), 9);
    }
}
