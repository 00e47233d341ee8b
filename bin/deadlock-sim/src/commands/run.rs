// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `deadlock-sim run` command: simulate one scenario under one policy.
//!
//! ```text
//! Simulation<Idle> → load_scenario → <Loaded> → run → SimulationReport
//! ```

use std::path::PathBuf;

use deadlock_engine::{AllocationPolicy, RecoveryMethod};
use simulator::{Simulation, SimulationConfig};

/// Flags that override the config file.
pub struct Overrides {
    pub scenario: Option<PathBuf>,
    pub policy: Option<String>,
    pub detect_interval: Option<u32>,
    pub max_steps: Option<u32>,
    pub recovery: Option<String>,
    pub verbose_state: bool,
}

pub fn execute(
    mut config: SimulationConfig,
    overrides: Overrides,
    json: bool,
) -> anyhow::Result<()> {
    config.scenario_path = Some(super::scenario_path(overrides.scenario, &config)?);
    if let Some(policy) = overrides.policy {
        config.policy = policy.parse::<AllocationPolicy>()?;
    }
    if let Some(interval) = overrides.detect_interval {
        config.detect_interval = interval;
    }
    if let Some(max) = overrides.max_steps {
        config.max_steps = Some(max);
    }
    if let Some(method) = overrides.recovery {
        config.recovery_method = method.parse::<RecoveryMethod>()?;
    }
    config.verbose |= overrides.verbose_state;
    config.validate()?;

    let report = Simulation::new(config.clone()).load_scenario()?.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    super::banner("deadlock-sim · Simulation Runner");

    println!("  Config:");
    if let Some(path) = &config.scenario_path {
        println!("   Scenario: {}", path.display());
    }
    if !report.description.is_empty() {
        println!("             {}", report.description);
    }
    println!("   Policy:   {}", config.policy);
    if config.policy.detects_deadlocks() {
        println!("   Detect:   every {} step(s)", config.detect_interval);
    }
    if config.policy == AllocationPolicy::DetectionWithRecovery {
        println!("   Recovery: {}", config.recovery_method);
    }
    println!();

    println!("  Event log:");
    for event in report.events.events() {
        println!("   {event}");
    }
    println!();

    println!("{}", report.metrics_report());
    Ok(())
}
