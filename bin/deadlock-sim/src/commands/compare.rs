// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `deadlock-sim compare` command: one scenario, several policies.

use std::path::PathBuf;

use deadlock_engine::AllocationPolicy;
use scenario::ScenarioLoader;
use simulator::{compare_policies, comparison_table, SimulationConfig};

pub fn execute(
    config: SimulationConfig,
    scenario: Option<PathBuf>,
    policies: String,
) -> anyhow::Result<()> {
    let path = super::scenario_path(scenario, &config)?;
    let policies = policies
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<AllocationPolicy>)
        .collect::<Result<Vec<_>, _>>()?;
    if policies.is_empty() {
        anyhow::bail!("no policies to compare");
    }

    super::banner("deadlock-sim · Policy Comparison");

    let loaded = ScenarioLoader::load(&path).map_err(|e| {
        anyhow::anyhow!("failed to load scenario from '{}': {e}", path.display())
    })?;
    println!("  Scenario: {}", path.display());
    println!("  {}", loaded.summary());
    println!();

    let (ledger, schedule) = loaded.into_parts();
    let rows = compare_policies(&config, &ledger, &schedule, &policies)?;
    println!("{}", comparison_table(&rows));
    Ok(())
}
