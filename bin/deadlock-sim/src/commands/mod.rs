// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod compare;
pub mod inspect;
pub mod run;

use std::path::{Path, PathBuf};

use simulator::SimulationConfig;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v` flags.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();
}

/// Reads the TOML config if one was given, else the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SimulationConfig> {
    match path {
        Some(path) => {
            let config = SimulationConfig::from_file(path)?;
            tracing::info!("loaded config from '{}'", path.display());
            Ok(config)
        }
        None => Ok(SimulationConfig::default()),
    }
}

/// Picks the scenario from the flag or the config file.
pub fn scenario_path(flag: Option<PathBuf>, config: &SimulationConfig) -> anyhow::Result<PathBuf> {
    flag.or_else(|| config.scenario_path.clone()).ok_or_else(|| {
        anyhow::anyhow!("no scenario given: pass --scenario or set scenario_path in the config")
    })
}

/// Prints the boxed title used by every subcommand.
pub fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║ {:^52} ║", title);
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}
