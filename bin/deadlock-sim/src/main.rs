// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # deadlock-sim
//!
//! Command-line interface for the deadlock simulator.
//!
//! ## Usage
//! ```bash
//! # Run one scenario under the Banker's algorithm
//! deadlock-sim run --scenario scenarios/circular_wait.json --policy avoidance
//!
//! # Same scenario, every policy, one table
//! deadlock-sim compare --scenario scenarios/circular_wait.json
//!
//! # Initial matrices plus safety and detection verdicts
//! deadlock-sim inspect --scenario scenarios/bankers_classic.json
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "deadlock-sim",
    about = "Deadlock avoidance, detection and recovery simulator",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file. Explicit flags take precedence.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario under one allocation policy.
    Run {
        /// Scenario JSON file. Falls back to `scenario_path` in the config.
        #[arg(short, long)]
        scenario: Option<std::path::PathBuf>,

        /// Policy: avoidance, detection_only, detection_with_recovery.
        #[arg(short, long)]
        policy: Option<String>,

        /// Run detection every N steps.
        #[arg(short = 'i', long)]
        detect_interval: Option<u32>,

        /// Hard cap on simulated steps.
        #[arg(short, long)]
        max_steps: Option<u32>,

        /// Recovery method: terminate or preempt.
        #[arg(short, long)]
        recovery: Option<String>,

        /// Print the full report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Run a scenario under several policies and compare the metrics.
    Compare {
        /// Scenario JSON file. Falls back to `scenario_path` in the config.
        #[arg(short, long)]
        scenario: Option<std::path::PathBuf>,

        /// Policies to compare (comma-separated).
        #[arg(long, default_value = "avoidance,detection_only,detection_with_recovery")]
        policies: String,
    },

    /// Inspect a scenario: initial matrices, safety and detection verdicts.
    Inspect {
        /// Scenario JSON file.
        #[arg(short, long)]
        scenario: std::path::PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            scenario,
            policy,
            detect_interval,
            max_steps,
            recovery,
            json,
        } => commands::run::execute(
            config,
            commands::run::Overrides {
                scenario,
                policy,
                detect_interval,
                max_steps,
                recovery,
                verbose_state: cli.verbose >= 2,
            },
            json,
        ),
        Commands::Compare { scenario, policies } => {
            commands::compare::execute(config, scenario, policies)
        }
        Commands::Inspect { scenario } => commands::inspect::execute(scenario),
    }
}
