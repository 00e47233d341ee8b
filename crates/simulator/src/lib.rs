// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # simulator
//!
//! Drives a scenario through discrete steps under one allocation policy.
//!
//! The simulator takes:
//! - A validated scenario from `scenario` (initial [`resource_ledger::Ledger`]
//!   plus an [`scenario::EventSchedule`]).
//! - A [`SimulationConfig`] naming the policy, detection interval and step
//!   budget.
//!
//! and replays the schedule, routing requests through `deadlock-engine`,
//! while keeping an [`EventLog`] and [`SimulationMetrics`].
//!
//! # Step Order
//!
//! ```text
//! for step in 0..budget:
//!   1. scheduled events (pid order): request / release / finish
//!   2. retry parked requests (skipping pids that requested this step)
//!   3. detection (detection policies, every `detect_interval` steps)
//!        deadlock → halt  (detection_only)
//!                 → terminate victims, retry again  (detection_with_recovery)
//!   4. conservation check, metrics sample
//!   5. stop once every process is FINISHED or TERMINATED
//! ```
//!
//! # Type-State Pipeline
//! ```text
//! Simulation<Idle> → Simulation<Loaded> → SimulationReport
//! ```

mod compare;
mod config;
mod engine;
mod error;
mod events;
mod metrics;

pub use compare::{compare_policies, comparison_table, PolicyComparison};
pub use config::SimulationConfig;
pub use engine::{Idle, Loaded, Simulation, SimulationReport, SimulationState, StopReason};
pub use error::SimulationError;
pub use events::{EventKind, EventLog, SimulationEvent};
pub use metrics::{ProcessOutcome, SimulationMetrics};
