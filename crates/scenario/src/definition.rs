// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Scenario definition and its validation.
//!
//! # Type-State Pattern
//!
//! ```text
//! Scenario<Parsed>     — document decoded, nothing checked.
//!       │  .validate()
//!       ▼
//! Scenario<Validated>  — ledger and schedule built.
//! ```
//!
//! Each state carries its own payload, so a validated scenario cannot be
//! built without going through [`Scenario::validate`].

use std::collections::BTreeSet;
use std::fmt;

use resource_ledger::{Ledger, LedgerError, Process, ResourceType};

use crate::manifest::{EventSpec, ProcessSpec};
use crate::{EventSchedule, ScenarioError, ScenarioManifest, ScheduledAction, ScheduledEvent};

// ── Type-state markers ─────────────────────────────────────────────

/// State: document decoded but not validated.
#[derive(Debug, Clone)]
pub struct Parsed {
    manifest: ScenarioManifest,
}

/// State: ledger built and events scheduled.
#[derive(Debug, Clone)]
pub struct Validated {
    ledger: Ledger,
    schedule: EventSchedule,
}

/// Scenario states.
pub trait ScenarioState: fmt::Debug + Clone {}
impl ScenarioState for Parsed {}
impl ScenarioState for Validated {}

// ── Scenario ───────────────────────────────────────────────────────

/// A simulation scenario.
#[derive(Debug, Clone)]
pub struct Scenario<S: ScenarioState = Parsed> {
    description: String,
    state: S,
}

impl<S: ScenarioState> Scenario<S> {
    /// Free-text description; empty if the file has none.
    pub fn description(&self) -> &str {
        &self.description
    }
}

// ── Parsed state ───────────────────────────────────────────────────

impl Scenario<Parsed> {
    pub fn from_manifest(manifest: ScenarioManifest) -> Self {
        Self {
            description: manifest.description.clone(),
            state: Parsed { manifest },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let manifest: ScenarioManifest = serde_json::from_str(json)?;
        Ok(Self::from_manifest(manifest))
    }

    pub fn manifest(&self) -> &ScenarioManifest {
        &self.state.manifest
    }

    /// Checks the document and builds the ledger and schedule.
    ///
    /// # Checks
    /// - Resource `type_id`s and process pids are unique.
    /// - `max_demand` and `initial_allocation` have one entry per resource.
    /// - `initial_allocation <= max_demand` element-wise.
    /// - Initial allocations of each resource fit in its total.
    /// - Every event has a known type; request and release events name a
    ///   valid resource index and a positive amount.
    pub fn validate(self) -> Result<Scenario<Validated>, ScenarioError> {
        let manifest = self.state.manifest;

        let mut specs = manifest.resources;
        specs.sort_by_key(|r| r.type_id);
        for pair in specs.windows(2) {
            if pair[0].type_id == pair[1].type_id {
                return Err(ScenarioError::DuplicateResourceType(pair[0].type_id));
            }
        }
        let resources: Vec<ResourceType> = specs
            .iter()
            .map(|r| ResourceType::new(r.type_id, r.total_instances))
            .collect();
        let num_resources = resources.len();

        let mut pids = BTreeSet::new();
        let mut processes = Vec::with_capacity(manifest.processes.len());
        let mut schedule = EventSchedule::new();
        for spec in &manifest.processes {
            if !pids.insert(spec.pid) {
                return Err(ScenarioError::DuplicatePid(spec.pid));
            }
            processes.push(build_process(spec, num_resources)?);
            for event in scheduled_events(spec, num_resources)? {
                schedule.insert(event);
            }
        }

        let ledger = Ledger::new(resources, processes).map_err(|e| match e {
            LedgerError::Oversubscribed {
                resource,
                allocated,
                total,
            } => ScenarioError::OverAllocated {
                resource,
                allocated,
                total,
            },
            other => ScenarioError::Ledger(other),
        })?;

        tracing::info!(
            processes = ledger.num_processes(),
            resources = ledger.num_resources(),
            events = schedule.len(),
            "scenario validated"
        );
        Ok(Scenario {
            description: self.description,
            state: Validated { ledger, schedule },
        })
    }
}

fn build_process(spec: &ProcessSpec, num_resources: usize) -> Result<Process, ScenarioError> {
    if spec.max_demand.len() != num_resources {
        return Err(ScenarioError::LengthMismatch {
            pid: spec.pid,
            field: "max_demand",
            expected: num_resources,
            actual: spec.max_demand.len(),
        });
    }
    let allocation = spec
        .initial_allocation
        .clone()
        .unwrap_or_else(|| vec![0; num_resources]);
    if allocation.len() != num_resources {
        return Err(ScenarioError::LengthMismatch {
            pid: spec.pid,
            field: "initial_allocation",
            expected: num_resources,
            actual: allocation.len(),
        });
    }
    for (r, (&held, &max)) in allocation.iter().zip(&spec.max_demand).enumerate() {
        if held > max {
            return Err(ScenarioError::AllocationExceedsMax {
                pid: spec.pid,
                resource: r,
                allocation: held,
                max,
            });
        }
    }
    Ok(
        Process::new(spec.pid, spec.priority, spec.arrival_step, spec.max_demand.clone())
            .with_allocation(allocation)?,
    )
}

/// Converts and checks one process's events, sorted by step (stable).
fn scheduled_events(
    spec: &ProcessSpec,
    num_resources: usize,
) -> Result<Vec<ScheduledEvent>, ScenarioError> {
    let mut events = spec
        .effective_events()
        .iter()
        .map(|e| {
            Ok(ScheduledEvent {
                step: e.step,
                pid: spec.pid,
                action: convert_action(spec, e, num_resources)?,
            })
        })
        .collect::<Result<Vec<_>, ScenarioError>>()?;
    events.sort_by_key(|e| e.step);
    Ok(events)
}

fn convert_action(
    spec: &ProcessSpec,
    event: &EventSpec,
    num_resources: usize,
) -> Result<ScheduledAction, ScenarioError> {
    let invalid = |detail: String| ScenarioError::InvalidEvent {
        pid: spec.pid,
        detail,
    };
    let kind = event.kind.as_str();
    match kind {
        "finish" => Ok(ScheduledAction::Finish),
        "request" | "release" => {
            let resource = event
                .resource_type
                .ok_or_else(|| invalid(format!("{kind} event missing 'resource_type'")))?;
            let amount = event
                .amount
                .ok_or_else(|| invalid(format!("{kind} event missing 'amount'")))?;
            let resource = usize::try_from(resource)
                .ok()
                .filter(|&r| r < num_resources)
                .ok_or_else(|| invalid(format!("invalid resource_type {resource}")))?;
            let amount = u32::try_from(amount)
                .ok()
                .filter(|&a| a > 0)
                .ok_or_else(|| invalid(format!("{kind} amount must be positive, got {amount}")))?;
            Ok(if kind == "request" {
                ScheduledAction::Request { resource, amount }
            } else {
                ScheduledAction::Release { resource, amount }
            })
        }
        other => Err(invalid(format!("unknown event type '{other}'"))),
    }
}

// ── Validated state ────────────────────────────────────────────────

impl Scenario<Validated> {
    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn schedule(&self) -> &EventSchedule {
        &self.state.schedule
    }

    /// Hands over the initial ledger and the schedule.
    pub fn into_parts(self) -> (Ledger, EventSchedule) {
        (self.state.ledger, self.state.schedule)
    }

    /// One-line summary for logs and the CLI.
    pub fn summary(&self) -> String {
        let ledger = &self.state.ledger;
        let totals: Vec<String> = ledger
            .resources()
            .iter()
            .map(|r| format!("R{}={}", r.type_id(), r.total_instances()))
            .collect();
        format!(
            "{} processes, {} resource types [{}], {} events over {} steps",
            ledger.num_processes(),
            ledger.num_resources(),
            totals.join(", "),
            self.state.schedule.len(),
            self.state.schedule.max_step() + 1,
        )
    }
}
