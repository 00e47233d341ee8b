// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The step-driven simulation engine with a type-state pipeline.
//!
//! ```text
//! Simulation<Idle>
//!     │  .load_scenario()  /  .with_scenario(..)
//!     ▼
//! Simulation<Loaded>
//!     │  .run()
//!     ▼
//!  SimulationReport
//! ```
//!
//! Each transition consumes the old value, so a run can only start on a
//! loaded scenario and a ledger is never simulated twice.

use std::collections::BTreeSet;
use std::fmt;

use deadlock_engine::{
    admit, detect_deadlock, recover_from_deadlock, retry_pending_requests, should_run_detection,
    AdmissionOutcome, AllocationPolicy, RetryAttempt,
};
use resource_ledger::{Ledger, LedgerError, Pid};
use scenario::{EventSchedule, Scenario, ScenarioLoader, ScheduledAction, ScheduledEvent, Validated};

use crate::{EventLog, SimulationConfig, SimulationError, SimulationEvent, SimulationMetrics};

// ── Type-state markers ─────────────────────────────────────────

/// No scenario loaded yet.
#[derive(Debug)]
pub struct Idle;

/// Initial ledger and event schedule are in place.
#[derive(Debug)]
pub struct Loaded {
    ledger: Ledger,
    schedule: EventSchedule,
    description: String,
}

/// Sealed trait for simulation states.
pub trait SimulationState: fmt::Debug {}
impl SimulationState for Idle {}
impl SimulationState for Loaded {}

// ── Report ─────────────────────────────────────────────────────

/// Why the step loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// `detection_only` found a deadlock.
    DeadlockHalt { step: u32 },
    /// Recovery could not break a deadlock.
    RecoveryFailed { step: u32 },
    /// Every process is `FINISHED` or `TERMINATED`.
    AllProcessesDone { step: u32 },
    StepBudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlockHalt { step } => {
                write!(f, "Deadlock detected at step {step} (detection only)")
            }
            Self::RecoveryFailed { step } => write!(f, "Recovery failed at step {step}"),
            Self::AllProcessesDone { step } => {
                write!(f, "All processes completed at step {step}")
            }
            Self::StepBudgetExhausted => f.write_str("Step budget exhausted"),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationReport {
    pub policy: AllocationPolicy,
    pub description: String,
    pub stop_reason: StopReason,
    pub steps_run: u32,
    pub events: EventLog,
    pub metrics: SimulationMetrics,
    /// Ledger as it stood when the loop ended.
    pub ledger: Ledger,
}

impl SimulationReport {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} after {} steps; {}",
            self.policy,
            self.stop_reason,
            self.steps_run,
            self.metrics.summary()
        )
    }

    /// The multi-line metrics report.
    pub fn metrics_report(&self) -> String {
        self.metrics
            .report(self.policy.as_str(), &self.stop_reason.to_string())
    }
}

// ── Simulation ─────────────────────────────────────────────────

/// A single simulation run.
///
/// # Example
/// ```no_run
/// use simulator::{Simulation, SimulationConfig};
///
/// # fn example() -> Result<(), simulator::SimulationError> {
/// let config = SimulationConfig {
///     scenario_path: Some("scenarios/circular_wait.json".into()),
///     ..Default::default()
/// };
/// let report = Simulation::new(config).load_scenario()?.run()?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Simulation<S: SimulationState = Idle> {
    config: SimulationConfig,
    state: S,
}

// ── Idle → Loaded ──────────────────────────────────────────────

impl Simulation<Idle> {
    pub fn new(config: SimulationConfig) -> Self {
        tracing::info!("simulation created with policy '{}'", config.policy);
        Self { config, state: Idle }
    }

    /// Loads and validates the scenario named by `config.scenario_path`.
    pub fn load_scenario(self) -> Result<Simulation<Loaded>, SimulationError> {
        self.config.validate()?;
        let path = self
            .config
            .scenario_path
            .clone()
            .ok_or_else(|| SimulationError::Config("no scenario path configured".into()))?;
        let scenario = ScenarioLoader::load(&path)?;
        Ok(self.with_scenario(scenario))
    }

    /// Uses an already validated scenario.
    pub fn with_scenario(self, scenario: Scenario<Validated>) -> Simulation<Loaded> {
        tracing::info!("{}", scenario.summary());
        let description = scenario.description().to_string();
        let (ledger, schedule) = scenario.into_parts();
        Simulation {
            config: self.config,
            state: Loaded {
                ledger,
                schedule,
                description,
            },
        }
    }
}

// ── Loaded → report ────────────────────────────────────────────

impl Simulation<Loaded> {
    /// Builds a loaded simulation from parts.
    pub fn from_parts(config: SimulationConfig, ledger: Ledger, schedule: EventSchedule) -> Self {
        Self {
            config,
            state: Loaded {
                ledger,
                schedule,
                description: String::new(),
            },
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn schedule(&self) -> &EventSchedule {
        &self.state.schedule
    }

    /// Runs the step loop to completion.
    ///
    /// Errors are fatal ledger integrity failures or invalid configuration;
    /// rejected requests and releases are ordinary events.
    pub fn run(self) -> Result<SimulationReport, SimulationError> {
        self.config.validate()?;
        let Simulation {
            config,
            state:
                Loaded {
                    ledger,
                    schedule,
                    description,
                },
        } = self;

        let budget = config.step_budget(schedule.max_step());
        tracing::info!(policy = %config.policy, budget, "simulation started");

        let metrics = SimulationMetrics::new(&ledger);
        let mut run = Run {
            ledger,
            policy: config.policy,
            events: EventLog::new(),
            metrics,
        };

        let mut stop_reason = StopReason::StepBudgetExhausted;
        let mut steps_run = 0;

        for step in 0..budget {
            steps_run = step + 1;
            let mut attempted = BTreeSet::new();

            for event in schedule.events_at(step) {
                run.apply(event, &mut attempted)?;
            }
            run.retry(step, &attempted)?;

            if config.policy.detects_deadlocks()
                && should_run_detection(step, config.detect_interval)
            {
                if let Some(halt) = run.detect_and_recover(step, &config, &attempted)? {
                    stop_reason = halt;
                }
            }

            run.ledger
                .assert_conservation(&format!("at end of step {step}"))?;
            run.metrics.sample(&run.ledger);
            if config.verbose {
                tracing::info!("state after step {step}:\n{}", run.ledger);
            }

            if stop_reason != StopReason::StepBudgetExhausted {
                break;
            }
            if run.ledger.all_processes_done() {
                stop_reason = StopReason::AllProcessesDone { step };
                break;
            }
        }

        run.metrics.finalise(steps_run, &run.ledger);
        tracing::info!("{stop_reason}; {}", run.metrics.summary());

        Ok(SimulationReport {
            policy: config.policy,
            description,
            stop_reason,
            steps_run,
            events: run.events,
            metrics: run.metrics,
            ledger: run.ledger,
        })
    }
}

/// Mutable state threaded through the step loop.
struct Run {
    ledger: Ledger,
    policy: AllocationPolicy,
    events: EventLog,
    metrics: SimulationMetrics,
}

impl Run {
    fn apply(
        &mut self,
        event: &ScheduledEvent,
        attempted: &mut BTreeSet<Pid>,
    ) -> Result<(), SimulationError> {
        let (step, pid) = (event.step, event.pid);
        match event.action {
            ScheduledAction::Request { resource, amount } => {
                attempted.insert(pid);
                let outcome = admit(&mut self.ledger, self.policy, pid, resource, amount)?;
                self.record(step, pid, resource, amount, &outcome, false);
            }
            ScheduledAction::Release { resource, amount } => {
                match self.ledger.release(pid, resource, amount) {
                    Ok(()) => self
                        .events
                        .add(SimulationEvent::release(step, pid, resource, amount)),
                    Err(e) => tolerate(step, pid, "release", e)?,
                }
            }
            ScheduledAction::Finish => {
                if self.ledger.process(pid).is_some_and(|p| p.is_finished()) {
                    tracing::debug!(step, pid, "finish ignored, process already terminal");
                    return Ok(());
                }
                match self.ledger.finish(pid) {
                    Ok(_) => self.events.add(SimulationEvent::finish(step, pid)),
                    Err(e) => tolerate(step, pid, "finish", e)?,
                }
            }
        }
        Ok(())
    }

    fn retry(&mut self, step: u32, attempted: &BTreeSet<Pid>) -> Result<(), SimulationError> {
        for RetryAttempt {
            pid,
            resource,
            amount,
            outcome,
        } in retry_pending_requests(&mut self.ledger, attempted, self.policy)?
        {
            self.record(step, pid, resource, amount, &outcome, true);
        }
        Ok(())
    }

    /// Returns the stop reason when the loop must halt after this step.
    fn detect_and_recover(
        &mut self,
        step: u32,
        config: &SimulationConfig,
        attempted: &BTreeSet<Pid>,
    ) -> Result<Option<StopReason>, SimulationError> {
        let report = detect_deadlock(&mut self.ledger)?;
        if !report.deadlock_exists() {
            return Ok(None);
        }
        tracing::warn!(step, deadlocked = ?report.deadlocked, "deadlock detected");
        self.metrics.record_deadlock();
        self.events
            .add(SimulationEvent::deadlock(step, &report.deadlocked));

        if self.policy != AllocationPolicy::DetectionWithRecovery {
            return Ok(Some(StopReason::DeadlockHalt { step }));
        }

        let recovery =
            recover_from_deadlock(&mut self.ledger, &report.deadlocked, config.recovery_method)?;
        let terminations = recovery
            .actions
            .iter()
            .filter(|action| action.starts_with("RECOVERY:"));
        for (&victim, action) in recovery.victims.iter().zip(terminations) {
            self.events
                .add(SimulationEvent::recovery(step, victim, action.clone()));
        }
        for action in &recovery.actions {
            tracing::info!(step, "{action}");
        }
        if !recovery.success {
            return Ok(Some(StopReason::RecoveryFailed { step }));
        }

        self.retry(step, attempted)?;
        Ok(None)
    }

    fn record(
        &mut self,
        step: u32,
        pid: Pid,
        resource: usize,
        amount: u32,
        outcome: &AdmissionOutcome,
        retry: bool,
    ) {
        let event = if outcome.is_granted() {
            self.metrics.record_grant(pid);
            SimulationEvent::allocation(step, pid, resource, amount, outcome.detail(), retry)
        } else {
            self.metrics.record_denial(pid);
            SimulationEvent::denial(step, pid, resource, amount, outcome.detail(), retry)
        };
        self.events.add(event);
    }
}

/// Rejected scheduled releases and finishes are logged and skipped unless
/// they indicate corrupted state.
fn tolerate(step: u32, pid: Pid, action: &str, error: LedgerError) -> Result<(), SimulationError> {
    if error.is_fatal() {
        tracing::error!(step, pid, "scheduled {action} failed: {error}");
        return Err(error.into());
    }
    tracing::warn!(step, pid, "scheduled {action} rejected: {error}");
    Ok(())
}
