// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Simulation metrics.
//!
//! [`SimulationMetrics`] collects per-step utilisation samples, per-process
//! waiting time and grant/deny counts. These are the numbers compared across
//! allocation policies.
//!
//! | Metric | Formula |
//! |---|---|
//! | Deadlock count | number of steps where detection found a deadlock |
//! | Utilisation | mean over steps of `allocated / total * 100` (initial holdings included) |
//! | Waiting time | mean over processes of steps spent `WAITING` or `DEADLOCKED` |
//! | Throughput | `FINISHED` processes / steps run |

use std::collections::BTreeMap;

use resource_ledger::{Ledger, Pid, ProcessState};

/// Final per-process record.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProcessOutcome {
    pub pid: Pid,
    pub state: ProcessState,
    pub allocation: Vec<u32>,
    pub pending: Vec<u32>,
    pub waiting_steps: u32,
    pub granted: u32,
    pub denied: u32,
}

/// Aggregate metrics for a complete simulation run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SimulationMetrics {
    pub deadlock_count: u32,
    /// Steps actually run.
    pub total_steps: u32,
    /// Processes that reached `FINISHED`.
    pub completed_processes: usize,
    /// Processes killed by recovery.
    pub terminated_processes: usize,
    pub total_processes: usize,
    /// Overall utilisation percentage, one sample per step.
    pub utilisation_samples: Vec<f64>,
    /// Per-resource utilisation samples keyed by resource type id.
    pub resource_utilisation_samples: BTreeMap<u32, Vec<f64>>,
    pub waiting_steps: BTreeMap<Pid, u32>,
    pub granted: BTreeMap<Pid, u32>,
    pub denied: BTreeMap<Pid, u32>,
    pub processes: Vec<ProcessOutcome>,
}

impl SimulationMetrics {
    /// Creates an empty metrics container sized for `ledger`.
    pub fn new(ledger: &Ledger) -> Self {
        Self {
            total_processes: ledger.num_processes(),
            waiting_steps: ledger.processes().iter().map(|p| (p.pid, 0)).collect(),
            resource_utilisation_samples: ledger
                .resources()
                .iter()
                .map(|r| (r.type_id(), Vec::new()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn record_deadlock(&mut self) {
        self.deadlock_count += 1;
    }

    pub fn record_grant(&mut self, pid: Pid) {
        *self.granted.entry(pid).or_default() += 1;
    }

    pub fn record_denial(&mut self, pid: Pid) {
        *self.denied.entry(pid).or_default() += 1;
    }

    /// Takes the end-of-step sample.
    pub fn sample(&mut self, ledger: &Ledger) {
        self.utilisation_samples.push(ledger.overall_utilisation());
        for resource in ledger.resources() {
            if resource.total_instances() > 0 {
                self.resource_utilisation_samples
                    .entry(resource.type_id())
                    .or_default()
                    .push(resource.utilisation());
            }
        }
        for process in ledger.processes() {
            if matches!(
                process.state,
                ProcessState::Waiting | ProcessState::Deadlocked
            ) {
                *self.waiting_steps.entry(process.pid).or_default() += 1;
            }
        }
    }

    /// Records the step count and final process states.
    pub fn finalise(&mut self, steps_run: u32, ledger: &Ledger) {
        self.total_steps = steps_run;
        let count = |state| {
            ledger
                .processes()
                .iter()
                .filter(|p| p.state == state)
                .count()
        };
        self.completed_processes = count(ProcessState::Finished);
        self.terminated_processes = count(ProcessState::Terminated);
        self.processes = ledger
            .processes()
            .iter()
            .map(|p| ProcessOutcome {
                pid: p.pid,
                state: p.state,
                allocation: p.allocation().to_vec(),
                pending: p.current_request().to_vec(),
                waiting_steps: self.waiting_steps.get(&p.pid).copied().unwrap_or(0),
                granted: self.granted.get(&p.pid).copied().unwrap_or(0),
                denied: self.denied.get(&p.pid).copied().unwrap_or(0),
            })
            .collect();
    }

    pub fn avg_utilisation(&self) -> f64 {
        mean(&self.utilisation_samples)
    }

    /// Average utilisation of one resource type; `0.0` if never sampled.
    pub fn resource_utilisation(&self, type_id: u32) -> f64 {
        self.resource_utilisation_samples
            .get(&type_id)
            .map_or(0.0, |samples| mean(samples))
    }

    /// Mean waiting steps over all processes.
    pub fn avg_waiting_time(&self) -> f64 {
        if self.waiting_steps.is_empty() {
            return 0.0;
        }
        let total: u64 = self.waiting_steps.values().map(|&w| u64::from(w)).sum();
        total as f64 / self.waiting_steps.len() as f64
    }

    /// Finished processes per step.
    pub fn throughput(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.completed_processes as f64 / f64::from(self.total_steps)
    }

    /// Deadlocks per step.
    pub fn deadlock_frequency(&self) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        f64::from(self.deadlock_count) / f64::from(self.total_steps)
    }

    /// Returns a one-line summary suitable for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} steps, {}/{} finished, {} terminated, {} deadlocks, \
             {:.2}% utilisation, {:.2} steps avg wait, {:.4} processes/step",
            self.total_steps,
            self.completed_processes,
            self.total_processes,
            self.terminated_processes,
            self.deadlock_count,
            self.avg_utilisation(),
            self.avg_waiting_time(),
            self.throughput(),
        )
    }

    /// Multi-line report printed at the end of a run.
    pub fn report(&self, policy: &str, stop_reason: &str) -> String {
        let rule = "=".repeat(60);
        let thin = "-".repeat(60);
        let mut lines = vec![
            rule.clone(),
            "SIMULATION METRICS".to_string(),
            rule.clone(),
            format!("Policy: {}", policy.to_uppercase()),
            format!("Stop Reason: {stop_reason}"),
            String::new(),
            format!("Total Steps: {}", self.total_steps),
            format!("Total Processes: {}", self.total_processes),
            format!("Completed Processes: {}", self.completed_processes),
            format!("Terminated Processes: {}", self.terminated_processes),
            String::new(),
            "KEY PERFORMANCE METRICS:".to_string(),
            thin.clone(),
            format!("1. Deadlock Count: {}", self.deadlock_count),
            format!(
                "2. Average Resource Utilization: {:.2}%",
                self.avg_utilisation()
            ),
            "   (Note: Includes initial allocations)".to_string(),
            format!(
                "3. Average Waiting Time: {:.2} steps/process",
                self.avg_waiting_time()
            ),
            format!(
                "4. System Throughput: {:.4} processes/step",
                self.throughput()
            ),
        ];

        if !self.resource_utilisation_samples.is_empty() {
            lines.push(String::new());
            lines.push("PER-RESOURCE UTILIZATION:".to_string());
            lines.push(thin.clone());
            for &type_id in self.resource_utilisation_samples.keys() {
                lines.push(format!(
                    "  R{type_id}: {:.2}% average",
                    self.resource_utilisation(type_id)
                ));
            }
        }

        if !self.processes.is_empty() {
            lines.push(String::new());
            lines.push("PER-PROCESS SUMMARY:".to_string());
            lines.push(thin);
            for p in &self.processes {
                let pending = if p.pending.iter().any(|&r| r > 0) {
                    format!("{:?}", p.pending)
                } else {
                    "none".to_string()
                };
                lines.push(format!(
                    "  P{}: {:<12} | wait={:>2} steps | grant={:>2} deny={:>2} | alloc={:?} | pending={pending}",
                    p.pid,
                    p.state.as_str(),
                    p.waiting_steps,
                    p.granted,
                    p.denied,
                    p.allocation,
                ));
            }
        }

        lines.push(rule);
        lines.join("\n")
    }
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_ledger::{Process, ResourceType};

    fn ledger() -> Ledger {
        Ledger::new(
            vec![ResourceType::new(0, 4), ResourceType::new(1, 2)],
            vec![
                Process::new(0, 1, 0, vec![4, 2])
                    .with_allocation(vec![2, 0])
                    .unwrap(),
                Process::new(1, 2, 0, vec![1, 1]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let m = SimulationMetrics::new(&ledger());
        assert_eq!(m.total_processes, 2);
        assert_eq!(m.avg_utilisation(), 0.0);
        assert_eq!(m.avg_waiting_time(), 0.0);
        assert_eq!(m.throughput(), 0.0);
        assert_eq!(m.deadlock_frequency(), 0.0);
        assert_eq!(m.resource_utilisation(9), 0.0);
    }

    #[test]
    fn test_sampling() {
        let mut ledger = ledger();
        let mut m = SimulationMetrics::new(&ledger);
        m.sample(&ledger);
        ledger.process_mut(1).unwrap().state = ProcessState::Waiting;
        m.sample(&ledger);

        // 2 of 6 instances held in both samples.
        assert!((m.avg_utilisation() - 100.0 / 3.0).abs() < 1e-9);
        assert!((m.resource_utilisation(0) - 50.0).abs() < 1e-9);
        assert_eq!(m.resource_utilisation(1), 0.0);
        assert_eq!(m.waiting_steps[&1], 1);
        assert!((m.avg_waiting_time() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_finalise_and_rates() {
        let mut ledger = ledger();
        let mut m = SimulationMetrics::new(&ledger);
        m.record_grant(0);
        m.record_grant(0);
        m.record_denial(1);
        m.record_deadlock();
        ledger.finish(0).unwrap();
        ledger.process_mut(1).unwrap().state = ProcessState::Terminated;
        m.finalise(4, &ledger);

        assert_eq!(m.completed_processes, 1);
        assert_eq!(m.terminated_processes, 1);
        assert!((m.throughput() - 0.25).abs() < 1e-9);
        assert!((m.deadlock_frequency() - 0.25).abs() < 1e-9);
        assert_eq!(m.processes[0].granted, 2);
        assert_eq!(m.processes[1].denied, 1);
        assert_eq!(m.processes[0].allocation, vec![0, 0]);
    }

    #[test]
    fn test_report_sections() {
        let ledger = ledger();
        let mut m = SimulationMetrics::new(&ledger);
        m.sample(&ledger);
        m.finalise(1, &ledger);
        let report = m.report("avoidance", "step budget exhausted");
        assert!(report.contains("Policy: AVOIDANCE"));
        assert!(report.contains("1. Deadlock Count: 0"));
        assert!(report.contains("  R0: 50.00% average"));
        assert!(report.contains("P0: READY"));
        assert!(report.contains("pending=none"));
        assert!(m.summary().starts_with("1 steps, 0/2 finished"));
    }
}
