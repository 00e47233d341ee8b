// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Running one scenario under several policies side by side.

use deadlock_engine::AllocationPolicy;
use resource_ledger::Ledger;
use scenario::EventSchedule;

use crate::{Simulation, SimulationConfig, SimulationError, StopReason};

/// One row of a policy comparison.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PolicyComparison {
    pub policy: AllocationPolicy,
    pub stop_reason: StopReason,
    pub steps_run: u32,
    pub deadlocks: u32,
    pub avg_utilisation: f64,
    pub avg_waiting_time: f64,
    pub throughput: f64,
    pub finished: usize,
    pub terminated: usize,
}

/// Runs every policy in `policies` on a fresh copy of `ledger`.
///
/// All other settings come from `config`; its own `policy` is ignored.
pub fn compare_policies(
    config: &SimulationConfig,
    ledger: &Ledger,
    schedule: &EventSchedule,
    policies: &[AllocationPolicy],
) -> Result<Vec<PolicyComparison>, SimulationError> {
    policies
        .iter()
        .map(|&policy| {
            let config = SimulationConfig {
                policy,
                ..config.clone()
            };
            let report =
                Simulation::from_parts(config, ledger.clone(), schedule.clone()).run()?;
            let m = &report.metrics;
            Ok(PolicyComparison {
                policy,
                stop_reason: report.stop_reason,
                steps_run: report.steps_run,
                deadlocks: m.deadlock_count,
                avg_utilisation: m.avg_utilisation(),
                avg_waiting_time: m.avg_waiting_time(),
                throughput: m.throughput(),
                finished: m.completed_processes,
                terminated: m.terminated_processes,
            })
        })
        .collect()
}

/// Fixed-width table of comparison rows.
pub fn comparison_table(rows: &[PolicyComparison]) -> String {
    let mut out = format!(
        "{:<25} {:>6} {:>9} {:>8} {:>8} {:>10} {:>8} {:>10}  {}\n",
        "Policy", "Steps", "Deadlocks", "Util %", "Wait", "Throughput", "Finished", "Terminated",
        "Stop reason"
    );
    out.push_str(&"-".repeat(115));
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{:<25} {:>6} {:>9} {:>8.2} {:>8.2} {:>10.4} {:>8} {:>10}  {}\n",
            row.policy.as_str(),
            row.steps_run,
            row.deadlocks,
            row.avg_utilisation,
            row.avg_waiting_time,
            row.throughput,
            row.finished,
            row.terminated,
            row.stop_reason,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_ledger::{Process, ResourceType};
    use scenario::{ScheduledAction, ScheduledEvent};

    #[test]
    fn test_one_row_per_policy() {
        let ledger = Ledger::new(
            vec![ResourceType::new(0, 1)],
            vec![Process::new(0, 1, 0, vec![1])],
        )
        .unwrap();
        let schedule: EventSchedule = [
            ScheduledEvent {
                step: 0,
                pid: 0,
                action: ScheduledAction::Request {
                    resource: 0,
                    amount: 1,
                },
            },
            ScheduledEvent {
                step: 1,
                pid: 0,
                action: ScheduledAction::Finish,
            },
        ]
        .into_iter()
        .collect();

        let rows = compare_policies(
            &SimulationConfig::default(),
            &ledger,
            &schedule,
            &AllocationPolicy::ALL,
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.stop_reason, StopReason::AllProcessesDone { step: 1 });
            assert_eq!(row.finished, 1);
            assert_eq!(row.deadlocks, 0);
        }
        // The input ledger is not consumed or mutated.
        assert_eq!(ledger.processes()[0].allocation(), &[0]);

        let table = comparison_table(&rows);
        assert_eq!(table.lines().count(), 5);
        assert!(table.contains("detection_with_recovery"));
    }
}
