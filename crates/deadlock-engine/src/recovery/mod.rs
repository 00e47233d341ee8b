// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Breaking deadlocks once detection has found them.
//!
//! Termination is the only complete recovery method: pick a victim, take
//! everything it holds, re-run detection, repeat until no deadlock is left.
//! Preemption is available as a primitive ([`preempt_resources`]) that
//! returns a [`Snapshot`](resource_ledger::Snapshot) for rollback, but is not
//! wired into [`recover_from_deadlock`].

mod preempt;
mod terminate;
mod victim;

pub use preempt::{preempt_resources, Preemption};
pub use terminate::{terminate_process, ActionOutcome};
pub use victim::select_victim;

use resource_ledger::{Ledger, LedgerError, Pid, ProcessState};

use crate::{detect_deadlock, RecoveryMethod, VictimStrategy};

/// Outcome of [`recover_from_deadlock`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RecoveryReport {
    pub success: bool,
    /// Human-readable log of every action taken.
    pub actions: Vec<String>,
    /// Terminated pids, in termination order.
    pub victims: Vec<Pid>,
}

impl RecoveryReport {
    fn failed(actions: Vec<String>, victims: Vec<Pid>) -> Self {
        Self {
            success: false,
            actions,
            victims,
        }
    }
}

/// Resolves the deadlock among `deadlocked`.
///
/// With [`RecoveryMethod::Terminate`] at most `deadlocked.len()` processes
/// are terminated: each termination can only shrink the deadlocked set.
/// [`RecoveryMethod::Preempt`] is reported as unavailable and mutates
/// nothing.
pub fn recover_from_deadlock(
    ledger: &mut Ledger,
    deadlocked: &[Pid],
    method: RecoveryMethod,
) -> Result<RecoveryReport, LedgerError> {
    if deadlocked.is_empty() {
        return Ok(RecoveryReport::failed(
            vec!["No deadlocked processes to recover".to_string()],
            Vec::new(),
        ));
    }

    match method {
        RecoveryMethod::Terminate => terminate_until_resolved(ledger, deadlocked),
        RecoveryMethod::Preempt => {
            tracing::warn!("preemption recovery requested but not available");
            Ok(RecoveryReport::failed(
                vec![
                    "Preemption recovery not available: use preempt_resources() with explicit rollback, or terminate".to_string(),
                ],
                Vec::new(),
            ))
        }
    }
}

fn terminate_until_resolved(
    ledger: &mut Ledger,
    deadlocked: &[Pid],
) -> Result<RecoveryReport, LedgerError> {
    let mut remaining = deadlocked.to_vec();
    let mut actions = Vec::new();
    let mut victims = Vec::new();

    while !remaining.is_empty() {
        let Some(victim) = select_victim(&remaining, ledger, VictimStrategy::Priority) else {
            actions.push("FAILED: no victim could be selected".to_string());
            return Ok(RecoveryReport::failed(actions, victims));
        };

        let outcome = terminate_process(ledger, victim)?;
        if !outcome.success {
            tracing::warn!(victim, message = %outcome.message, "termination failed");
            actions.push(format!("FAILED: {}", outcome.message));
            return Ok(RecoveryReport::failed(actions, victims));
        }
        tracing::info!(victim, "terminated deadlock victim");
        actions.push(format!("RECOVERY: {}", outcome.message));
        victims.push(victim);

        let report = detect_deadlock(ledger)?;
        if !report.deadlock_exists() {
            wake_deadlocked(ledger)?;
            actions.push("Deadlock resolved - system restored to safe state".to_string());
            return Ok(RecoveryReport {
                success: true,
                actions,
                victims,
            });
        }
        remaining = report.deadlocked;
    }

    actions.push("All deadlocked processes terminated".to_string());
    Ok(RecoveryReport {
        success: true,
        actions,
        victims,
    })
}

/// Moves every `DEADLOCKED` process back to `WAITING` if it still has a
/// pending request, otherwise `READY`.
fn wake_deadlocked(ledger: &mut Ledger) -> Result<(), LedgerError> {
    let woken: Vec<(usize, ProcessState)> = ledger
        .processes()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.state == ProcessState::Deadlocked)
        .map(|(i, p)| {
            let next = if p.has_pending_request() {
                ProcessState::Waiting
            } else {
                ProcessState::Ready
            };
            (i, next)
        })
        .collect();
    for (index, state) in woken {
        ledger.set_state(index, state)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_ledger::{Process, ResourceType};

    /// Three processes in a ring, each holding one resource and waiting for
    /// the next one.
    fn ring() -> Ledger {
        let mut ledger = Ledger::new(
            vec![
                ResourceType::new(0, 1),
                ResourceType::new(1, 1),
                ResourceType::new(2, 1),
            ],
            vec![
                Process::new(0, 1, 0, vec![1, 1, 0]).with_allocation(vec![1, 0, 0]).unwrap(),
                Process::new(1, 3, 1, vec![0, 1, 1]).with_allocation(vec![0, 1, 0]).unwrap(),
                Process::new(2, 2, 2, vec![1, 0, 1]).with_allocation(vec![0, 0, 1]).unwrap(),
            ],
        )
        .unwrap();
        for (pid, resource) in [(0, 1), (1, 2), (2, 0)] {
            ledger.process_mut(pid).unwrap().set_request(resource, 1).unwrap();
        }
        ledger.rebuild_matrices();
        ledger
    }

    #[test]
    fn test_empty_input() {
        let mut ledger = ring();
        let report = recover_from_deadlock(&mut ledger, &[], RecoveryMethod::Terminate).unwrap();
        assert!(!report.success);
        assert_eq!(report.actions, vec!["No deadlocked processes to recover"]);
    }

    #[test]
    fn test_terminate_breaks_ring_with_one_victim() {
        let mut ledger = ring();
        let detected = detect_deadlock(&mut ledger).unwrap();
        assert_eq!(detected.deadlocked, vec![0, 1, 2]);

        let report =
            recover_from_deadlock(&mut ledger, &detected.deadlocked, RecoveryMethod::Terminate)
                .unwrap();
        assert!(report.success);
        // P1 has the highest priority value.
        assert_eq!(report.victims, vec![1]);
        assert!(report.actions[0].starts_with("RECOVERY: Terminated P1 (priority=3"));
        assert_eq!(
            report.actions.last().unwrap(),
            "Deadlock resolved - system restored to safe state"
        );
        assert_eq!(ledger.process(1).unwrap().state, ProcessState::Terminated);
        assert_eq!(ledger.process(0).unwrap().state, ProcessState::Waiting);
        assert_eq!(ledger.process(2).unwrap().state, ProcessState::Waiting);
        assert!(!detect_deadlock(&mut ledger).unwrap().deadlock_exists());
        ledger.assert_conservation("after recovery").unwrap();
    }

    #[test]
    fn test_victims_bounded_by_deadlocked_count() {
        // Two disjoint two-process cycles need two terminations.
        let mut ledger = Ledger::new(
            (0..4).map(|r| ResourceType::new(r, 1)).collect(),
            vec![
                Process::new(0, 1, 0, vec![1, 1, 0, 0]).with_allocation(vec![1, 0, 0, 0]).unwrap(),
                Process::new(1, 2, 0, vec![1, 1, 0, 0]).with_allocation(vec![0, 1, 0, 0]).unwrap(),
                Process::new(2, 3, 0, vec![0, 0, 1, 1]).with_allocation(vec![0, 0, 1, 0]).unwrap(),
                Process::new(3, 4, 0, vec![0, 0, 1, 1]).with_allocation(vec![0, 0, 0, 1]).unwrap(),
            ],
        )
        .unwrap();
        for (pid, resource) in [(0, 1), (1, 0), (2, 3), (3, 2)] {
            ledger.process_mut(pid).unwrap().set_request(resource, 1).unwrap();
        }
        ledger.rebuild_matrices();

        let detected = detect_deadlock(&mut ledger).unwrap();
        let report =
            recover_from_deadlock(&mut ledger, &detected.deadlocked, RecoveryMethod::Terminate)
                .unwrap();
        assert!(report.success);
        assert_eq!(report.victims, vec![3, 1]);
        assert!(report.victims.len() <= detected.deadlocked.len());
        assert!(!detect_deadlock(&mut ledger).unwrap().deadlock_exists());
    }

    #[test]
    fn test_preempt_method_is_unavailable() {
        let mut ledger = ring();
        let before = ledger.snapshot();
        let report =
            recover_from_deadlock(&mut ledger, &[0, 1, 2], RecoveryMethod::Preempt).unwrap();
        assert!(!report.success);
        assert!(report.actions[0].starts_with("Preemption recovery not available"));
        assert_eq!(ledger.snapshot(), before);
    }
}
