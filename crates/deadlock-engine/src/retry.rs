// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Retrying parked requests after the system state changes.

use std::collections::BTreeSet;

use resource_ledger::{Ledger, LedgerError, Pid};

use crate::admission::{admit, AdmissionOutcome};
use crate::AllocationPolicy;

/// One retried request and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RetryAttempt {
    pub pid: Pid,
    pub resource: usize,
    pub amount: u32,
    pub outcome: AdmissionOutcome,
}

/// Retries at most one parked request per process, in ascending pid order.
///
/// Pids in `already_attempted` and processes in a terminal state are
/// skipped. For each remaining process only the lowest-index non-zero
/// request slot is tried, through the admission path selected by `policy`.
pub fn retry_pending_requests(
    ledger: &mut Ledger,
    already_attempted: &BTreeSet<Pid>,
    policy: AllocationPolicy,
) -> Result<Vec<RetryAttempt>, LedgerError> {
    let mut pids: Vec<Pid> = ledger.processes().iter().map(|p| p.pid).collect();
    pids.sort_unstable();

    let mut attempts = Vec::new();
    for pid in pids {
        if already_attempted.contains(&pid) {
            continue;
        }
        let Some(index) = ledger.process_index(pid) else {
            continue;
        };
        if ledger.processes()[index].is_finished() {
            continue;
        }
        let pending = ledger.matrices()?.request_row(index).to_vec();
        let Some((resource, amount)) = pending
            .iter()
            .enumerate()
            .find(|(_, &amount)| amount > 0)
            .map(|(r, &amount)| (r, amount))
        else {
            continue;
        };

        let outcome = admit(ledger, policy, pid, resource, amount)?;
        tracing::debug!(pid, resource, amount, granted = outcome.is_granted(), "retried pending request");
        attempts.push(RetryAttempt {
            pid,
            resource,
            amount,
            outcome,
        });
    }
    Ok(attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_ledger::{Process, ProcessState, ResourceType};

    fn parked() -> Ledger {
        let mut ledger = Ledger::new(
            vec![ResourceType::new(0, 2), ResourceType::new(1, 2)],
            vec![
                Process::new(0, 0, 0, vec![2, 2]).with_allocation(vec![2, 0]).unwrap(),
                Process::new(1, 0, 0, vec![1, 1]),
                Process::new(2, 0, 0, vec![1, 2]),
            ],
        )
        .unwrap();
        for (pid, resource, amount) in [(1, 0, 1), (1, 1, 1), (2, 1, 2)] {
            ledger.process_mut(pid).unwrap().set_request(resource, amount).unwrap();
        }
        ledger.set_state(1, ProcessState::Waiting).unwrap();
        ledger.set_state(2, ProcessState::Waiting).unwrap();
        ledger.rebuild_matrices();
        ledger
    }

    #[test]
    fn test_only_first_slot_is_retried() {
        let mut ledger = parked();
        let attempts =
            retry_pending_requests(&mut ledger, &BTreeSet::new(), AllocationPolicy::DetectionOnly)
                .unwrap();
        assert_eq!(attempts.len(), 2);
        // P1's R0 slot comes first and R0 is exhausted.
        assert_eq!((attempts[0].pid, attempts[0].resource), (1, 0));
        assert!(!attempts[0].outcome.is_granted());
        assert_eq!((attempts[1].pid, attempts[1].resource), (2, 1));
        assert!(attempts[1].outcome.is_granted());
        assert_eq!(ledger.process(1).unwrap().current_request(), &[1, 1]);
        assert_eq!(ledger.process(2).unwrap().state, ProcessState::Ready);
    }

    #[test]
    fn test_attempted_and_finished_are_skipped() {
        let mut ledger = parked();
        ledger.finish(0).unwrap();
        let attempted = BTreeSet::from([2]);
        let attempts =
            retry_pending_requests(&mut ledger, &attempted, AllocationPolicy::Avoidance).unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].pid, 1);
        assert!(attempts[0].outcome.is_granted());
        assert_eq!(ledger.process(1).unwrap().current_request(), &[0, 1]);
    }

    #[test]
    fn test_nothing_pending() {
        let mut ledger = Ledger::new(vec![ResourceType::new(0, 1)], vec![Process::new(0, 0, 0, vec![1])])
            .unwrap();
        let attempts =
            retry_pending_requests(&mut ledger, &BTreeSet::new(), AllocationPolicy::Avoidance).unwrap();
        assert!(attempts.is_empty());
    }
}
