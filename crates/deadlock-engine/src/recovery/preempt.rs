// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Resource preemption with snapshot rollback.

use resource_ledger::{Ledger, LedgerError, Pid, ProcessState, Snapshot};

/// Outcome of [`preempt_resources`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preemption {
    pub success: bool,
    pub message: String,
    /// State before the preemption; pass to [`Ledger::restore`] to undo it.
    pub snapshot: Option<Snapshot>,
}

impl Preemption {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
            snapshot: None,
        }
    }
}

/// Takes `amount` instances of `resource` away from `pid`.
///
/// Fails without mutation on an unknown pid, an invalid resource index, a
/// zero amount, or when the process holds fewer than `amount`. A `READY`
/// or `RUNNING` victim is demoted to `WAITING`.
pub fn preempt_resources(
    ledger: &mut Ledger,
    pid: Pid,
    resource: usize,
    amount: u32,
) -> Result<Preemption, LedgerError> {
    let Some(index) = ledger.process_index(pid) else {
        return Ok(Preemption::failed(format!("Process P{pid} not found")));
    };
    if resource >= ledger.num_resources() {
        return Ok(Preemption::failed(format!("Invalid resource type R{resource}")));
    }
    if amount == 0 {
        return Ok(Preemption::failed(format!(
            "Cannot preempt zero instances of R{resource} from P{pid}"
        )));
    }
    let held = ledger.processes()[index].allocation()[resource];
    if held < amount {
        return Ok(Preemption::failed(format!(
            "P{pid} only has {held} of R{resource}, cannot preempt {amount}"
        )));
    }

    let snapshot = ledger.snapshot();
    ledger.processes_mut()[index].release(resource, amount)?;
    ledger.resources_mut()[resource].deallocate(resource, amount)?;
    let state = ledger.processes()[index].state;
    if matches!(state, ProcessState::Ready | ProcessState::Running) {
        ledger.set_state(index, ProcessState::Waiting)?;
    }
    ledger.rebuild_matrices();
    ledger.assert_conservation(&format!("after preempting R{resource}[{amount}] from P{pid}"))?;

    let now = held - amount;
    tracing::info!(pid, resource, amount, "preempted resources");
    Ok(Preemption {
        success: true,
        message: format!("Preempted R{resource}[{amount}] from P{pid} (now holding {now})"),
        snapshot: Some(snapshot),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::tests::classic;

    #[test]
    fn test_preempt_and_rollback() {
        let mut ledger = classic();
        let before = ledger.matrices().unwrap().clone();

        let p = preempt_resources(&mut ledger, 2, 0, 2).unwrap();
        assert!(p.success);
        assert_eq!(p.message, "Preempted R0[2] from P2 (now holding 1)");
        let m = ledger.matrices().unwrap();
        assert_eq!(m.available(), &[5, 3, 2]);
        assert_eq!(m.need_row(2), &[8, 0, 0]);
        assert_eq!(ledger.process(2).unwrap().state, ProcessState::Waiting);

        ledger.restore(p.snapshot.as_ref().unwrap()).unwrap();
        assert_eq!(ledger.matrices().unwrap(), &before);
        assert_eq!(ledger.process(2).unwrap().state, ProcessState::Ready);
        assert_eq!(ledger.resources()[0].available_instances(), 3);
    }

    #[test]
    fn test_preempt_failures_do_not_mutate() {
        let mut ledger = classic();
        let before = ledger.snapshot();
        for (pid, resource, amount, msg) in [
            (9, 0, 1, "Process P9 not found"),
            (2, 7, 1, "Invalid resource type R7"),
            (2, 0, 0, "Cannot preempt zero instances of R0 from P2"),
            (2, 0, 4, "P2 only has 3 of R0, cannot preempt 4"),
        ] {
            let p = preempt_resources(&mut ledger, pid, resource, amount).unwrap();
            assert!(!p.success);
            assert_eq!(p.message, msg);
            assert!(p.snapshot.is_none());
        }
        assert_eq!(ledger.snapshot(), before);
    }
}
