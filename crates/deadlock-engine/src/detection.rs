// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Deadlock detection over outstanding requests.

use resource_ledger::{Ledger, LedgerError, Pid, ProcessState};

use crate::work;

/// Result of a detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DetectionReport {
    /// Deadlocked pids in ledger order.
    pub deadlocked: Vec<Pid>,
}

impl DetectionReport {
    pub fn deadlock_exists(&self) -> bool {
        !self.deadlocked.is_empty()
    }
}

/// Finds every process that can never have its current request satisfied.
///
/// Unlike the safety check this tests the **Request** row, so a process with
/// nothing outstanding is never reported. Deadlocked processes are moved to
/// `DEADLOCKED`.
pub fn detect_deadlock(ledger: &mut Ledger) -> Result<DetectionReport, LedgerError> {
    let stuck: Vec<usize> = {
        let matrices = ledger.matrices()?;
        let finished: Vec<bool> = ledger.processes().iter().map(|p| p.is_finished()).collect();
        let outcome = work::scan(
            matrices.available(),
            finished,
            |i| matrices.request_row(i),
            |i| matrices.allocation_row(i),
        );
        outcome.unfinished().collect()
    };

    let mut deadlocked = Vec::with_capacity(stuck.len());
    for index in stuck {
        ledger.set_state(index, ProcessState::Deadlocked)?;
        deadlocked.push(ledger.processes()[index].pid);
    }

    if !deadlocked.is_empty() {
        tracing::info!(?deadlocked, "deadlock detected");
    }
    Ok(DetectionReport { deadlocked })
}

/// `true` when detection is due at `step`. An interval of zero is treated as one.
pub fn should_run_detection(step: u32, interval: u32) -> bool {
    step % interval.max(1) == 0
}
