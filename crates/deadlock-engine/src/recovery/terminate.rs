// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Process termination.

use resource_ledger::{Ledger, LedgerError, Pid, ProcessState};

/// Success flag plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    pub(crate) fn ok(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }

    pub(crate) fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Terminates `pid`, returning everything it held to the pool.
///
/// Available counts are recomputed from the conservation equation rather
/// than incremented, so the result does not depend on the previous
/// available values. An unknown pid is a failed outcome, not an error.
pub fn terminate_process(ledger: &mut Ledger, pid: Pid) -> Result<ActionOutcome, LedgerError> {
    let Some(index) = ledger.process_index(pid) else {
        return Ok(ActionOutcome::failed(format!("Process P{pid} not found")));
    };

    let process = &mut ledger.processes_mut()[index];
    let released = process.release_all();
    process.state = ProcessState::Terminated;
    let priority = process.priority;

    ledger.recompute_available()?;
    ledger.rebuild_matrices();
    ledger.assert_conservation(&format!("after terminating P{pid}"))?;

    let held: Vec<String> = released
        .iter()
        .enumerate()
        .filter(|(_, &amount)| amount > 0)
        .map(|(r, amount)| format!("R{r}[{amount}]"))
        .collect();
    let holding = if held.is_empty() {
        "nothing".to_string()
    } else {
        held.join(", ")
    };
    Ok(ActionOutcome::ok(format!(
        "Terminated P{pid} (priority={priority}, holding {holding})"
    )))
}
