// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Banker's safety algorithm.

use resource_ledger::{Ledger, LedgerError, Pid};

use crate::work;

/// Verdict of [`is_safe_state`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SafetyVerdict {
    pub is_safe: bool,
    /// Witness order in which every active process can finish. `None` when
    /// the state is unsafe.
    pub safe_sequence: Option<Vec<Pid>>,
}

/// Decides whether every active process can still run to completion.
///
/// `FINISHED` and `TERMINATED` processes are excluded entirely. The Need
/// row is the demand tested against Work. Pure with respect to the ledger;
/// fails only if the matrices are stale.
pub fn is_safe_state(ledger: &Ledger) -> Result<SafetyVerdict, LedgerError> {
    let matrices = ledger.matrices()?;
    let excluded: Vec<bool> = ledger.processes().iter().map(|p| p.is_finished()).collect();

    let outcome = work::scan(
        matrices.available(),
        excluded,
        |i| matrices.need_row(i),
        |i| matrices.allocation_row(i),
    );

    if outcome.all_finished() {
        let processes = ledger.processes();
        let sequence = outcome.order.iter().map(|&i| processes[i].pid).collect();
        Ok(SafetyVerdict {
            is_safe: true,
            safe_sequence: Some(sequence),
        })
    } else {
        Ok(SafetyVerdict {
            is_safe: false,
            safe_sequence: None,
        })
    }
}

/// Renders a pid sequence as `P1 -> P3 -> P0`.
pub fn format_sequence(sequence: &[Pid]) -> String {
    sequence
        .iter()
        .map(|pid| format!("P{pid}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}
