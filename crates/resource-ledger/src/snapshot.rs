// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Opaque ledger snapshots for undoing preemption.

use crate::{Matrices, Pid, Process, ProcessState};

/// A frozen copy of the mutable parts of a [`Ledger`](crate::Ledger).
///
/// Only the ledger can create or apply one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    matrices: Matrices,
    records: Vec<ProcessRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcessRecord {
    pub(crate) pid: Pid,
    pub(crate) state: ProcessState,
    pub(crate) allocation: Vec<u32>,
    pub(crate) current_request: Vec<u32>,
}

impl Snapshot {
    pub(crate) fn capture(matrices: Matrices, processes: &[Process]) -> Self {
        let records = processes
            .iter()
            .map(|p| ProcessRecord {
                pid: p.pid,
                state: p.state,
                allocation: p.allocation().to_vec(),
                current_request: p.current_request().to_vec(),
            })
            .collect();
        Self { matrices, records }
    }

    pub(crate) fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    /// The matrix view at capture time.
    pub fn matrices(&self) -> &Matrices {
        &self.matrices
    }

    pub fn num_processes(&self) -> usize {
        self.records.len()
    }
}
