// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for scenario loading and validation.

use resource_ledger::{LedgerError, Pid};

/// Errors that can occur when reading or validating a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("failed to read scenario: {0}")]
    Read(#[from] std::io::Error),

    /// The JSON is malformed or a required field is missing.
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two resource entries share a `type_id`.
    #[error("duplicate resource type_id {0}")]
    DuplicateResourceType(u32),

    /// Two processes share a `pid`.
    #[error("duplicate process pid {0}")]
    DuplicatePid(Pid),

    /// A per-resource vector does not match the number of resource types.
    #[error("process {pid}: {field} length ({actual}) does not match resource count ({expected})")]
    LengthMismatch {
        pid: Pid,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An initial allocation exceeds the declared maximum demand.
    #[error("process {pid}: initial_allocation[{resource}] ({allocation}) exceeds max_demand[{resource}] ({max})")]
    AllocationExceedsMax {
        pid: Pid,
        resource: usize,
        allocation: u32,
        max: u32,
    },

    /// Initial allocations of one resource add up to more than its total.
    #[error("resource R{resource}: initial allocations ({allocated}) exceed total instances ({total})")]
    OverAllocated {
        resource: usize,
        allocated: u64,
        total: u32,
    },

    /// An event is malformed.
    #[error("process {pid}: {detail}")]
    InvalidEvent { pid: Pid, detail: String },

    /// The ledger rejected the validated data.
    #[error("ledger construction failed: {0}")]
    Ledger(#[from] LedgerError),
}
