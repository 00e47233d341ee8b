// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for ledger bookkeeping.

use crate::Pid;

/// Errors raised by the ledger and the algorithms that mutate it.
///
/// Variants split into two families. Integrity violations
/// ([`is_fatal`](Self::is_fatal) returns `true`) mean the bookkeeping itself
/// is broken and the simulation must abort. Everything else is a rejected
/// operation that leaves the ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Σ allocation + available no longer equals the total for a resource.
    #[error(
        "conservation violated {context}: R{resource} allocated {allocated} + available {available} != total {total}"
    )]
    ConservationViolated {
        context: String,
        resource: usize,
        allocated: u64,
        available: u64,
        total: u64,
    },

    /// Returning instances would push a resource above its total.
    #[error("R{resource} would have {available} available out of {total} total")]
    AvailabilityExceedsTotal {
        resource: usize,
        available: u64,
        total: u32,
    },

    /// The cached matrices were read after a mutation without a rebuild.
    #[error("matrices read while stale; call rebuild_matrices() after mutating the ledger")]
    StaleMatrices,

    /// A snapshot was restored into a ledger with a different shape.
    #[error("snapshot does not match ledger: {0}")]
    SnapshotMismatch(String),

    /// A per-process vector has the wrong number of resource slots.
    #[error("P{pid}: {field} has {actual} entries, expected {expected}")]
    DimensionMismatch {
        pid: Pid,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Initial allocations of a resource add up to more than its total.
    #[error("R{resource} oversubscribed: {allocated} allocated of {total} total")]
    Oversubscribed {
        resource: usize,
        allocated: u64,
        total: u32,
    },

    /// An allocation would exceed the process's declared maximum.
    #[error("P{pid}: allocation {allocation} of R{resource} exceeds max demand {max}")]
    ExceedsMaxDemand {
        pid: Pid,
        resource: usize,
        allocation: u64,
        max: u32,
    },

    /// Two processes share a pid.
    #[error("duplicate process id P{0}")]
    DuplicatePid(Pid),

    /// No process with this pid exists.
    #[error("process P{0} not found")]
    UnknownProcess(Pid),

    /// Process index out of range.
    #[error("process index {index} out of range ({count} processes)")]
    UnknownIndex { index: usize, count: usize },

    /// Fewer free instances than a grant needs.
    #[error("R{resource} has {available} free, cannot grant {requested}")]
    Exhausted {
        resource: usize,
        requested: u32,
        available: u32,
    },

    /// Resource index out of range.
    #[error("resource R{resource} does not exist ({count} resource types)")]
    UnknownResource { resource: usize, count: usize },

    /// A release asked for more than the process holds.
    #[error("P{pid} cannot release {requested} of R{resource}: holds {held}")]
    InvalidRelease {
        pid: Pid,
        resource: usize,
        requested: u32,
        held: u32,
    },

    /// Zero-sized release or transfer.
    #[error("P{pid}: amount for R{resource} must be positive")]
    ZeroAmount { pid: Pid, resource: usize },
}

impl LedgerError {
    /// Returns `true` for integrity violations that must abort a simulation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConservationViolated { .. }
                | Self::AvailabilityExceedsTotal { .. }
                | Self::StaleMatrices
                | Self::SnapshotMismatch(_)
        )
    }
}
