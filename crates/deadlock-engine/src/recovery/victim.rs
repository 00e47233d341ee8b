// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Victim selection.

use std::cmp::Reverse;

use resource_ledger::{Ledger, Pid};

use crate::VictimStrategy;

/// Picks the process to sacrifice from `candidates`.
///
/// Ties always go to the lowest pid. Pids the ledger does not know are
/// ignored; `None` if nothing is left.
pub fn select_victim(candidates: &[Pid], ledger: &Ledger, strategy: VictimStrategy) -> Option<Pid> {
    let known = candidates.iter().filter_map(|&pid| ledger.process(pid));
    let victim = match strategy {
        VictimStrategy::Priority => known.max_by_key(|p| (p.priority, Reverse(p.pid))),
        VictimStrategy::FewestResources => known.min_by_key(|p| (p.total_held(), p.pid)),
        VictimStrategy::Youngest => known.max_by_key(|p| (p.arrival_step, Reverse(p.pid))),
    };
    victim.map(|p| p.pid)
}
