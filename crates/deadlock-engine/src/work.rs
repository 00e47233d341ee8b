// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The Work/Finish scan shared by the safety and detection algorithms.

/// Result of a Work/Finish scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// `finished[i]` is `true` if process `i` was excluded up front or could
    /// run to completion.
    pub finished: Vec<bool>,
    /// Indices of the processes that completed during the scan, in order.
    pub order: Vec<usize>,
}

impl ScanOutcome {
    /// Indices left unfinished.
    pub fn unfinished(&self) -> impl Iterator<Item = usize> + '_ {
        self.finished
            .iter()
            .enumerate()
            .filter(|(_, &done)| !done)
            .map(|(i, _)| i)
    }

    pub fn all_finished(&self) -> bool {
        self.finished.iter().all(|&done| done)
    }
}

/// Component-wise `demand <= work`.
pub fn fits(demand: &[u32], work: &[u64]) -> bool {
    demand
        .iter()
        .zip(work)
        .all(|(&d, &w)| u64::from(d) <= w)
}

/// Runs the restart-from-zero scan.
///
/// `finished` carries the initial Finish vector (pre-finished entries are
/// skipped and never appear in `order`). `demand(i)` is the row tested
/// against Work; `allocation(i)` is the row returned to Work once `i`
/// finishes.
pub fn scan<'a>(
    available: &[u32],
    mut finished: Vec<bool>,
    demand: impl Fn(usize) -> &'a [u32],
    allocation: impl Fn(usize) -> &'a [u32],
) -> ScanOutcome {
    let mut work: Vec<u64> = available.iter().map(|&v| u64::from(v)).collect();
    let mut order = Vec::new();

    while let Some(i) = (0..finished.len()).find(|&i| !finished[i] && fits(demand(i), &work)) {
        for (w, &a) in work.iter_mut().zip(allocation(i)) {
            *w += u64::from(a);
        }
        finished[i] = true;
        order.push(i);
    }

    ScanOutcome { finished, order }
}
