// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Simulated processes and their lifecycle states.

use crate::LedgerError;
use std::fmt;

/// Process identifier.
pub type Pid = u32;

/// Lifecycle state of a simulated process.
///
/// ```text
///  READY ──► WAITING ──► READY ──► FINISHED
///    │          │
///    │          ▼
///    │      DEADLOCKED ──► WAITING / READY (after recovery)
///    ▼
///  TERMINATED (recovery victim)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    Ready,
    Running,
    Waiting,
    Finished,
    Deadlocked,
    Terminated,
}

impl ProcessState {
    /// `FINISHED` and `TERMINATED` never take part in allocation again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Terminated)
    }

    /// Upper-case name used in tables and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Waiting => "WAITING",
            Self::Finished => "FINISHED",
            Self::Deadlocked => "DEADLOCKED",
            Self::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A simulated process.
///
/// The three per-resource vectors always have the same length, and
/// `allocation[r] <= max_demand[r]` holds for every slot. Mutating methods
/// enforce both; the public `state` and `priority` fields carry no
/// cross-field invariant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Process {
    pub pid: Pid,
    /// Larger value means a more expendable process during recovery.
    pub priority: i32,
    pub arrival_step: u32,
    pub state: ProcessState,
    max_demand: Vec<u32>,
    allocation: Vec<u32>,
    current_request: Vec<u32>,
}

impl Process {
    /// Creates a `READY` process holding nothing.
    pub fn new(pid: Pid, priority: i32, arrival_step: u32, max_demand: Vec<u32>) -> Self {
        let n = max_demand.len();
        Self {
            pid,
            priority,
            arrival_step,
            state: ProcessState::Ready,
            max_demand,
            allocation: vec![0; n],
            current_request: vec![0; n],
        }
    }

    /// Replaces the allocation vector with an initial holding.
    pub fn with_allocation(mut self, allocation: Vec<u32>) -> Result<Self, LedgerError> {
        if allocation.len() != self.max_demand.len() {
            return Err(LedgerError::DimensionMismatch {
                pid: self.pid,
                field: "initial_allocation",
                expected: self.max_demand.len(),
                actual: allocation.len(),
            });
        }
        for (r, (&held, &max)) in allocation.iter().zip(&self.max_demand).enumerate() {
            if held > max {
                return Err(LedgerError::ExceedsMaxDemand {
                    pid: self.pid,
                    resource: r,
                    allocation: u64::from(held),
                    max,
                });
            }
        }
        self.allocation = allocation;
        Ok(self)
    }

    /// Number of resource slots.
    pub fn num_resources(&self) -> usize {
        self.max_demand.len()
    }

    pub fn max_demand(&self) -> &[u32] {
        &self.max_demand
    }

    pub fn allocation(&self) -> &[u32] {
        &self.allocation
    }

    pub fn current_request(&self) -> &[u32] {
        &self.current_request
    }

    /// `max_demand[r] - allocation[r]`.
    pub fn need(&self, resource: usize) -> u32 {
        self.max_demand[resource] - self.allocation[resource]
    }

    /// The full need vector.
    pub fn need_vector(&self) -> Vec<u32> {
        self.max_demand
            .iter()
            .zip(&self.allocation)
            .map(|(m, a)| m - a)
            .collect()
    }

    /// Sum of held instances over all resource types.
    pub fn total_held(&self) -> u64 {
        self.allocation.iter().map(|&a| u64::from(a)).sum()
    }

    /// `true` if `amount` more instances of `resource` fit under max demand.
    pub fn can_request(&self, resource: usize, amount: u32) -> bool {
        resource < self.num_resources() && amount <= self.need(resource)
    }

    /// `true` if `state` is `FINISHED` or `TERMINATED`.
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// First resource slot with a non-zero outstanding request.
    pub fn first_pending_request(&self) -> Option<(usize, u32)> {
        self.current_request
            .iter()
            .enumerate()
            .find(|(_, &amount)| amount > 0)
            .map(|(r, &amount)| (r, amount))
    }

    pub fn has_pending_request(&self) -> bool {
        self.first_pending_request().is_some()
    }

    /// Adds `amount` to the holding of `resource`, bounded by max demand.
    pub fn allocate(&mut self, resource: usize, amount: u32) -> Result<(), LedgerError> {
        self.check_resource(resource)?;
        let next = u64::from(self.allocation[resource]) + u64::from(amount);
        if next > u64::from(self.max_demand[resource]) {
            return Err(LedgerError::ExceedsMaxDemand {
                pid: self.pid,
                resource,
                allocation: next,
                max: self.max_demand[resource],
            });
        }
        self.allocation[resource] = next as u32;
        Ok(())
    }

    /// Removes `amount` from the holding of `resource`.
    pub fn release(&mut self, resource: usize, amount: u32) -> Result<(), LedgerError> {
        self.check_resource(resource)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount {
                pid: self.pid,
                resource,
            });
        }
        let held = self.allocation[resource];
        self.allocation[resource] = held.checked_sub(amount).ok_or(LedgerError::InvalidRelease {
            pid: self.pid,
            resource,
            requested: amount,
            held,
        })?;
        Ok(())
    }

    /// Overwrites one slot of the allocation vector.
    pub fn set_allocation(&mut self, resource: usize, value: u32) -> Result<(), LedgerError> {
        self.check_resource(resource)?;
        if value > self.max_demand[resource] {
            return Err(LedgerError::ExceedsMaxDemand {
                pid: self.pid,
                resource,
                allocation: u64::from(value),
                max: self.max_demand[resource],
            });
        }
        self.allocation[resource] = value;
        Ok(())
    }

    /// Records an outstanding request, replacing any previous one for `resource`.
    pub fn set_request(&mut self, resource: usize, amount: u32) -> Result<(), LedgerError> {
        self.check_resource(resource)?;
        self.current_request[resource] = amount;
        Ok(())
    }

    pub fn clear_request(&mut self, resource: usize) {
        if let Some(slot) = self.current_request.get_mut(resource) {
            *slot = 0;
        }
    }

    /// Drops every holding and every outstanding request.
    ///
    /// Returns what was held so the caller can put it back into the pool.
    pub fn release_all(&mut self) -> Vec<u32> {
        let n = self.allocation.len();
        self.current_request = vec![0; n];
        std::mem::replace(&mut self.allocation, vec![0; n])
    }

    /// Restores allocation and request vectors from a snapshot.
    pub(crate) fn restore_vectors(
        &mut self,
        allocation: &[u32],
        current_request: &[u32],
    ) -> Result<(), LedgerError> {
        let expected = self.num_resources();
        for (field, v) in [("allocation", allocation), ("current_request", current_request)] {
            if v.len() != expected {
                return Err(LedgerError::SnapshotMismatch(format!(
                    "P{} {field} has {} entries, expected {expected}",
                    self.pid,
                    v.len()
                )));
            }
        }
        self.allocation.copy_from_slice(allocation);
        self.current_request.copy_from_slice(current_request);
        Ok(())
    }

    fn check_resource(&self, resource: usize) -> Result<(), LedgerError> {
        if resource >= self.num_resources() {
            return Err(LedgerError::UnknownResource {
                resource,
                count: self.num_resources(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P{} [{}] prio={} alloc={:?} need={:?}",
            self.pid,
            self.state,
            self.priority,
            self.allocation,
            self.need_vector()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc() -> Process {
        Process::new(0, 1, 0, vec![7, 5, 3])
            .with_allocation(vec![0, 1, 0])
            .unwrap()
    }

    #[test]
    fn test_need() {
        let p = proc();
        assert_eq!(p.need_vector(), vec![7, 4, 3]);
        assert_eq!(p.need(1), 4);
        assert!(p.can_request(1, 4));
        assert!(!p.can_request(1, 5));
        assert!(!p.can_request(3, 1));
    }

    #[test]
    fn test_with_allocation_validates() {
        assert!(matches!(
            Process::new(1, 0, 0, vec![1, 1]).with_allocation(vec![2, 0]),
            Err(LedgerError::ExceedsMaxDemand { resource: 0, .. })
        ));
        assert!(matches!(
            Process::new(1, 0, 0, vec![1, 1]).with_allocation(vec![0]),
            Err(LedgerError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_allocate_respects_max() {
        let mut p = proc();
        p.allocate(0, 7).unwrap();
        assert_eq!(p.allocation(), &[7, 1, 0]);
        assert!(p.allocate(0, 1).is_err());
        assert_eq!(p.allocation(), &[7, 1, 0]);
    }

    #[test]
    fn test_release() {
        let mut p = proc();
        p.release(1, 1).unwrap();
        assert_eq!(p.allocation(), &[0, 0, 0]);
        assert_eq!(
            p.release(1, 1),
            Err(LedgerError::InvalidRelease {
                pid: 0,
                resource: 1,
                requested: 1,
                held: 0
            })
        );
        assert!(matches!(p.release(0, 0), Err(LedgerError::ZeroAmount { .. })));
    }

    #[test]
    fn test_pending_requests() {
        let mut p = proc();
        assert!(!p.has_pending_request());
        p.set_request(2, 2).unwrap();
        p.set_request(1, 1).unwrap();
        assert_eq!(p.first_pending_request(), Some((1, 1)));
        p.clear_request(1);
        assert_eq!(p.first_pending_request(), Some((2, 2)));
    }

    #[test]
    fn test_release_all() {
        let mut p = proc();
        p.set_request(0, 3).unwrap();
        let held = p.release_all();
        assert_eq!(held, vec![0, 1, 0]);
        assert_eq!(p.total_held(), 0);
        assert!(!p.has_pending_request());
    }

    #[test]
    fn test_terminal_states() {
        assert!(ProcessState::Finished.is_terminal());
        assert!(ProcessState::Terminated.is_terminal());
        assert!(!ProcessState::Deadlocked.is_terminal());
        assert!(!ProcessState::Waiting.is_terminal());
    }

    #[test]
    fn test_state_serde_names() {
        let json = serde_json::to_string(&ProcessState::Deadlocked).unwrap();
        assert_eq!(json, "\"DEADLOCKED\"");
    }
}
