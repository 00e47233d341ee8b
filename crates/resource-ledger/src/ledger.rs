// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Ledger`]: processes, resources and the cached matrix view.

use std::collections::BTreeSet;
use std::fmt;

use crate::{LedgerError, Matrices, Pid, Process, ProcessState, ResourceType, Snapshot};

/// Single source of truth for a simulated system.
///
/// Owns the processes and resource types. The [`Matrices`] view is a cache
/// rebuilt on demand; any mutable access to the sources marks it stale.
///
/// # Invariants
/// - Every process vector has exactly `num_resources()` slots.
/// - Pids are unique.
/// - Conservation holds after every committed operation (checked, not
///   assumed, by [`assert_conservation`](Self::assert_conservation)).
#[derive(Debug, Clone, serde::Serialize)]
pub struct Ledger {
    resources: Vec<ResourceType>,
    processes: Vec<Process>,
    #[serde(skip)]
    matrices: Matrices,
    #[serde(skip)]
    stale: bool,
}

impl Ledger {
    /// Builds a ledger from fully-allocated resources and initial holdings.
    ///
    /// Every resource starts with all instances free; the sum of the
    /// processes' initial allocations is subtracted from each total.
    pub fn new(
        mut resources: Vec<ResourceType>,
        processes: Vec<Process>,
    ) -> Result<Self, LedgerError> {
        let num_resources = resources.len();
        let mut seen = BTreeSet::new();
        for p in &processes {
            if !seen.insert(p.pid) {
                return Err(LedgerError::DuplicatePid(p.pid));
            }
            if p.num_resources() != num_resources {
                return Err(LedgerError::DimensionMismatch {
                    pid: p.pid,
                    field: "max_demand",
                    expected: num_resources,
                    actual: p.num_resources(),
                });
            }
        }

        for (r, resource) in resources.iter_mut().enumerate() {
            let allocated: u64 = processes.iter().map(|p| u64::from(p.allocation()[r])).sum();
            let total = resource.total_instances();
            if allocated > u64::from(total) {
                return Err(LedgerError::Oversubscribed {
                    resource: r,
                    allocated,
                    total,
                });
            }
            resource.set_available(r, total - allocated as u32)?;
        }

        let matrices = Matrices::build(&resources, &processes);
        let ledger = Self {
            resources,
            processes,
            matrices,
            stale: false,
        };
        ledger.assert_conservation("at construction")?;
        tracing::debug!(
            processes = ledger.num_processes(),
            resources = ledger.num_resources(),
            "ledger initialised"
        );
        Ok(ledger)
    }

    pub fn num_processes(&self) -> usize {
        self.processes.len()
    }

    pub fn num_resources(&self) -> usize {
        self.resources.len()
    }

    pub fn resources(&self) -> &[ResourceType] {
        &self.resources
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Mutable access to the resource types. Marks the matrices stale.
    pub fn resources_mut(&mut self) -> &mut [ResourceType] {
        self.stale = true;
        &mut self.resources
    }

    /// Mutable access to the processes. Marks the matrices stale.
    pub fn processes_mut(&mut self) -> &mut [Process] {
        self.stale = true;
        &mut self.processes
    }

    /// Ledger index of `pid`.
    pub fn process_index(&self, pid: Pid) -> Option<usize> {
        self.processes.iter().position(|p| p.pid == pid)
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.iter().find(|p| p.pid == pid)
    }

    /// Mutable access to one process. Marks the matrices stale.
    pub fn process_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.stale = true;
        self.processes.iter_mut().find(|p| p.pid == pid)
    }

    /// Changes a lifecycle state without touching the matrices.
    ///
    /// States are not part of the matrix view, so the cache stays fresh.
    pub fn set_state(&mut self, index: usize, state: ProcessState) -> Result<(), LedgerError> {
        let count = self.processes.len();
        let process = self
            .processes
            .get_mut(index)
            .ok_or(LedgerError::UnknownIndex { index, count })?;
        process.state = state;
        Ok(())
    }

    /// Moves `amount` instances of `resource` from the pool to the process at
    /// `index`.
    ///
    /// Both sides are checked before either is touched. On success the
    /// matrices are stale.
    pub fn grant(&mut self, index: usize, resource: usize, amount: u32) -> Result<(), LedgerError> {
        let count = self.processes.len();
        let process = self
            .processes
            .get(index)
            .ok_or(LedgerError::UnknownIndex { index, count })?;
        if resource >= self.resources.len() {
            return Err(LedgerError::UnknownResource {
                resource,
                count: self.resources.len(),
            });
        }
        if !process.can_request(resource, amount) {
            return Err(LedgerError::ExceedsMaxDemand {
                pid: process.pid,
                resource,
                allocation: u64::from(process.allocation()[resource]) + u64::from(amount),
                max: process.max_demand()[resource],
            });
        }
        let available = self.resources[resource].available_instances();
        if !self.resources[resource].allocate(amount) {
            return Err(LedgerError::Exhausted {
                resource,
                requested: amount,
                available,
            });
        }
        self.stale = true;
        self.processes[index].allocate(resource, amount)
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Recomputes the matrix view from the sources.
    pub fn rebuild_matrices(&mut self) {
        self.matrices = Matrices::build(&self.resources, &self.processes);
        self.stale = false;
    }

    /// The cached matrix view, or [`LedgerError::StaleMatrices`].
    pub fn matrices(&self) -> Result<&Matrices, LedgerError> {
        if self.stale {
            return Err(LedgerError::StaleMatrices);
        }
        Ok(&self.matrices)
    }

    /// Captures the mutable state. The matrices inside are computed from the
    /// sources, so a stale cache does not leak into the snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            Matrices::build(&self.resources, &self.processes),
            &self.processes,
        )
    }

    /// Puts back every process state, allocation, request, every resource's
    /// available count, and the matrix view captured by [`snapshot`](Self::snapshot).
    ///
    /// The whole snapshot is checked against this ledger before anything is
    /// written, so a rejected snapshot leaves the ledger untouched.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), LedgerError> {
        let targets = self.check_snapshot(snapshot)?;

        for (record, index) in snapshot.records().iter().zip(targets) {
            let process = &mut self.processes[index];
            process.state = record.state;
            process.restore_vectors(&record.allocation, &record.current_request)?;
        }
        for (r, (resource, &available)) in self
            .resources
            .iter_mut()
            .zip(snapshot.matrices().available())
            .enumerate()
        {
            resource.set_available(r, available)?;
        }

        self.matrices = snapshot.matrices().clone();
        self.stale = false;
        Ok(())
    }

    /// Maps every snapshot record to a process index, rejecting anything
    /// [`restore`](Self::restore) could not apply in full.
    fn check_snapshot(&self, snapshot: &Snapshot) -> Result<Vec<usize>, LedgerError> {
        let mismatch = |detail: String| Err(LedgerError::SnapshotMismatch(detail));
        let num_resources = self.resources.len();
        if snapshot.num_processes() != self.processes.len()
            || snapshot.matrices().num_resources() != num_resources
        {
            return mismatch(format!(
                "snapshot is {}x{}, ledger is {}x{}",
                snapshot.num_processes(),
                snapshot.matrices().num_resources(),
                self.processes.len(),
                num_resources
            ));
        }

        let mut targets = Vec::with_capacity(snapshot.num_processes());
        let mut seen = BTreeSet::new();
        for record in snapshot.records() {
            let Some(index) = self.process_index(record.pid) else {
                return mismatch(format!("P{} not in ledger", record.pid));
            };
            if !seen.insert(index) {
                return mismatch(format!("P{} recorded twice", record.pid));
            }
            if record.allocation.len() != num_resources
                || record.current_request.len() != num_resources
            {
                return mismatch(format!("P{} vectors have the wrong length", record.pid));
            }
            let max = self.processes[index].max_demand();
            if let Some(r) = (0..num_resources).find(|&r| record.allocation[r] > max[r]) {
                return mismatch(format!(
                    "P{} holds {} of R{r}, above its max demand {}",
                    record.pid, record.allocation[r], max[r]
                ));
            }
            targets.push(index);
        }

        let available = snapshot.matrices().available();
        if available.len() != num_resources {
            return mismatch(format!(
                "snapshot has {} available counts, ledger has {num_resources} resources",
                available.len()
            ));
        }
        for (r, resource) in self.resources.iter().enumerate() {
            let held: u64 = snapshot
                .records()
                .iter()
                .map(|rec| u64::from(rec.allocation[r]))
                .sum();
            if held + u64::from(available[r]) != u64::from(resource.total_instances()) {
                return mismatch(format!(
                    "R{r}: {held} held + {} available != total {}",
                    available[r],
                    resource.total_instances()
                ));
            }
        }
        Ok(targets)
    }

    /// Checks Σ allocation + available == total for every resource.
    ///
    /// Reads the matrix view, so a stale ledger fails with
    /// [`LedgerError::StaleMatrices`].
    pub fn assert_conservation(&self, context: &str) -> Result<(), LedgerError> {
        let matrices = self.matrices()?;
        for (r, resource) in self.resources.iter().enumerate() {
            let allocated = matrices.allocated_column(r);
            let available = u64::from(matrices.available()[r]);
            let total = u64::from(resource.total_instances());
            if allocated + available != total {
                tracing::error!(resource = r, allocated, available, total, context, "conservation violated");
                return Err(LedgerError::ConservationViolated {
                    context: context.to_string(),
                    resource: r,
                    allocated,
                    available,
                    total,
                });
            }
        }
        Ok(())
    }

    /// Recomputes every available count as total minus held instances.
    ///
    /// Leaves the matrices stale.
    pub fn recompute_available(&mut self) -> Result<(), LedgerError> {
        self.stale = true;
        for (r, resource) in self.resources.iter_mut().enumerate() {
            let allocated: u64 = self
                .processes
                .iter()
                .map(|p| u64::from(p.allocation()[r]))
                .sum();
            let total = resource.total_instances();
            if allocated > u64::from(total) {
                return Err(LedgerError::ConservationViolated {
                    context: "while recomputing available".to_string(),
                    resource: r,
                    allocated,
                    available: 0,
                    total: u64::from(total),
                });
            }
            resource.set_available(r, total - allocated as u32)?;
        }
        Ok(())
    }

    /// Returns `amount` instances of `resource` held by `pid` to the pool.
    ///
    /// Rejected releases leave the ledger untouched. On success the matrices
    /// are rebuilt and conservation is checked.
    pub fn release(&mut self, pid: Pid, resource: usize, amount: u32) -> Result<(), LedgerError> {
        let index = self
            .process_index(pid)
            .ok_or(LedgerError::UnknownProcess(pid))?;
        if resource >= self.resources.len() {
            return Err(LedgerError::UnknownResource {
                resource,
                count: self.resources.len(),
            });
        }
        self.processes[index].release(resource, amount)?;
        self.stale = true;
        self.resources[resource].deallocate(resource, amount)?;
        self.rebuild_matrices();
        self.assert_conservation(&format!("after P{pid} released R{resource}[{amount}]"))
    }

    /// Releases everything `pid` holds, clears its requests and marks it
    /// `FINISHED`. Returns the released vector.
    pub fn finish(&mut self, pid: Pid) -> Result<Vec<u32>, LedgerError> {
        let index = self
            .process_index(pid)
            .ok_or(LedgerError::UnknownProcess(pid))?;
        self.stale = true;
        let released = self.processes[index].release_all();
        for (r, &amount) in released.iter().enumerate() {
            if amount > 0 {
                self.resources[r].deallocate(r, amount)?;
            }
        }
        self.processes[index].state = ProcessState::Finished;
        self.rebuild_matrices();
        self.assert_conservation(&format!("after P{pid} finished"))?;
        Ok(released)
    }

    /// `true` once every process is `FINISHED` or `TERMINATED`.
    pub fn all_processes_done(&self) -> bool {
        self.processes.iter().all(Process::is_finished)
    }

    /// Utilisation over all instances of all resource types, in `[0, 100]`.
    pub fn overall_utilisation(&self) -> f64 {
        let total: u64 = self
            .resources
            .iter()
            .map(|r| u64::from(r.total_instances()))
            .sum();
        if total == 0 {
            return 0.0;
        }
        let allocated: u64 = self
            .resources
            .iter()
            .map(|r| u64::from(r.allocated_instances()))
            .sum();
        allocated as f64 / total as f64 * 100.0
    }

    fn write_table(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        row: impl Fn(&Process) -> Vec<u32>,
    ) -> fmt::Result {
        writeln!(f, "{title}:")?;
        write!(f, "     ")?;
        for r in 0..self.resources.len() {
            write!(f, " R{r:<2}")?;
        }
        writeln!(f)?;
        for p in &self.processes {
            write!(f, "  P{:<3}", p.pid)?;
            for v in row(p) {
                write!(f, " {v:3}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processes:")?;
        for p in &self.processes {
            writeln!(
                f,
                "  P{}: {:<12} (priority={}, arrival={})",
                p.pid, p.state, p.priority, p.arrival_step
            )?;
        }
        write!(f, "Available:")?;
        for (r, resource) in self.resources.iter().enumerate() {
            write!(f, " R{r}:{:2}", resource.available_instances())?;
        }
        writeln!(f)?;
        self.write_table(f, "Allocation", |p| p.allocation().to_vec())?;
        self.write_table(f, "Max", |p| p.max_demand().to_vec())?;
        self.write_table(f, "Need", Process::need_vector)?;
        self.write_table(f, "Request", |p| p.current_request().to_vec())
    }
}
