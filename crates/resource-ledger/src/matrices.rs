// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The Banker's matrix view of a ledger.

use crate::{Process, ResourceType};

/// Allocation, Max, Need and Request matrices (one row per process, in
/// ledger order) plus the Available vector.
///
/// Built from the sources by [`Ledger::rebuild_matrices`](crate::Ledger::rebuild_matrices);
/// never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Matrices {
    allocation: Vec<Vec<u32>>,
    max_demand: Vec<Vec<u32>>,
    need: Vec<Vec<u32>>,
    request: Vec<Vec<u32>>,
    available: Vec<u32>,
}

impl Matrices {
    pub(crate) fn build(resources: &[ResourceType], processes: &[Process]) -> Self {
        Self {
            allocation: processes.iter().map(|p| p.allocation().to_vec()).collect(),
            max_demand: processes.iter().map(|p| p.max_demand().to_vec()).collect(),
            need: processes.iter().map(Process::need_vector).collect(),
            request: processes
                .iter()
                .map(|p| p.current_request().to_vec())
                .collect(),
            available: resources.iter().map(ResourceType::available_instances).collect(),
        }
    }

    pub fn num_processes(&self) -> usize {
        self.allocation.len()
    }

    pub fn num_resources(&self) -> usize {
        self.available.len()
    }

    pub fn allocation(&self) -> &[Vec<u32>] {
        &self.allocation
    }

    pub fn max_demand(&self) -> &[Vec<u32>] {
        &self.max_demand
    }

    pub fn need(&self) -> &[Vec<u32>] {
        &self.need
    }

    pub fn request(&self) -> &[Vec<u32>] {
        &self.request
    }

    pub fn available(&self) -> &[u32] {
        &self.available
    }

    pub fn allocation_row(&self, index: usize) -> &[u32] {
        &self.allocation[index]
    }

    pub fn need_row(&self, index: usize) -> &[u32] {
        &self.need[index]
    }

    pub fn request_row(&self, index: usize) -> &[u32] {
        &self.request[index]
    }

    /// Σ_p Allocation[p][resource].
    pub fn allocated_column(&self, resource: usize) -> u64 {
        self.allocation
            .iter()
            .map(|row| u64::from(row[resource]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        let resources = vec![ResourceType::new(0, 4), ResourceType::new(1, 2)];
        let mut p0 = Process::new(0, 0, 0, vec![3, 2])
            .with_allocation(vec![1, 1])
            .unwrap();
        p0.set_request(0, 2).unwrap();
        let p1 = Process::new(1, 0, 0, vec![1, 0]);

        let m = Matrices::build(&resources, &[p0, p1]);
        assert_eq!(m.num_processes(), 2);
        assert_eq!(m.num_resources(), 2);
        assert_eq!(m.need_row(0), &[2, 1]);
        assert_eq!(m.request_row(0), &[2, 0]);
        assert_eq!(m.request_row(1), &[0, 0]);
        assert_eq!(m.allocated_column(0), 1);
        assert_eq!(m.available(), &[4, 2]);
    }
}
