// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Resource types and their free-instance counters.

use crate::LedgerError;
use std::fmt;

/// A class of identical, non-shareable resource instances.
///
/// `available_instances` never exceeds `total_instances`; the unsigned
/// counter rules out the negative side.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceType {
    type_id: u32,
    total_instances: u32,
    available_instances: u32,
}

impl ResourceType {
    /// Creates a resource type with every instance free.
    pub fn new(type_id: u32, total_instances: u32) -> Self {
        Self {
            type_id,
            total_instances,
            available_instances: total_instances,
        }
    }

    /// Returns the resource type identifier.
    pub fn type_id(&self) -> u32 {
        self.type_id
    }

    /// Returns the fixed number of instances in the system.
    pub fn total_instances(&self) -> u32 {
        self.total_instances
    }

    /// Returns the number of free instances.
    pub fn available_instances(&self) -> u32 {
        self.available_instances
    }

    /// Returns the number of instances currently held by processes.
    pub fn allocated_instances(&self) -> u32 {
        self.total_instances - self.available_instances
    }

    /// Takes `amount` instances out of the free pool.
    ///
    /// Returns `false` and leaves the counter untouched when fewer than
    /// `amount` are free.
    pub fn allocate(&mut self, amount: u32) -> bool {
        match self.available_instances.checked_sub(amount) {
            Some(left) => {
                self.available_instances = left;
                true
            }
            None => false,
        }
    }

    /// Returns `amount` instances to the free pool.
    pub fn deallocate(&mut self, index: usize, amount: u32) -> Result<(), LedgerError> {
        let next = u64::from(self.available_instances) + u64::from(amount);
        if next > u64::from(self.total_instances) {
            return Err(LedgerError::AvailabilityExceedsTotal {
                resource: index,
                available: next,
                total: self.total_instances,
            });
        }
        self.available_instances = next as u32;
        Ok(())
    }

    /// Overwrites the free counter, e.g. to roll back a tentative grant.
    pub fn set_available(&mut self, index: usize, available: u32) -> Result<(), LedgerError> {
        if available > self.total_instances {
            return Err(LedgerError::AvailabilityExceedsTotal {
                resource: index,
                available: u64::from(available),
                total: self.total_instances,
            });
        }
        self.available_instances = available;
        Ok(())
    }

    /// Percentage of instances in use, in `[0, 100]`.
    pub fn utilisation(&self) -> f64 {
        if self.total_instances == 0 {
            return 0.0;
        }
        f64::from(self.allocated_instances()) / f64::from(self.total_instances) * 100.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R{} ({}/{} available)",
            self.type_id, self.available_instances, self.total_instances
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_deallocate() {
        let mut r = ResourceType::new(0, 5);
        assert!(r.allocate(3));
        assert_eq!(r.available_instances(), 2);
        assert_eq!(r.allocated_instances(), 3);
        assert!(!r.allocate(3));
        assert_eq!(r.available_instances(), 2);
        r.deallocate(0, 3).unwrap();
        assert_eq!(r.available_instances(), 5);
    }

    #[test]
    fn test_deallocate_past_total_is_rejected() {
        let mut r = ResourceType::new(1, 2);
        let err = r.deallocate(1, 1).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(r.available_instances(), 2);
    }

    #[test]
    fn test_set_available_bounds() {
        let mut r = ResourceType::new(0, 4);
        r.set_available(0, 1).unwrap();
        assert_eq!(r.available_instances(), 1);
        assert!(r.set_available(0, 5).is_err());
    }

    #[test]
    fn test_utilisation() {
        let mut r = ResourceType::new(0, 4);
        assert_eq!(r.utilisation(), 0.0);
        r.allocate(1);
        assert!((r.utilisation() - 25.0).abs() < 1e-9);
        assert_eq!(ResourceType::new(0, 0).utilisation(), 0.0);
    }

    #[test]
    fn test_display() {
        let r = ResourceType::new(2, 7);
        assert_eq!(r.to_string(), "R2 (7/7 available)");
    }
}
