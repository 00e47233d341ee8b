// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # resource-ledger
//!
//! The authoritative bookkeeping for the deadlock simulator: which processes
//! exist, which resource types exist, who holds what, and what is still free.
//!
//! # Key Components
//!
//! - [`ResourceType`]: a resource class with a fixed number of identical
//!   instances and a running count of free ones.
//! - [`Process`]: a simulated process with its declared maximum demand,
//!   current allocation, and outstanding request vector.
//! - [`Matrices`]: the Banker's view of the system (Allocation, Max, Need,
//!   Request, Available) derived from the processes and resources.
//! - [`Ledger`]: owns both collections plus a cached [`Matrices`] and tracks
//!   whether the cache is stale.
//! - [`Snapshot`]: an opaque copy of the mutable state, used to undo a
//!   preemption.
//!
//! # Staleness
//!
//! ```text
//!  processes_mut() / resources_mut() ──► stale = true
//!                                             │
//!                      matrices() ──► Err(StaleMatrices)
//!                                             │
//!  rebuild_matrices() ─────────────────► stale = false
//! ```
//!
//! Every mutable borrow of the sources marks the cache stale. Reading the
//! matrices while stale is an error instead of a silent stale read, so the
//! algorithms built on top must rebuild after each mutation they commit.
//!
//! # Conservation
//!
//! For every resource type `r`:
//!
//! ```text
//! Σ_p Allocation[p][r] + Available[r] == total_instances[r]
//! ```
//!
//! [`Ledger::assert_conservation`] checks this and returns a fatal
//! [`LedgerError::ConservationViolated`] naming the resource and the context.
//!
//! # Example
//! ```
//! use resource_ledger::{Ledger, Process, ResourceType};
//!
//! let resources = vec![ResourceType::new(0, 3), ResourceType::new(1, 2)];
//! let processes = vec![
//!     Process::new(0, 1, 0, vec![2, 1]).with_allocation(vec![1, 0]).unwrap(),
//!     Process::new(1, 2, 0, vec![1, 2]),
//! ];
//!
//! let ledger = Ledger::new(resources, processes).unwrap();
//! assert_eq!(ledger.matrices().unwrap().available(), &[2, 2]);
//! assert_eq!(ledger.matrices().unwrap().need_row(0), &[1, 1]);
//! ledger.assert_conservation("example").unwrap();
//! ```

mod error;
mod ledger;
mod matrices;
mod process;
mod resource;
mod snapshot;

pub use error::LedgerError;
pub use ledger::Ledger;
pub use matrices::Matrices;
pub use process::{Pid, Process, ProcessState};
pub use resource::ResourceType;
pub use snapshot::Snapshot;
