// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # deadlock-engine
//!
//! Deadlock handling algorithms that operate on a [`resource_ledger::Ledger`].
//!
//! # Policies
//!
//! | Policy | Admission | Detection | Recovery |
//! |---|---|---|---|
//! | [`AllocationPolicy::Avoidance`] | Banker's safety check | never | never |
//! | [`AllocationPolicy::DetectionOnly`] | grant if available | every `interval` steps | halt |
//! | [`AllocationPolicy::DetectionWithRecovery`] | grant if available | every `interval` steps | terminate victims |
//!
//! # Work/Finish
//!
//! Safety and detection share one scan ([`work`]): start from `Work =
//! Available`, repeatedly pick the lowest-index unfinished process whose
//! demand row fits in `Work`, mark it finished and add its allocation back.
//! Safety uses the **Need** row as the demand; detection uses the
//! **Request** row.
//!
//! ```text
//!  Work = Available
//!    │
//!    ├─► first i with !Finish[i] && Demand[i] <= Work ──► Work += Alloc[i]
//!    │        ▲                                              │
//!    │        └────────────── restart scan ◄─────────────────┘
//!    ▼
//!  no progress → stop
//! ```
//!
//! # Example
//! ```
//! use deadlock_engine::{handle_request, is_safe_state};
//! use resource_ledger::{Ledger, Process, ResourceType};
//!
//! let mut ledger = Ledger::new(
//!     vec![ResourceType::new(0, 2)],
//!     vec![Process::new(0, 1, 0, vec![2]), Process::new(1, 1, 0, vec![2])],
//! )
//! .unwrap();
//!
//! assert!(is_safe_state(&ledger).unwrap().is_safe);
//! let outcome = handle_request(&mut ledger, 0, 0, 1).unwrap();
//! assert!(outcome.is_granted());
//!
//! // Granting P1 one instance would leave neither process able to finish.
//! let outcome = handle_request(&mut ledger, 1, 0, 1).unwrap();
//! assert!(!outcome.is_granted());
//! ```

mod admission;
mod detection;
mod error;
mod policy;
pub mod recovery;
mod retry;
mod safety;
pub mod work;

pub use admission::{admit, handle_request, simple_allocation, AdmissionOutcome, Denial};
pub use detection::{detect_deadlock, should_run_detection, DetectionReport};
pub use error::PolicyParseError;
pub use policy::{AllocationPolicy, RecoveryMethod, VictimStrategy};
pub use recovery::{
    preempt_resources, recover_from_deadlock, select_victim, terminate_process, ActionOutcome,
    Preemption, RecoveryReport,
};
pub use retry::{retry_pending_requests, RetryAttempt};
pub use safety::{format_sequence, is_safe_state, SafetyVerdict};
