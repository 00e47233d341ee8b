// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Admission control: the Banker's request handler and simple allocation.
//!
//! Both entry points share the same validation and the same "park the
//! request" path for processes that cannot be served yet. They differ only
//! in whether a grant must keep the system in a safe state.
//!
//! ```text
//!   validate ──✗──► Denied (no mutation)
//!      │
//!   amount > available ──► park: Request[r] = amount, WAITING
//!      │
//!   Avoidance: tentative grant ─► is_safe_state ─┬─ safe   ─► commit
//!                                                └─ unsafe ─► roll back, park
//!   Simple:    commit
//! ```

use std::fmt;

use resource_ledger::{Ledger, LedgerError, Pid, ProcessState};

use crate::safety::{format_sequence, is_safe_state};
use crate::AllocationPolicy;

/// Why a request was not granted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Denial {
    UnknownProcess { pid: Pid },
    UnknownResource { resource: usize, count: usize },
    InactiveProcess { pid: Pid, state: ProcessState },
    InvalidAmount { amount: u32 },
    ExceedsNeed { requested: u32, need: u32 },
    Insufficient { requested: u32, available: u32 },
    Unsafe,
}

impl Denial {
    /// `true` when the request was parked and will be retried.
    pub fn leaves_pending(&self) -> bool {
        matches!(self, Self::Insufficient { .. } | Self::Unsafe)
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProcess { pid } => write!(f, "Process P{pid} not found"),
            Self::UnknownResource { resource, count } => {
                write!(f, "Invalid resource type R{resource} ({count} types)")
            }
            Self::InactiveProcess { pid, state } => {
                write!(f, "Process P{pid} is {state} and cannot request resources")
            }
            Self::InvalidAmount { amount } => write!(f, "Invalid request amount: {amount}"),
            Self::ExceedsNeed { requested, need } => {
                write!(f, "Request exceeds need (requested: {requested}, need: {need})")
            }
            Self::Insufficient {
                requested,
                available,
            } => write!(
                f,
                "Insufficient resources (requested: {requested}, available: {available}) - Process enters WAITING"
            ),
            Self::Unsafe => f.write_str(
                "DENIED (Unsafe state detected) - Process enters WAITING, request remains pending",
            ),
        }
    }
}

/// Result of one admission decision.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionOutcome {
    /// Granted by the Banker's check, with the witness safe sequence.
    GrantedSafe { sequence: Vec<Pid> },
    /// Granted by simple allocation.
    GrantedAvailable,
    Denied(Denial),
}

impl AdmissionOutcome {
    pub fn is_granted(&self) -> bool {
        !matches!(self, Self::Denied(_))
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Denied(denial) => Some(denial),
            _ => None,
        }
    }

    /// Human-readable reason string.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// The reason without its `GRANTED (..)` / `DENIED (..)` wrapper.
    pub fn detail(&self) -> String {
        match self {
            Self::GrantedSafe { sequence } => format!(
                "Safe state maintained, sequence: {}",
                format_sequence(sequence)
            ),
            Self::GrantedAvailable => "Resources available".to_string(),
            Self::Denied(Denial::Unsafe) => {
                "Unsafe state detected - Process enters WAITING, request remains pending".to_string()
            }
            Self::Denied(denial) => denial.to_string(),
        }
    }
}

impl fmt::Display for AdmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GrantedSafe { sequence } => write!(
                f,
                "GRANTED (Safe state maintained, sequence: {})",
                format_sequence(sequence)
            ),
            Self::GrantedAvailable => f.write_str("GRANTED (Resources available)"),
            Self::Denied(denial) => denial.fmt(f),
        }
    }
}

/// Handles a request under the Banker's avoidance policy.
///
/// On any denial the queried resource's allocation and available count are
/// exactly what they were before the call; other resource types are never
/// touched. Errors are fatal ledger integrity failures only.
pub fn handle_request(
    ledger: &mut Ledger,
    pid: Pid,
    resource: usize,
    amount: u32,
) -> Result<AdmissionOutcome, LedgerError> {
    let index = match validate(ledger, pid, resource, amount) {
        Ok(index) => index,
        Err(denial) => return Ok(reject(pid, resource, amount, denial)),
    };

    let available = ledger.resources()[resource].available_instances();
    if amount > available {
        return park(
            ledger,
            index,
            resource,
            amount,
            Denial::Insufficient {
                requested: amount,
                available,
            },
        );
    }

    let old_allocation = ledger.processes()[index].allocation()[resource];
    ledger.grant(index, resource, amount)?;
    ledger.rebuild_matrices();

    let verdict = is_safe_state(ledger)?;
    match verdict.safe_sequence {
        Some(sequence) => {
            commit(ledger, index, pid, resource, amount)?;
            tracing::debug!(pid, resource, amount, sequence = %format_sequence(&sequence), "request granted");
            Ok(AdmissionOutcome::GrantedSafe { sequence })
        }
        None => {
            ledger.processes_mut()[index].set_allocation(resource, old_allocation)?;
            ledger.resources_mut()[resource].set_available(resource, available)?;
            tracing::debug!(pid, resource, amount, "request would leave the system unsafe");
            park(ledger, index, resource, amount, Denial::Unsafe)
        }
    }
}

/// Grants a request whenever enough instances are free, without a safety
/// check. Used by the detection-based policies.
pub fn simple_allocation(
    ledger: &mut Ledger,
    pid: Pid,
    resource: usize,
    amount: u32,
) -> Result<AdmissionOutcome, LedgerError> {
    let index = match validate(ledger, pid, resource, amount) {
        Ok(index) => index,
        Err(denial) => return Ok(reject(pid, resource, amount, denial)),
    };

    let available = ledger.resources()[resource].available_instances();
    if amount > available {
        return park(
            ledger,
            index,
            resource,
            amount,
            Denial::Insufficient {
                requested: amount,
                available,
            },
        );
    }

    ledger.grant(index, resource, amount)?;
    commit(ledger, index, pid, resource, amount)?;
    tracing::debug!(pid, resource, amount, "request granted without safety check");
    Ok(AdmissionOutcome::GrantedAvailable)
}

/// Dispatches to [`handle_request`] or [`simple_allocation`] by policy.
pub fn admit(
    ledger: &mut Ledger,
    policy: AllocationPolicy,
    pid: Pid,
    resource: usize,
    amount: u32,
) -> Result<AdmissionOutcome, LedgerError> {
    match policy {
        AllocationPolicy::Avoidance => handle_request(ledger, pid, resource, amount),
        AllocationPolicy::DetectionOnly | AllocationPolicy::DetectionWithRecovery => {
            simple_allocation(ledger, pid, resource, amount)
        }
    }
}

fn validate(ledger: &Ledger, pid: Pid, resource: usize, amount: u32) -> Result<usize, Denial> {
    let index = ledger
        .process_index(pid)
        .ok_or(Denial::UnknownProcess { pid })?;
    if resource >= ledger.num_resources() {
        return Err(Denial::UnknownResource {
            resource,
            count: ledger.num_resources(),
        });
    }
    let process = &ledger.processes()[index];
    if process.is_finished() {
        return Err(Denial::InactiveProcess {
            pid,
            state: process.state,
        });
    }
    if amount == 0 {
        return Err(Denial::InvalidAmount { amount });
    }
    let need = process.need(resource);
    if amount > need {
        return Err(Denial::ExceedsNeed {
            requested: amount,
            need,
        });
    }
    Ok(index)
}

fn reject(pid: Pid, resource: usize, amount: u32, denial: Denial) -> AdmissionOutcome {
    tracing::debug!(pid, resource, amount, %denial, "request rejected");
    AdmissionOutcome::Denied(denial)
}

/// Records the request as pending and moves the process to `WAITING`.
fn park(
    ledger: &mut Ledger,
    index: usize,
    resource: usize,
    amount: u32,
    denial: Denial,
) -> Result<AdmissionOutcome, LedgerError> {
    ledger.processes_mut()[index].set_request(resource, amount)?;
    ledger.set_state(index, ProcessState::Waiting)?;
    ledger.rebuild_matrices();
    Ok(AdmissionOutcome::Denied(denial))
}

fn commit(
    ledger: &mut Ledger,
    index: usize,
    pid: Pid,
    resource: usize,
    amount: u32,
) -> Result<(), LedgerError> {
    ledger.processes_mut()[index].clear_request(resource);
    if ledger.processes()[index].state == ProcessState::Waiting {
        ledger.set_state(index, ProcessState::Ready)?;
    }
    ledger.rebuild_matrices();
    ledger.assert_conservation(&format!("after granting R{resource}[{amount}] to P{pid}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::tests::classic;
    use resource_ledger::{Process, ResourceType};

    fn pair() -> Ledger {
        Ledger::new(
            vec![ResourceType::new(0, 2)],
            vec![Process::new(0, 1, 0, vec![2]), Process::new(1, 2, 0, vec![2])],
        )
        .unwrap()
    }

    #[test]
    fn test_exceeds_need_changes_nothing() {
        let mut ledger = Ledger::new(
            vec![ResourceType::new(0, 3), ResourceType::new(1, 3)],
            vec![Process::new(0, 0, 0, vec![1, 2])
                .with_allocation(vec![0, 1])
                .unwrap()],
        )
        .unwrap();
        let before = ledger.matrices().unwrap().clone();

        let outcome = handle_request(&mut ledger, 0, 1, 2).unwrap();
        assert_eq!(
            outcome.reason(),
            "Request exceeds need (requested: 2, need: 1)"
        );
        assert_eq!(ledger.matrices().unwrap(), &before);
        assert_eq!(ledger.processes()[0].state, ProcessState::Ready);
    }

    #[test]
    fn test_zero_amount() {
        let mut ledger = pair();
        let outcome = handle_request(&mut ledger, 0, 0, 0).unwrap();
        assert_eq!(outcome.reason(), "Invalid request amount: 0");
        assert!(!outcome.denial().unwrap().leaves_pending());
    }

    #[test]
    fn test_unknown_targets() {
        let mut ledger = pair();
        assert_eq!(
            handle_request(&mut ledger, 7, 0, 1).unwrap(),
            AdmissionOutcome::Denied(Denial::UnknownProcess { pid: 7 })
        );
        assert_eq!(
            simple_allocation(&mut ledger, 0, 3, 1).unwrap(),
            AdmissionOutcome::Denied(Denial::UnknownResource {
                resource: 3,
                count: 1
            })
        );
    }

    #[test]
    fn test_terminal_process_is_rejected() {
        let mut ledger = pair();
        ledger.finish(0).unwrap();
        let outcome = handle_request(&mut ledger, 0, 0, 1).unwrap();
        assert!(matches!(
            outcome.denial(),
            Some(Denial::InactiveProcess {
                state: ProcessState::Finished,
                ..
            })
        ));
    }

    #[test]
    fn test_safe_grant_reports_sequence() {
        let mut ledger = pair();
        let outcome = handle_request(&mut ledger, 0, 0, 1).unwrap();
        assert_eq!(outcome, AdmissionOutcome::GrantedSafe { sequence: vec![0, 1] });
        assert_eq!(
            outcome.reason(),
            "GRANTED (Safe state maintained, sequence: P0 -> P1)"
        );
        assert_eq!(outcome.detail(), "Safe state maintained, sequence: P0 -> P1");
        assert_eq!(ledger.matrices().unwrap().available(), &[1]);
        assert_eq!(ledger.processes()[0].allocation(), &[1]);
    }

    #[test]
    fn test_unsafe_request_rolls_back() {
        let mut ledger = pair();
        handle_request(&mut ledger, 0, 0, 1).unwrap();
        let outcome = handle_request(&mut ledger, 1, 0, 1).unwrap();
        assert_eq!(outcome, AdmissionOutcome::Denied(Denial::Unsafe));
        assert!(outcome.detail().starts_with("Unsafe state detected"));

        let p1 = ledger.process(1).unwrap();
        assert_eq!(p1.allocation(), &[0]);
        assert_eq!(p1.current_request(), &[1]);
        assert_eq!(p1.state, ProcessState::Waiting);
        assert_eq!(ledger.resources()[0].available_instances(), 1);
        assert!(!ledger.is_stale());
        ledger.assert_conservation("after rollback").unwrap();
    }

    #[test]
    fn test_insufficient_parks_request() {
        let mut ledger = classic();
        // Available R0 is 3; P2 needs 6.
        let outcome = handle_request(&mut ledger, 2, 0, 4).unwrap();
        assert_eq!(
            outcome.reason(),
            "Insufficient resources (requested: 4, available: 3) - Process enters WAITING"
        );
        assert!(outcome.denial().unwrap().leaves_pending());
        assert_eq!(ledger.matrices().unwrap().request_row(2), &[4, 0, 0]);
        assert_eq!(ledger.process(2).unwrap().state, ProcessState::Waiting);
    }

    #[test]
    fn test_grant_clears_pending_and_wakes_process() {
        let mut ledger = classic();
        handle_request(&mut ledger, 1, 0, 1).unwrap();
        ledger.process_mut(1).unwrap().set_request(2, 2).unwrap();
        ledger.set_state(1, ProcessState::Waiting).unwrap();
        ledger.rebuild_matrices();

        let outcome = handle_request(&mut ledger, 1, 2, 2).unwrap();
        assert!(outcome.is_granted());
        let p1 = ledger.process(1).unwrap();
        assert_eq!(p1.state, ProcessState::Ready);
        assert!(!p1.has_pending_request());
        assert_eq!(ledger.matrices().unwrap().available(), &[2, 3, 0]);
    }

    #[test]
    fn test_simple_allocation_skips_safety() {
        let mut ledger = pair();
        assert_eq!(
            simple_allocation(&mut ledger, 0, 0, 1).unwrap(),
            AdmissionOutcome::GrantedAvailable
        );
        // The Banker's check would refuse this one.
        let outcome = simple_allocation(&mut ledger, 1, 0, 1).unwrap();
        assert_eq!(outcome.reason(), "GRANTED (Resources available)");
        assert_eq!(ledger.matrices().unwrap().available(), &[0]);

        let outcome = simple_allocation(&mut ledger, 0, 0, 1).unwrap();
        assert!(matches!(
            outcome.denial(),
            Some(Denial::Insufficient { requested: 1, available: 0 })
        ));
        assert_eq!(ledger.process(0).unwrap().state, ProcessState::Waiting);
    }

    #[test]
    fn test_admit_dispatches_by_policy() {
        let mut avoid = pair();
        admit(&mut avoid, AllocationPolicy::Avoidance, 0, 0, 1).unwrap();
        assert!(!admit(&mut avoid, AllocationPolicy::Avoidance, 1, 0, 1)
            .unwrap()
            .is_granted());

        let mut detect = pair();
        admit(&mut detect, AllocationPolicy::DetectionOnly, 0, 0, 1).unwrap();
        assert!(admit(&mut detect, AllocationPolicy::DetectionWithRecovery, 1, 0, 1)
            .unwrap()
            .is_granted());
    }
}
