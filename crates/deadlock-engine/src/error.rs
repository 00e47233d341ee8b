// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the deadlock engine.
//!
//! Algorithm failures are [`resource_ledger::LedgerError`]s; this module only
//! covers parsing of the policy enums.

/// A policy name that does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{name}' (expected one of: {expected})")]
pub struct PolicyParseError {
    pub kind: &'static str,
    pub name: String,
    pub expected: &'static str,
}
