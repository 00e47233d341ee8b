// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the simulator.

/// Errors that abort a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// A ledger invariant was violated mid-run.
    #[error("ledger integrity error: {0}")]
    Ledger(#[from] resource_ledger::LedgerError),

    /// The scenario could not be loaded.
    #[error("scenario error: {0}")]
    Scenario(#[from] scenario::ScenarioError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
