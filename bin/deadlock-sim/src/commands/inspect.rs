// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `deadlock-sim inspect` command: print a scenario's initial state.
//!
//! Shows the ledger tables, the event schedule, and what the safety and
//! detection algorithms say about the state before step 0. Nothing is
//! simulated.

use std::path::PathBuf;

use deadlock_engine::{detect_deadlock, format_sequence, is_safe_state};
use scenario::ScenarioLoader;

pub fn execute(scenario: PathBuf) -> anyhow::Result<()> {
    super::banner("deadlock-sim · Scenario Inspector");

    let loaded = ScenarioLoader::load(&scenario).map_err(|e| {
        anyhow::anyhow!("failed to load scenario from '{}': {e}", scenario.display())
    })?;

    // ── Summary ────────────────────────────────────────────────
    println!("  Scenario: {}", scenario.display());
    if !loaded.description().is_empty() {
        println!("  {}", loaded.description());
    }
    println!("  {}", loaded.summary());
    println!();

    // ── Ledger ─────────────────────────────────────────────────
    println!("{}", loaded.ledger());

    // ── Schedule ───────────────────────────────────────────────
    println!("  Schedule:");
    for event in loaded.schedule().iter() {
        println!("   {event}");
    }
    println!();

    // ── Verdicts ───────────────────────────────────────────────
    let verdict = is_safe_state(loaded.ledger())?;
    match &verdict.safe_sequence {
        Some(sequence) if verdict.is_safe => {
            println!("  Safety:    SAFE, sequence {}", format_sequence(sequence));
        }
        _ => println!("  Safety:    UNSAFE, no safe sequence exists"),
    }

    // Detection marks processes; run it on a copy.
    let mut scratch = loaded.ledger().clone();
    let report = detect_deadlock(&mut scratch)?;
    if report.deadlock_exists() {
        println!("  Detection: DEADLOCK among {:?}", report.deadlocked);
    } else {
        println!("  Detection: no deadlock");
    }
    println!();
    Ok(())
}
