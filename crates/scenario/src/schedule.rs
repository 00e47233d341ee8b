// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The step-indexed event schedule.

use std::collections::BTreeMap;
use std::fmt;

use resource_ledger::Pid;

/// What a process does at a scheduled step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduledAction {
    Request { resource: usize, amount: u32 },
    Release { resource: usize, amount: u32 },
    Finish,
}

/// One scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ScheduledEvent {
    pub step: u32,
    pub pid: Pid,
    pub action: ScheduledAction,
}

impl fmt::Display for ScheduledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            ScheduledAction::Request { resource, amount } => {
                write!(f, "Step {}: P{} requests R{resource}[{amount}]", self.step, self.pid)
            }
            ScheduledAction::Release { resource, amount } => {
                write!(f, "Step {}: P{} releases R{resource}[{amount}]", self.step, self.pid)
            }
            ScheduledAction::Finish => write!(f, "Step {}: P{} finishes", self.step, self.pid),
        }
    }
}

/// Events grouped by step, ordered by pid within a step.
///
/// Events of the same process at the same step keep their file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct EventSchedule {
    by_step: BTreeMap<u32, Vec<ScheduledEvent>>,
}

impl EventSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event, keeping pid order within its step.
    pub fn insert(&mut self, event: ScheduledEvent) {
        let bucket = self.by_step.entry(event.step).or_default();
        let at = bucket.partition_point(|e| e.pid <= event.pid);
        bucket.insert(at, event);
    }

    /// Events scheduled for `step`, in pid order.
    pub fn events_at(&self, step: u32) -> &[ScheduledEvent] {
        self.by_step.get(&step).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Last step with an event, or 0 for an empty schedule.
    pub fn max_step(&self) -> u32 {
        self.by_step.keys().next_back().copied().unwrap_or(0)
    }

    /// Total number of events.
    pub fn len(&self) -> usize {
        self.by_step.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_step.is_empty()
    }

    /// All events in step order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.by_step.values().flatten()
    }
}

impl FromIterator<ScheduledEvent> for EventSchedule {
    fn from_iter<I: IntoIterator<Item = ScheduledEvent>>(iter: I) -> Self {
        let mut schedule = Self::new();
        for event in iter {
            schedule.insert(event);
        }
        schedule
    }
}
