// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Structured log of everything that happened during a run.

use std::fmt;

use resource_ledger::Pid;

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Allocation,
    Denial,
    Release,
    Finish,
    Deadlock,
    Recovery,
}

/// One entry in the [`EventLog`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulationEvent {
    pub step: u32,
    pub kind: EventKind,
    /// `None` for system-wide events (deadlock detection).
    pub pid: Option<Pid>,
    pub resource: Option<usize>,
    pub amount: Option<u32>,
    pub message: String,
    /// Set when an allocation/denial came from re-trying a parked request.
    #[serde(default)]
    pub retry: bool,
}

impl SimulationEvent {
    /// A granted request. `detail` is the reason without its wrapper.
    pub fn allocation(
        step: u32,
        pid: Pid,
        resource: usize,
        amount: u32,
        detail: String,
        retry: bool,
    ) -> Self {
        Self {
            step,
            kind: EventKind::Allocation,
            pid: Some(pid),
            resource: Some(resource),
            amount: Some(amount),
            message: detail,
            retry,
        }
    }

    pub fn denial(
        step: u32,
        pid: Pid,
        resource: usize,
        amount: u32,
        detail: String,
        retry: bool,
    ) -> Self {
        Self {
            kind: EventKind::Denial,
            ..Self::allocation(step, pid, resource, amount, detail, retry)
        }
    }

    pub fn release(step: u32, pid: Pid, resource: usize, amount: u32) -> Self {
        Self {
            step,
            kind: EventKind::Release,
            pid: Some(pid),
            resource: Some(resource),
            amount: Some(amount),
            message: String::new(),
            retry: false,
        }
    }

    pub fn finish(step: u32, pid: Pid) -> Self {
        Self {
            step,
            kind: EventKind::Finish,
            pid: Some(pid),
            resource: None,
            amount: None,
            message: "Process completed execution".to_string(),
            retry: false,
        }
    }

    /// System-wide detection result naming the deadlocked set.
    pub fn deadlock(step: u32, deadlocked: &[Pid]) -> Self {
        Self {
            step,
            kind: EventKind::Deadlock,
            pid: None,
            resource: None,
            amount: None,
            message: format!("Deadlock detected - processes: {deadlocked:?}"),
            retry: false,
        }
    }

    pub fn recovery(step: u32, victim: Pid, message: String) -> Self {
        Self {
            step,
            kind: EventKind::Recovery,
            pid: Some(victim),
            resource: None,
            amount: None,
            message,
            retry: false,
        }
    }
}

impl fmt::Display for SimulationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: ", self.step)?;
        match self.pid {
            Some(pid) => write!(f, "P{pid}")?,
            None => f.write_str("SYSTEM")?,
        }
        let verb = if self.retry { "retries" } else { "requests" };
        let target = || {
            format!(
                "R{}[{}]",
                self.resource.unwrap_or_default(),
                self.amount.unwrap_or_default()
            )
        };
        match self.kind {
            EventKind::Allocation => {
                write!(f, " {verb} {} - GRANTED ({})", target(), self.message)
            }
            EventKind::Denial => write!(f, " {verb} {} - DENIED ({})", target(), self.message),
            EventKind::Release => write!(f, " releases {}", target()),
            EventKind::Finish => write!(f, " - FINISHED ({})", self.message),
            EventKind::Deadlock => write!(f, " - DEADLOCK DETECTED ({})", self.message),
            EventKind::Recovery => write!(f, " - RECOVERY ({})", self.message),
        }
    }
}

/// Append-only list of [`SimulationEvent`]s in the order they occurred.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<SimulationEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: SimulationEvent) {
        tracing::debug!(step = event.step, kind = ?event.kind, "{event}");
        self.events.push(event);
    }

    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn at_step(&self, step: u32) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter().filter(move |e| e.step == step)
    }

    /// Events naming `pid`.
    pub fn for_process(&self, pid: Pid) -> impl Iterator<Item = &SimulationEvent> {
        self.events.iter().filter(move |e| e.pid == Some(pid))
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.of_kind(kind).count()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Display for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{event}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let granted =
            SimulationEvent::allocation(3, 1, 0, 2, "Resources available".into(), false);
        assert_eq!(
            granted.to_string(),
            "Step 3: P1 requests R0[2] - GRANTED (Resources available)"
        );

        let denied = SimulationEvent::denial(4, 2, 1, 1, "Invalid request amount: 0".into(), true);
        assert_eq!(
            denied.to_string(),
            "Step 4: P2 retries R1[1] - DENIED (Invalid request amount: 0)"
        );

        assert_eq!(
            SimulationEvent::release(5, 0, 2, 3).to_string(),
            "Step 5: P0 releases R2[3]"
        );
        assert_eq!(
            SimulationEvent::finish(6, 0).to_string(),
            "Step 6: P0 - FINISHED (Process completed execution)"
        );
        assert_eq!(
            SimulationEvent::deadlock(1, &[0, 1]).to_string(),
            "Step 1: SYSTEM - DEADLOCK DETECTED (Deadlock detected - processes: [0, 1])"
        );
        assert_eq!(
            SimulationEvent::recovery(1, 1, "RECOVERY: Terminated P1".into()).to_string(),
            "Step 1: P1 - RECOVERY (RECOVERY: Terminated P1)"
        );
    }

    #[test]
    fn test_log_filters() {
        let mut log = EventLog::new();
        log.add(SimulationEvent::allocation(0, 0, 0, 1, "x".into(), false));
        log.add(SimulationEvent::denial(0, 1, 0, 1, "y".into(), false));
        log.add(SimulationEvent::finish(2, 0));

        assert_eq!(log.len(), 3);
        assert_eq!(log.count(EventKind::Denial), 1);
        assert_eq!(log.count(EventKind::Deadlock), 0);
        assert_eq!(log.at_step(0).count(), 2);
        assert_eq!(log.for_process(0).count(), 2);
        assert_eq!(log.to_string().lines().count(), 3);
    }

    #[test]
    fn test_serde_kind_names() {
        let json = serde_json::to_string(&SimulationEvent::finish(2, 4)).unwrap();
        assert!(json.contains("\"kind\":\"finish\""));
        assert!(json.contains("\"pid\":4"));
    }
}
