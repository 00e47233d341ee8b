// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Raw scenario document as it appears on disk.
//!
//! These structs mirror the JSON one-to-one and carry no invariants. Signed
//! integers are used where the file may contain out-of-range values, so
//! that validation can report them instead of the JSON decoder.

use resource_ledger::Pid;

/// Top-level scenario document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScenarioManifest {
    #[serde(default)]
    pub description: String,
    pub resources: Vec<ResourceSpec>,
    pub processes: Vec<ProcessSpec>,
}

/// One resource type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResourceSpec {
    pub type_id: u32,
    pub total_instances: u32,
}

/// One process with its scripted events.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProcessSpec {
    pub pid: Pid,
    pub priority: i32,
    pub arrival_step: u32,
    pub max_demand: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_allocation: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventSpec>>,
    /// Older request-only format; ignored when `events` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<Vec<RequestSpec>>,
}

/// A scripted event.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EventSpec {
    pub step: u32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

/// A request in the older format.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RequestSpec {
    pub step: u32,
    pub resource_type: i64,
    pub amount: i64,
}

impl From<&RequestSpec> for EventSpec {
    fn from(req: &RequestSpec) -> Self {
        Self {
            step: req.step,
            kind: "request".to_string(),
            resource_type: Some(req.resource_type),
            amount: Some(req.amount),
        }
    }
}

impl ProcessSpec {
    /// The process's events, converting the older `requests` form if that
    /// is all there is.
    pub fn effective_events(&self) -> Vec<EventSpec> {
        match (&self.events, &self.requests) {
            (Some(events), _) => events.clone(),
            (None, Some(requests)) => requests.iter().map(EventSpec::from).collect(),
            (None, None) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "resources": [{"type_id": 0, "total_instances": 3}],
            "processes": [{"pid": 4, "priority": 1, "arrival_step": 2, "max_demand": [3]}]
        }"#;
        let m: ScenarioManifest = serde_json::from_str(json).unwrap();
        assert_eq!(m.description, "");
        assert_eq!(m.processes[0].initial_allocation, None);
        assert!(m.processes[0].effective_events().is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let json = r#"{
            "resources": [{"type_id": 0, "total_instances": 3}],
            "processes": [{"pid": 4, "arrival_step": 2, "max_demand": [3]}]
        }"#;
        let err = serde_json::from_str::<ScenarioManifest>(json).unwrap_err();
        assert!(err.to_string().contains("priority"));
    }

    #[test]
    fn test_legacy_requests_convert() {
        let json = r#"{"pid": 0, "priority": 0, "arrival_step": 0, "max_demand": [2],
                       "requests": [{"step": 3, "resource_type": 0, "amount": 2}]}"#;
        let p: ProcessSpec = serde_json::from_str(json).unwrap();
        let events = p.effective_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "request");
        assert_eq!(events[0].step, 3);
        assert_eq!(events[0].amount, Some(2));
    }

    #[test]
    fn test_events_win_over_requests() {
        let json = r#"{"pid": 0, "priority": 0, "arrival_step": 0, "max_demand": [2],
                       "events": [{"step": 1, "type": "finish"}],
                       "requests": [{"step": 3, "resource_type": 0, "amount": 2}]}"#;
        let p: ProcessSpec = serde_json::from_str(json).unwrap();
        let events = p.effective_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, "finish");
    }
}
