// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # scenario
//!
//! Scenario files for the deadlock simulator: the JSON format, validation,
//! and the conversion into a [`resource_ledger::Ledger`] plus an
//! [`EventSchedule`].
//!
//! # File Format
//!
//! ```json
//! {
//!   "description": "Two processes, two resources, opposite lock order",
//!   "resources": [{ "type_id": 0, "total_instances": 1 },
//!                 { "type_id": 1, "total_instances": 1 }],
//!   "processes": [{
//!     "pid": 0, "priority": 1, "arrival_step": 0,
//!     "max_demand": [1, 1],
//!     "initial_allocation": [0, 0],
//!     "events": [
//!       { "step": 0, "type": "request", "resource_type": 0, "amount": 1 },
//!       { "step": 1, "type": "request", "resource_type": 1, "amount": 1 },
//!       { "step": 3, "type": "finish" }
//!     ]
//!   }]
//! }
//! ```
//!
//! `resource_type` in events is the index into the resource list after it
//! has been sorted by `type_id`. The older `requests: [{step, resource_type,
//! amount}]` form is still accepted and read as request events.
//!
//! # Type-State Pattern
//!
//! ```text
//! Scenario<Parsed>     — JSON decoded, nothing checked.
//!       │  .validate()
//!       ▼
//! Scenario<Validated>  — ledger built, schedule grouped by step.
//!       │  .into_parts()
//!       ▼
//! (Ledger, EventSchedule)
//! ```
//!
//! # Example
//! ```
//! use scenario::Scenario;
//!
//! let json = r#"{
//!     "resources": [{ "type_id": 0, "total_instances": 2 }],
//!     "processes": [{ "pid": 0, "priority": 0, "arrival_step": 0, "max_demand": [2],
//!                     "events": [{ "step": 0, "type": "request", "resource_type": 0, "amount": 2 }] }]
//! }"#;
//!
//! let scenario = Scenario::from_json(json).unwrap().validate().unwrap();
//! let (ledger, schedule) = scenario.into_parts();
//! assert_eq!(ledger.num_processes(), 1);
//! assert_eq!(schedule.max_step(), 0);
//! ```

mod error;
mod loader;
pub mod manifest;
pub mod definition;
mod schedule;

pub use error::ScenarioError;
pub use loader::ScenarioLoader;
pub use manifest::ScenarioManifest;
pub use definition::{Parsed, Scenario, ScenarioState, Validated};
pub use schedule::{EventSchedule, ScheduledAction, ScheduledEvent};
