// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Closed policy enums: allocation policy, recovery method, victim strategy.

use std::fmt;
use std::str::FromStr;

use crate::PolicyParseError;

/// How requests are admitted and whether deadlocks are detected.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// Banker's algorithm: grant only if the resulting state is safe.
    #[default]
    Avoidance,
    /// Grant when available; detect and halt on deadlock.
    DetectionOnly,
    /// Grant when available; detect and terminate victims.
    DetectionWithRecovery,
}

impl AllocationPolicy {
    pub const ALL: [Self; 3] = [
        Self::Avoidance,
        Self::DetectionOnly,
        Self::DetectionWithRecovery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avoidance => "avoidance",
            Self::DetectionOnly => "detection_only",
            Self::DetectionWithRecovery => "detection_with_recovery",
        }
    }

    /// `true` for the policies that run the detection engine.
    pub fn detects_deadlocks(self) -> bool {
        match self {
            Self::Avoidance => false,
            Self::DetectionOnly | Self::DetectionWithRecovery => true,
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "avoidance" | "bankers" => Ok(Self::Avoidance),
            "detection_only" | "detection" => Ok(Self::DetectionOnly),
            "detection_with_recovery" | "recovery" => Ok(Self::DetectionWithRecovery),
            _ => Err(PolicyParseError {
                kind: "allocation policy",
                name: s.to_string(),
                expected: "avoidance, detection_only, detection_with_recovery",
            }),
        }
    }
}

/// How a detected deadlock is broken.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMethod {
    #[default]
    Terminate,
    /// Not a complete recovery method; see [`recover_from_deadlock`](crate::recover_from_deadlock).
    Preempt,
}

impl fmt::Display for RecoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Terminate => "terminate",
            Self::Preempt => "preempt",
        })
    }
}

impl FromStr for RecoveryMethod {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise(s).as_str() {
            "terminate" => Ok(Self::Terminate),
            "preempt" => Ok(Self::Preempt),
            _ => Err(PolicyParseError {
                kind: "recovery method",
                name: s.to_string(),
                expected: "terminate, preempt",
            }),
        }
    }
}

/// Which deadlocked process is sacrificed first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VictimStrategy {
    /// Highest `priority` value first.
    #[default]
    Priority,
    /// Fewest held instances first.
    FewestResources,
    /// Latest `arrival_step` first.
    Youngest,
}

impl VictimStrategy {
    /// Parses a strategy name, falling back to [`VictimStrategy::Priority`]
    /// for anything unrecognised.
    pub fn parse_or_default(s: &str) -> Self {
        match normalise(s).as_str() {
            "fewest_resources" => Self::FewestResources,
            "youngest" => Self::Youngest,
            _ => Self::Priority,
        }
    }
}

impl fmt::Display for VictimStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Priority => "priority",
            Self::FewestResources => "fewest_resources",
            Self::Youngest => "youngest",
        })
    }
}

fn normalise(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy_names_and_aliases() {
        assert_eq!("avoidance".parse(), Ok(AllocationPolicy::Avoidance));
        assert_eq!("detection-only".parse(), Ok(AllocationPolicy::DetectionOnly));
        assert_eq!(
            " Detection_With_Recovery ".parse(),
            Ok(AllocationPolicy::DetectionWithRecovery)
        );
        let err = "optimistic".parse::<AllocationPolicy>().unwrap_err();
        assert_eq!(err.name, "optimistic");
        assert!(err.to_string().contains("allocation policy"));
    }

    #[test]
    fn test_display_matches_serde() {
        for policy in AllocationPolicy::ALL {
            let json = serde_json::to_string(&policy).unwrap();
            assert_eq!(json, format!("\"{policy}\""));
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }

    #[test]
    fn test_detects_deadlocks() {
        assert!(!AllocationPolicy::Avoidance.detects_deadlocks());
        assert!(AllocationPolicy::DetectionOnly.detects_deadlocks());
        assert!(AllocationPolicy::DetectionWithRecovery.detects_deadlocks());
    }

    #[test]
    fn test_recovery_method() {
        assert_eq!("terminate".parse(), Ok(RecoveryMethod::Terminate));
        assert_eq!("PREEMPT".parse(), Ok(RecoveryMethod::Preempt));
        assert!("rollback".parse::<RecoveryMethod>().is_err());
    }

    #[test]
    fn test_victim_strategy_falls_back_to_priority() {
        assert_eq!(
            VictimStrategy::parse_or_default("fewest-resources"),
            VictimStrategy::FewestResources
        );
        assert_eq!(VictimStrategy::parse_or_default("youngest"), VictimStrategy::Youngest);
        assert_eq!(VictimStrategy::parse_or_default("oldest"), VictimStrategy::Priority);
    }
}
