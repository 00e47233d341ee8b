// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Loading scenarios from disk.

use std::path::Path;

use crate::{Parsed, Scenario, ScenarioError, Validated};

/// Reads scenario files.
///
/// # Example
/// ```no_run
/// use scenario::ScenarioLoader;
/// use std::path::Path;
///
/// let scenario = ScenarioLoader::load(Path::new("scenarios/circular_wait.json")).unwrap();
/// println!("{}", scenario.summary());
/// ```
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Reads and validates a scenario file.
    pub fn load(path: &Path) -> Result<Scenario<Validated>, ScenarioError> {
        let scenario = Self::read(path)?;
        tracing::debug!(path = %path.display(), "validating scenario");
        scenario.validate()
    }

    /// Reads a scenario file without validating it.
    pub fn read(path: &Path) -> Result<Scenario<Parsed>, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Scenario::from_json(&text)
    }

    /// The scenario's description, or an empty string if the file cannot be
    /// read or decoded.
    pub fn description(path: &Path) -> String {
        Self::read(path)
            .map(|s| s.description().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = ScenarioLoader::load(Path::new("/nonexistent/scenario.json")).unwrap_err();
        assert!(matches!(err, ScenarioError::Read(_)));
        assert_eq!(ScenarioLoader::description(Path::new("/nonexistent/scenario.json")), "");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = std::env::temp_dir().join(format!("scenario-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tiny.json");
        std::fs::write(
            &path,
            r#"{"description": "tiny",
                "resources": [{"type_id": 0, "total_instances": 1}],
                "processes": [{"pid": 0, "priority": 0, "arrival_step": 0, "max_demand": [1]}]}"#,
        )
        .unwrap();

        let scenario = ScenarioLoader::load(&path).unwrap();
        assert_eq!(scenario.description(), "tiny");
        assert_eq!(ScenarioLoader::description(&path), "tiny");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
