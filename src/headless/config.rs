//! JSON configuration parsing for headless scenarios
//!
//! Describes a scenario: which archetypes spawn where, the RNG seed,
//! and run limits.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::UnitDefs;

/// One unit placement in a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Archetype id from the unit table
    pub archetype: String,
    /// Spawn position in arena coordinates
    pub position: [f32; 2],
}

/// Headless scenario configuration loaded from JSON
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// The player unit (optional; hostile-only scenarios are legal)
    #[serde(default)]
    pub player: Option<SpawnEntry>,
    /// Hostile units
    #[serde(default)]
    pub hostiles: Vec<SpawnEntry>,
    /// Drive the player with the built-in autopilot (default: true)
    #[serde(default = "default_autopilot")]
    pub autopilot: bool,
    /// Random seed for deterministic scenario reproduction
    #[serde(default)]
    pub seed: Option<u64>,
    /// Maximum scenario duration in seconds (default: 300)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Custom output path for the combat log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
}

fn default_autopilot() -> bool {
    true
}

fn default_max_duration() -> f32 {
    300.0
}

impl ScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: ScenarioConfig =
            serde_json::from_str(&contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Structural validation; archetype ids are checked against the
    /// unit table separately, once it is loaded.
    pub fn validate(&self) -> Result<(), String> {
        if self.player.is_none() && self.hostiles.is_empty() {
            return Err("scenario spawns no units".to_string());
        }
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }
        Ok(())
    }

    /// Check every referenced archetype against the loaded unit table.
    pub fn validate_against(&self, defs: &UnitDefs) -> Result<(), String> {
        for entry in self.player.iter().chain(self.hostiles.iter()) {
            if !defs.contains(&entry.archetype) {
                return Err(format!(
                    "scenario references unknown archetype '{}'",
                    entry.archetype
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_scenario() {
        let json = r#"{
            "player": { "archetype": "swordsman", "position": [0.0, 0.0] },
            "hostiles": [ { "archetype": "grunt", "position": [5.0, 0.0] } ],
            "seed": 42
        }"#;
        let config: ScenarioConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(config.autopilot);
        assert_eq!(config.max_duration_secs, 300.0);
        assert_eq!(config.hostiles.len(), 1);
    }

    #[test]
    fn empty_scenario_is_rejected() {
        let config: ScenarioConfig = serde_json::from_str("{}").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn nonpositive_duration_is_rejected() {
        let json = r#"{
            "hostiles": [ { "archetype": "grunt", "position": [0.0, 0.0] } ],
            "max_duration_secs": 0.0
        }"#;
        let config: ScenarioConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }
}
