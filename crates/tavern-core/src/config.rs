//! Configuration System
//!
//! Loads tuning parameters from `tavern.toml`. Every section and field has a
//! default, so a partial file (or none at all) is valid.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default tuning file path
pub const DEFAULT_CONFIG_PATH: &str = "tavern.toml";

/// Top-level configuration
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TavernConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub hours: HoursConfig,
    #[serde(default)]
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub guests: GuestConfig,
    #[serde(default)]
    pub quests: QuestConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
}

impl TavernConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the default file, or falls back to built-in defaults.
    pub fn load_or_default() -> Self {
        Self::from_file(Path::new(DEFAULT_CONFIG_PATH)).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_CONFIG_PATH, e);
            Self::default()
        })
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects hour layouts and ranges the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let h = &self.hours;
        if !(h.opening_hour < h.last_call_hour && h.last_call_hour <= h.closing_hour && h.closing_hour < 24) {
            return Err(ConfigError::Invalid(format!(
                "hours must satisfy opening < last_call <= closing < 24 (got {}/{}/{})",
                h.opening_hour, h.last_call_hour, h.closing_hour
            )));
        }
        if self.guests.linger_min_minutes > self.guests.linger_max_minutes {
            return Err(ConfigError::Invalid("linger_min_minutes exceeds linger_max_minutes".into()));
        }
        if self.guests.wait_tolerance_min_hours > self.guests.wait_tolerance_max_hours {
            return Err(ConfigError::Invalid(
                "wait_tolerance_min_hours exceeds wait_tolerance_max_hours".into(),
            ));
        }
        if self.quests.task_time_min > self.quests.task_time_max
            || self.quests.deadline_padding_min > self.quests.deadline_padding_max
        {
            return Err(ConfigError::Invalid("quest time ranges are inverted".into()));
        }
        Ok(())
    }
}

/// Run-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Emit an autosave request at every opening
    pub autosave: bool,
    /// NPCs generated for a fresh run
    pub roster_size: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            autosave: true,
            roster_size: 24,
        }
    }
}

/// Daily boundaries, as hours of the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoursConfig {
    pub opening_hour: u32,
    pub last_call_hour: u32,
    pub closing_hour: u32,
}

impl Default for HoursConfig {
    fn default() -> Self {
        Self {
            opening_hour: 8,
            last_call_hour: 22,
            closing_hour: 23,
        }
    }
}

impl HoursConfig {
    /// Whether admissions are allowed at this hour.
    pub fn is_open_at(&self, hour: u32) -> bool {
        hour >= self.opening_hour && hour < self.last_call_hour
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityConfig {
    pub floor_capacity: usize,
    pub staging_capacity: usize,
    /// Seat count of each table
    pub tables: Vec<usize>,
    pub quest_board_slots: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            floor_capacity: 12,
            staging_capacity: 4,
            tables: vec![4, 4, 2, 2],
            quest_board_slots: 6,
        }
    }
}

/// Visit planning and needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestConfig {
    pub linger_min_minutes: u32,
    pub linger_max_minutes: u32,
    pub wait_tolerance_min_hours: u32,
    pub wait_tolerance_max_hours: u32,
    /// Linger bonus per point of renown
    pub renown_linger_bonus: f32,
    /// Cap on the renown linger bonus
    pub max_linger_bonus: f32,
    /// Minutes before a satisfied need comes back
    pub need_refresh_minutes: u32,
    pub hungry_only_weight: f32,
    pub thirsty_only_weight: f32,
    pub both_needs_weight: f32,
}

impl Default for GuestConfig {
    fn default() -> Self {
        Self {
            linger_min_minutes: 60,
            linger_max_minutes: 180,
            wait_tolerance_min_hours: 1,
            wait_tolerance_max_hours: 3,
            renown_linger_bonus: 0.005,
            max_linger_bonus: 0.5,
            need_refresh_minutes: 90,
            hungry_only_weight: 0.4,
            thirsty_only_weight: 0.4,
            both_needs_weight: 0.2,
        }
    }
}

/// Quest generation ranges, in time units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    pub task_time_min: u32,
    pub task_time_max: u32,
    pub deadline_padding_min: u32,
    pub deadline_padding_max: u32,
    /// Class whose presence shortens travel
    pub support_class: String,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            task_time_min: 1,
            task_time_max: 4,
            deadline_padding_min: 1,
            deadline_padding_max: 3,
            support_class: "bard".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub starting_gold: i64,
    pub starting_renown: f32,
    /// Units of each menu item stocked on a fresh run
    pub starting_stock: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_gold: 100,
            starting_renown: 10.0,
            starting_stock: 20,
        }
    }
}

/// Errors that can occur loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TavernConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hours.opening_hour, 8);
        assert_eq!(config.capacity.tables, vec![4, 4, 2, 2]);
        assert_eq!(config.quests.support_class, "bard");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = TavernConfig::from_str(
            r#"
            [simulation]
            seed = 7

            [capacity]
            floor_capacity = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert!(config.simulation.autosave);
        assert_eq!(config.capacity.floor_capacity, 3);
        assert_eq!(config.capacity.staging_capacity, 4);
        assert_eq!(config.guests.need_refresh_minutes, 90);
    }

    #[test]
    fn test_invalid_hours_rejected() {
        let result = TavernConfig::from_str(
            r#"
            [hours]
            opening_hour = 22
            last_call_hour = 8
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = TavernConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(TavernConfig::from_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[economy]\nstarting_gold = 250").unwrap();
        let config = TavernConfig::from_file(file.path()).unwrap();
        assert_eq!(config.economy.starting_gold, 250);
    }

    #[test]
    fn test_is_open_at() {
        let hours = HoursConfig::default();
        assert!(!hours.is_open_at(7));
        assert!(hours.is_open_at(8));
        assert!(hours.is_open_at(21));
        assert!(!hours.is_open_at(22));
    }
}
