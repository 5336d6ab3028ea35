//! Save Games
//!
//! Serializable capture of everything needed to resume a tavern. Scheduler
//! entries are not saved; they are rebuilt from guest state on restore.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tavern_events::SimTime;
use thiserror::Error;

use crate::components::guest::NpcRegistry;
use crate::components::quest::QuestBoard;
use crate::components::seating::Seating;
use crate::components::tavern::{Pantry, TavernState};

/// Save format version; bumped whenever the layout changes
pub const SAVE_VERSION: u32 = 1;

/// Errors reading or writing a save
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to access save file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub version: u32,
    pub save_id: String,
    pub now: SimTime,
    pub multiplier: f32,
    pub registry: NpcRegistry,
    pub seating: Seating,
    pub board: QuestBoard,
    pub tavern: TavernState,
    pub pantry: Pantry,
}

impl SaveGame {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a save, rejecting any other format version.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let save: SaveGame = serde_json::from_str(json)?;
        if save.version != SAVE_VERSION {
            return Err(PersistenceError::Version {
                found: save.version,
                expected: SAVE_VERSION,
            });
        }
        Ok(save)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), PersistenceError> {
        fs::write(path, self.to_json()?)?;
        tracing::info!("Saved {} to {}", self.save_id, path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, PersistenceError> {
        let content = fs::read_to_string(path)?;
        let save = Self::from_json(&content)?;
        tracing::info!("Loaded {} from {}", save.save_id, path.display());
        Ok(save)
    }
}

/// Fresh save identifier
pub fn new_save_id() -> String {
    format!("save_{}", uuid::Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn empty_save() -> SaveGame {
        SaveGame {
            version: SAVE_VERSION,
            save_id: new_save_id(),
            now: SimTime::at(2, 14),
            multiplier: 3.0,
            registry: NpcRegistry::new(),
            seating: Seating::new(&[2, 2]),
            board: QuestBoard::new(4),
            tavern: TavernState::new(250, 12.5),
            pantry: Pantry::new(),
        }
    }

    #[test]
    fn test_save_ids_are_unique() {
        let first = new_save_id();
        assert!(first.starts_with("save_"));
        assert_ne!(first, new_save_id());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut save = empty_save();
        save.version = SAVE_VERSION + 1;
        let json = save.to_json().unwrap();
        match SaveGame::from_json(&json) {
            Err(PersistenceError::Version { found, expected }) => {
                assert_eq!(found, SAVE_VERSION + 1);
                assert_eq!(expected, SAVE_VERSION);
            }
            other => panic!("expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tavern_save.json");
        let save = empty_save();
        save.save_to_file(&path).unwrap();
        assert_eq!(SaveGame::load_from_file(&path).unwrap(), save);
    }

    #[test]
    fn test_garbage_is_json_error() {
        assert!(matches!(
            SaveGame::from_json("{ not json"),
            Err(PersistenceError::Json(_))
        ));
    }
}
