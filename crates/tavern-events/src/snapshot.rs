//! Snapshot Types
//!
//! Flat summaries of tavern state for reporting and analysis. These are not
//! save files: they carry counts and totals only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::SimTime;

/// Generates a snapshot ID with the given sequence number.
pub fn generate_snapshot_id(sequence: u64) -> String {
    format!("snap_{:06}", sequence)
}

/// Summary of the tavern at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TavernSnapshot {
    pub snapshot_id: String,
    pub timestamp: SimTime,
    pub gold: i64,
    pub renown: f32,
    /// Guests per lifecycle state name
    #[serde(default)]
    pub guests_by_state: BTreeMap<String, usize>,
    #[serde(default)]
    pub seats_taken: usize,
    #[serde(default)]
    pub seats_total: usize,
    #[serde(default)]
    pub quests: QuestSummary,
    #[serde(default)]
    pub mean_loyalty: f32,
}

impl TavernSnapshot {
    /// Number of guests currently in the given state.
    pub fn guests_in(&self, state: &str) -> usize {
        self.guests_by_state.get(state).copied().unwrap_or(0)
    }
}

/// Quest board totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestSummary {
    pub posted: usize,
    pub in_progress: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub backlog: usize,
}
