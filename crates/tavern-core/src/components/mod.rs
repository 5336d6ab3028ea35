//! Tavern Components
//!
//! Resources and records for NPCs, guests, seating, quests, the catalog and
//! the tavern itself.

pub mod catalog;
pub mod guest;
pub mod npc;
pub mod quest;
pub mod seating;
pub mod tavern;

pub use catalog::*;
pub use guest::*;
pub use npc::*;
pub use quest::*;
pub use seating::*;
pub use tavern::*;
