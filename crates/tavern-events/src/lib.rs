//! Tavern Events
//!
//! Simulated time, logged event records and the daily snapshot. Data only;
//! the simulation itself lives in `tavern-core`.

pub mod event;
pub mod snapshot;
pub mod timestamp;

pub use timestamp::{
    ParseDateError, Season, SimDate, SimTime, DAYS_PER_SEASON, DAYS_PER_YEAR, SECONDS_PER_DAY,
    SECONDS_PER_HOUR, SECONDS_PER_MINUTE,
};

pub use event::{generate_event_id, EventKind, EventType, TavernEvent};

pub use snapshot::{generate_snapshot_id, QuestSummary, TavernSnapshot};
