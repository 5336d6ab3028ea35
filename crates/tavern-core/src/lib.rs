//! Tavern Simulation Library
//!
//! Discrete-event simulation of a fantasy tavern: a one-second clock with a
//! scheduled-event queue, the guest visit lifecycle, the quest pipeline and
//! the consumption economy. [`Tavern`] is the entry point.

pub mod autopilot;
pub mod clock;
pub mod components;
pub mod config;
pub mod economy;
pub mod error;
pub mod events;
pub mod persistence;
pub mod rng;
pub mod scheduler;
pub mod setup;
pub mod sim;
pub mod systems;

pub use components::*;

pub use clock::SimClock;
pub use config::{ConfigError, TavernConfig};
pub use error::{TavernError, TavernResult};
pub use events::{EventLog, PendingEvents};
pub use persistence::{PersistenceError, SaveGame, SAVE_VERSION};
pub use rng::SimRng;
pub use scheduler::{EventScheduler, EventToken, ScheduledAction};
pub use sim::Tavern;
pub use systems::{ConsumptionResult, TavernCtx};
