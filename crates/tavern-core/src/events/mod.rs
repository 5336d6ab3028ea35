//! Event Recording
//!
//! Pending event queue and the JSONL event log.

pub mod logger;

pub use logger::{EventLog, PendingEvents};
