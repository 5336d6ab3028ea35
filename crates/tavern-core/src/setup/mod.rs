//! Tavern Setup
//!
//! Default content and roster spawning.

pub mod catalog;
pub mod roster;

pub use catalog::*;
pub use roster::*;
