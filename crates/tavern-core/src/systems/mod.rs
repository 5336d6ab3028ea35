//! ECS Systems
//!
//! Tavern logic lives in plain functions over [`TavernCtx`] so the facade can
//! call them directly for external operations. The per-tick pipeline wraps a
//! few of them as bevy systems, run in order after each clock tick.

pub mod consumption;
pub mod context;
pub mod daily;
pub mod lifecycle;
pub mod quests;
pub mod scheduled;

pub use consumption::{restock, sell_item, serve_item, ConsumptionResult};
pub use context::TavernCtx;
pub use daily::{apply_boundaries, reroll_needs};
pub use lifecycle::{
    admit_guest, evict_all, linger_seconds, queue_guest, remove_guest, return_to_tavern,
    seat_guest, send_away_street, tick_guests, unseat_guest,
};
pub use quests::{
    accept_quest, assign_to_quest, dismiss_quest, generate_quest, post_quest, publish_quest,
    resolve_due_quests, retry_quest, unassign_from_quest,
};
pub use scheduled::fire_due;

/// Fires every scheduled event that came due this tick.
pub fn fire_scheduled_events(mut ctx: TavernCtx) {
    fire_due(&mut ctx);
}

/// Opening, last call and closing.
pub fn apply_day_boundaries(mut ctx: TavernCtx) {
    apply_boundaries(&mut ctx);
}

/// Arrivals, admissions and give-ups.
pub fn sweep_guests(mut ctx: TavernCtx) {
    tick_guests(&mut ctx);
}

/// Resolves returning parties and expires stale postings.
pub fn resolve_quests(mut ctx: TavernCtx) {
    resolve_due_quests(&mut ctx);
}
