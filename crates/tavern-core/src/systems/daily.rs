//! Daily Boundaries
//!
//! Opening, last call and closing. Each runs at most once per day, guarded by
//! the day flags on `TavernState`.

use tavern_events::EventKind;

use super::context::TavernCtx;
use super::lifecycle::{evict_all, send_away_street};
use crate::components::npc::NeedKind;
use crate::rng::weighted_pick;
use crate::scheduler::ScheduledAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NeedRoll {
    HungryOnly,
    ThirstyOnly,
    Both,
}

/// Runs whichever daily boundaries are due at the current time.
pub fn apply_boundaries(ctx: &mut TavernCtx) {
    let now = ctx.now();
    let day = now.day_index();
    let hour = now.hour();
    let hours = ctx.config.hours.clone();

    if ctx.tavern.flags.day != Some(day) {
        ctx.tavern.begin_day(day);
        ctx.emit(EventKind::DayStarted { day });
        tracing::info!("Day {} begins ({})", day, now.date());
    }

    if hour >= hours.opening_hour && hour < hours.last_call_hour && !ctx.tavern.flags.opened {
        open_tavern(ctx, day);
    }

    if hour >= hours.last_call_hour && !ctx.tavern.flags.last_call {
        ctx.tavern.flags.last_call = true;
        ctx.tavern.open = false;
        let sent_away = send_away_street(ctx);
        ctx.emit(EventKind::LastCall { sent_away });
        tracing::info!("Last call: {} guests sent away from the door", sent_away);
    }

    if hour >= hours.closing_hour && !ctx.tavern.flags.closed {
        ctx.tavern.flags.closed = true;
        ctx.tavern.open = false;
        let evicted = evict_all(ctx);
        ctx.emit(EventKind::TavernClosed { evicted });
        tracing::info!("Closing: {} guests evicted", evicted);
    }
}

fn open_tavern(ctx: &mut TavernCtx, day: u64) {
    ctx.tavern.flags.opened = true;
    ctx.tavern.open = true;
    reroll_needs(ctx);
    if ctx.config.simulation.autosave {
        let now = ctx.now();
        ctx.scheduler.schedule(now, ScheduledAction::Autosave);
    }
    ctx.emit(EventKind::TavernOpened { day });
    tracing::info!("Tavern opens for day {}", day);
}

/// Gives every NPC a fresh hunger/thirst split for the day.
pub fn reroll_needs(ctx: &mut TavernCtx) {
    let tuning = ctx.config.guests.clone();
    let weights = [
        (NeedRoll::HungryOnly, tuning.hungry_only_weight),
        (NeedRoll::ThirstyOnly, tuning.thirsty_only_weight),
        (NeedRoll::Both, tuning.both_needs_weight),
    ];

    let TavernCtx { registry, rng, .. } = ctx;
    for npc in registry.npcs_mut() {
        let roll = weighted_pick(&mut rng.0, &weights).unwrap_or(NeedRoll::Both);
        npc.needs.set(NeedKind::Hunger, roll != NeedRoll::ThirstyOnly);
        npc.needs.set(NeedKind::Thirst, roll != NeedRoll::HungryOnly);
    }
}
