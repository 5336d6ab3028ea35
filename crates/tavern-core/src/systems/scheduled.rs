//! Scheduled Event Dispatch
//!
//! Pops every due entry from the scheduler and applies it. Entries carry ids
//! only; the target is looked up again here, so an entry that outlived its
//! target is dropped quietly.

use tavern_events::EventKind;

use super::context::TavernCtx;
use super::lifecycle::depart_on_schedule;
use crate::scheduler::ScheduledAction;

pub fn fire_due(ctx: &mut TavernCtx) {
    let now = ctx.now();
    let due = ctx.scheduler.poll(now);
    for (token, action) in due {
        match action {
            ScheduledAction::Departure { npc } => depart_on_schedule(ctx, npc),
            ScheduledAction::NeedRefresh { npc, need } => match ctx.registry.npc_mut(npc) {
                Some(record) => record.needs.set(need, true),
                None => tracing::debug!("Dropping {} for missing npc {}", token, npc),
            },
            ScheduledAction::Autosave => ctx.emit(EventKind::AutosaveRequested),
        }
    }
}
