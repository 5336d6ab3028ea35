//! Event Scheduler
//!
//! A time-ordered queue of one-shot actions. Entries are keyed by
//! `(trigger_time, sequence)`, so equal trigger times fire in registration
//! order. Actions carry entity ids rather than captured state; the
//! dispatcher re-looks-up the entity when the action fires.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tavern_events::SimTime;

use crate::components::npc::{NeedKind, NpcId};

/// Handle for a scheduled action, usable for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventToken(u64);

impl fmt::Display for EventToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// What should happen when a scheduled entry fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// The guest's linger time is up
    Departure { npc: NpcId },
    /// Re-enable a need flag some time after it was satisfied
    NeedRefresh { npc: NpcId, need: NeedKind },
    /// Ask the host to write a save
    Autosave,
}

/// Resource: pending one-shot actions ordered by trigger time.
#[derive(Resource, Debug, Default)]
pub struct EventScheduler {
    queue: BTreeMap<(SimTime, u64), ScheduledAction>,
    /// Trigger time of every pending token, for cancellation
    index: HashMap<EventToken, SimTime>,
    /// The single pending departure of each guest
    departures: HashMap<NpcId, EventToken>,
    /// The single pending refresh of each guest's need
    refreshes: HashMap<(NpcId, NeedKind), EventToken>,
    next_sequence: u64,
    suspended: bool,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action to fire once simulated time reaches `at`.
    pub fn schedule(&mut self, at: SimTime, action: ScheduledAction) -> EventToken {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let token = EventToken(sequence);
        self.queue.insert((at, sequence), action);
        self.index.insert(token, at);
        token
    }

    /// Removes a pending action. Returns false if it already fired or never existed.
    pub fn cancel(&mut self, token: EventToken) -> bool {
        let Some(at) = self.index.remove(&token) else {
            return false;
        };
        match self.queue.remove(&(at, token.0)) {
            Some(action) => {
                self.forget(token, action);
                true
            }
            None => false,
        }
    }

    /// Drops the per-guest handle of an entry that fired or was cancelled.
    fn forget(&mut self, token: EventToken, action: ScheduledAction) {
        match action {
            ScheduledAction::Departure { npc } => {
                if self.departures.get(&npc) == Some(&token) {
                    self.departures.remove(&npc);
                }
            }
            ScheduledAction::NeedRefresh { npc, need } => {
                if self.refreshes.get(&(npc, need)) == Some(&token) {
                    self.refreshes.remove(&(npc, need));
                }
            }
            ScheduledAction::Autosave => {}
        }
    }

    /// Schedules a departure, superseding any departure already pending for this guest.
    pub fn schedule_departure(&mut self, npc: NpcId, at: SimTime) -> EventToken {
        self.cancel_departure(npc);
        let token = self.schedule(at, ScheduledAction::Departure { npc });
        self.departures.insert(npc, token);
        token
    }

    /// Drops the pending departure of a guest, if any.
    pub fn cancel_departure(&mut self, npc: NpcId) -> bool {
        match self.departures.remove(&npc) {
            Some(token) => self.cancel(token),
            None => false,
        }
    }

    /// Schedules a need to come back, superseding an earlier refresh of the
    /// same need.
    pub fn schedule_refresh(&mut self, npc: NpcId, need: NeedKind, at: SimTime) -> EventToken {
        if let Some(old) = self.refreshes.remove(&(npc, need)) {
            self.cancel(old);
        }
        let token = self.schedule(at, ScheduledAction::NeedRefresh { npc, need });
        self.refreshes.insert((npc, need), token);
        token
    }

    pub fn pending_refresh(&self, npc: NpcId, need: NeedKind) -> Option<SimTime> {
        self.refreshes
            .get(&(npc, need))
            .and_then(|token| self.index.get(token))
            .copied()
    }

    pub fn pending_departure(&self, npc: NpcId) -> Option<SimTime> {
        self.departures
            .get(&npc)
            .and_then(|token| self.index.get(token))
            .copied()
    }

    /// Pops every action due at or before `now`, earliest first.
    ///
    /// Returns nothing while suspended.
    pub fn poll(&mut self, now: SimTime) -> Vec<(EventToken, ScheduledAction)> {
        let mut due = Vec::new();
        if self.suspended {
            return due;
        }

        while let Some(entry) = self.queue.first_entry() {
            let (at, sequence) = *entry.key();
            if at > now {
                break;
            }
            let action = entry.remove();
            let token = EventToken(sequence);
            self.index.remove(&token);
            self.forget(token, action);
            due.push((token, action));
        }
        due
    }

    /// Stops `poll` from returning anything until `resume`.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Drops every pending action. Sequence numbers keep counting up so old
    /// tokens can never match a new entry.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.index.clear();
        self.departures.clear();
        self.refreshes.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Trigger time of the earliest pending action.
    pub fn next_due(&self) -> Option<SimTime> {
        self.queue.keys().next().map(|(at, _)| *at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departure(id: u32) -> ScheduledAction {
        ScheduledAction::Departure { npc: NpcId(id) }
    }

    #[test]
    fn test_poll_fires_in_time_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(SimTime(30), departure(3));
        scheduler.schedule(SimTime(10), departure(1));
        scheduler.schedule(SimTime(20), departure(2));

        let fired: Vec<_> = scheduler
            .poll(SimTime(25))
            .into_iter()
            .map(|(_, action)| action)
            .collect();
        assert_eq!(fired, vec![departure(1), departure(2)]);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_due(), Some(SimTime(30)));
    }

    #[test]
    fn test_equal_times_fire_fifo() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(SimTime(5), departure(9));
        scheduler.schedule(SimTime(5), ScheduledAction::Autosave);
        scheduler.schedule(SimTime(5), departure(1));

        let fired: Vec<_> = scheduler
            .poll(SimTime(5))
            .into_iter()
            .map(|(_, action)| action)
            .collect();
        assert_eq!(
            fired,
            vec![departure(9), ScheduledAction::Autosave, departure(1)]
        );
    }

    #[test]
    fn test_event_fires_at_most_once() {
        let mut scheduler = EventScheduler::new();
        let token = scheduler.schedule(SimTime(5), ScheduledAction::Autosave);
        assert_eq!(scheduler.poll(SimTime(5)).len(), 1);
        assert!(scheduler.poll(SimTime(100)).is_empty());
        assert!(!scheduler.cancel(token));
    }

    #[test]
    fn test_cancel_before_fire() {
        let mut scheduler = EventScheduler::new();
        let token = scheduler.schedule(SimTime(5), ScheduledAction::Autosave);
        assert!(scheduler.cancel(token));
        assert!(!scheduler.cancel(token));
        assert!(scheduler.poll(SimTime(10)).is_empty());
    }

    #[test]
    fn test_departure_is_superseded() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule_departure(NpcId(1), SimTime(100));
        scheduler.schedule_departure(NpcId(1), SimTime(200));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.pending_departure(NpcId(1)), Some(SimTime(200)));

        assert!(scheduler.poll(SimTime(150)).is_empty());
        assert_eq!(scheduler.poll(SimTime(200)).len(), 1);
        assert_eq!(scheduler.pending_departure(NpcId(1)), None);
    }

    #[test]
    fn test_cancel_departure() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule_departure(NpcId(2), SimTime(50));
        assert!(scheduler.cancel_departure(NpcId(2)));
        assert!(!scheduler.cancel_departure(NpcId(2)));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_refresh_is_superseded_per_need() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule_refresh(NpcId(1), NeedKind::Hunger, SimTime(100));
        scheduler.schedule_refresh(NpcId(1), NeedKind::Thirst, SimTime(120));
        scheduler.schedule_refresh(NpcId(1), NeedKind::Hunger, SimTime(300));
        assert_eq!(scheduler.len(), 2);
        assert_eq!(scheduler.pending_refresh(NpcId(1), NeedKind::Hunger), Some(SimTime(300)));

        let fired: Vec<_> = scheduler.poll(SimTime(200)).into_iter().map(|(_, a)| a).collect();
        assert_eq!(
            fired,
            vec![ScheduledAction::NeedRefresh { npc: NpcId(1), need: NeedKind::Thirst }]
        );
        assert_eq!(scheduler.pending_refresh(NpcId(1), NeedKind::Thirst), None);
        assert_eq!(scheduler.poll(SimTime(300)).len(), 1);
        assert_eq!(scheduler.pending_refresh(NpcId(1), NeedKind::Hunger), None);
    }

    #[test]
    fn test_suspended_scheduler_does_not_fire() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(SimTime(1), ScheduledAction::Autosave);
        scheduler.suspend();
        assert!(scheduler.poll(SimTime(10)).is_empty());
        scheduler.resume();
        assert_eq!(scheduler.poll(SimTime(10)).len(), 1);
    }

    #[test]
    fn test_clear_invalidates_old_tokens() {
        let mut scheduler = EventScheduler::new();
        let old = scheduler.schedule(SimTime(1), ScheduledAction::Autosave);
        scheduler.clear();
        let new = scheduler.schedule(SimTime(1), ScheduledAction::Autosave);
        assert_ne!(old, new);
        assert!(!scheduler.cancel(old));
        assert_eq!(scheduler.len(), 1);
    }
}
