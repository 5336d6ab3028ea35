//! Guest Components
//!
//! A `Guest` wraps one visit of an NPC. The NPC record lives in the registry
//! for the whole run; the guest wrapper is replaced every time the NPC is
//! queued for a new visit.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tavern_events::SimTime;

use super::npc::{Npc, NpcId};

/// Where a guest is in the current visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestState {
    /// Not at the tavern; waiting for the planned visit
    Elsewhere,
    /// Queued outside the door
    StreetOutside,
    /// Inside the entrance, waiting for room on the floor
    StagingArea,
    TavernFloor,
    Seats,
    /// In the party of a posted quest, still inside
    AssignedToQuest,
    /// Out on an accepted quest
    Deployed,
    Departed,
}

impl GuestState {
    /// Counts against floor capacity
    pub fn occupies_floor(self) -> bool {
        matches!(
            self,
            GuestState::TavernFloor | GuestState::Seats | GuestState::AssignedToQuest
        )
    }

    /// Anywhere past the front door
    pub fn is_inside(self) -> bool {
        self.occupies_floor() || self == GuestState::StagingArea
    }

    /// Can be served food and drink
    pub fn can_be_served(self) -> bool {
        matches!(self, GuestState::TavernFloor | GuestState::Seats)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GuestState::Elsewhere => "elsewhere",
            GuestState::StreetOutside => "street_outside",
            GuestState::StagingArea => "staging_area",
            GuestState::TavernFloor => "tavern_floor",
            GuestState::Seats => "seats",
            GuestState::AssignedToQuest => "assigned_to_quest",
            GuestState::Deployed => "deployed",
            GuestState::Departed => "departed",
        }
    }
}

/// One planned or ongoing visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub npc: NpcId,
    pub state: GuestState,
    pub visit_day: u64,
    pub visit_hour: u32,
    /// Hours the guest will wait outside past the visit hour
    pub wait_tolerance: u32,
    /// Minutes the guest stays once admitted, before the renown bonus
    pub linger_minutes: u32,
    pub arrived_at: Option<SimTime>,
    pub staged_at: Option<SimTime>,
    pub admitted_at: Option<SimTime>,
    pub departs_at: Option<SimTime>,
}

impl Guest {
    pub fn planned(npc: NpcId, visit_day: u64, visit_hour: u32, wait_tolerance: u32, linger_minutes: u32) -> Self {
        Self {
            npc,
            state: GuestState::Elsewhere,
            visit_day,
            visit_hour,
            wait_tolerance,
            linger_minutes,
            arrived_at: None,
            staged_at: None,
            admitted_at: None,
            departs_at: None,
        }
    }

    /// Visit day reached and the hour has come.
    pub fn should_arrive(&self, now: SimTime) -> bool {
        self.state == GuestState::Elsewhere
            && (now.day_index() > self.visit_day
                || (now.day_index() == self.visit_day && now.hour() >= self.visit_hour))
    }

    /// Waited outside longer than the tolerance allows.
    pub fn out_of_patience(&self, now: SimTime) -> bool {
        if self.state != GuestState::StreetOutside {
            return false;
        }
        if now.day_index() > self.visit_day {
            return true;
        }
        now.hour() > self.visit_hour + self.wait_tolerance
    }
}

/// Resource: every NPC record and every current guest wrapper.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NpcRegistry {
    npcs: BTreeMap<NpcId, Npc>,
    guests: BTreeMap<NpcId, Guest>,
}

impl NpcRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_npc(&mut self, npc: Npc) {
        self.npcs.insert(npc.id, npc);
    }

    pub fn next_npc_id(&self) -> NpcId {
        NpcId(self.npcs.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    pub fn npc_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.get_mut(&id)
    }

    pub fn npcs(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.values()
    }

    pub fn npcs_mut(&mut self) -> impl Iterator<Item = &mut Npc> {
        self.npcs.values_mut()
    }

    pub fn npc_count(&self) -> usize {
        self.npcs.len()
    }

    pub fn guest(&self, id: NpcId) -> Option<&Guest> {
        self.guests.get(&id)
    }

    pub fn guest_mut(&mut self, id: NpcId) -> Option<&mut Guest> {
        self.guests.get_mut(&id)
    }

    pub fn guests(&self) -> impl Iterator<Item = &Guest> {
        self.guests.values()
    }

    pub fn guest_state(&self, id: NpcId) -> Option<GuestState> {
        self.guests.get(&id).map(|g| g.state)
    }

    /// Installs a new visit, replacing any previous wrapper.
    pub fn insert_guest(&mut self, guest: Guest) {
        self.guests.insert(guest.npc, guest);
    }

    pub fn remove_guest(&mut self, id: NpcId) -> Option<Guest> {
        self.guests.remove(&id)
    }

    /// Guest ids in a given state, ascending.
    pub fn ids_in(&self, state: GuestState) -> Vec<NpcId> {
        self.guests
            .values()
            .filter(|g| g.state == state)
            .map(|g| g.npc)
            .collect()
    }

    pub fn count_in(&self, state: GuestState) -> usize {
        self.guests.values().filter(|g| g.state == state).count()
    }

    pub fn floor_occupancy(&self) -> usize {
        self.guests.values().filter(|g| g.state.occupies_floor()).count()
    }

    /// Guests waiting in the staging area, longest-waiting first.
    pub fn staging_queue(&self) -> Vec<NpcId> {
        let mut staged: Vec<&Guest> = self
            .guests
            .values()
            .filter(|g| g.state == GuestState::StagingArea)
            .collect();
        staged.sort_by_key(|g| (g.staged_at, g.npc));
        staged.into_iter().map(|g| g.npc).collect()
    }

    /// Guests queued on the street, earliest arrival first.
    pub fn street_queue(&self) -> Vec<NpcId> {
        let mut street: Vec<&Guest> = self
            .guests
            .values()
            .filter(|g| g.state == GuestState::StreetOutside)
            .collect();
        street.sort_by_key(|g| (g.arrived_at, g.npc));
        street.into_iter().map(|g| g.npc).collect()
    }

    /// Count of guests per state, keyed by state name.
    pub fn state_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for guest in self.guests.values() {
            *counts.entry(guest.state.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn mean_loyalty(&self) -> f32 {
        if self.npcs.is_empty() {
            return 0.0;
        }
        self.npcs.values().map(|n| n.loyalty as f32).sum::<f32>() / self.npcs.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrival_timing() {
        let guest = Guest::planned(NpcId(1), 2, 14, 2, 90);
        assert!(!guest.should_arrive(SimTime::at(2, 13)));
        assert!(guest.should_arrive(SimTime::at(2, 14)));
        assert!(guest.should_arrive(SimTime::at(3, 9)));
        assert!(!guest.should_arrive(SimTime::at(1, 20)));
    }

    #[test]
    fn test_patience_runs_out_after_tolerance() {
        let mut guest = Guest::planned(NpcId(1), 0, 10, 2, 90);
        guest.state = GuestState::StreetOutside;
        assert!(!guest.out_of_patience(SimTime::at(0, 12)));
        assert!(guest.out_of_patience(SimTime::at(0, 13)));
    }

    #[test]
    fn test_queues_are_fifo() {
        let mut registry = NpcRegistry::new();
        for (id, at) in [(1u32, 30u64), (2, 10), (3, 20)] {
            let mut guest = Guest::planned(NpcId(id), 0, 9, 1, 60);
            guest.state = GuestState::StagingArea;
            guest.staged_at = Some(SimTime(at));
            registry.insert_guest(guest);
        }
        assert_eq!(registry.staging_queue(), vec![NpcId(2), NpcId(3), NpcId(1)]);
        assert_eq!(registry.floor_occupancy(), 0);
        assert_eq!(registry.state_counts()["staging_area"], 3);
    }

    #[test]
    fn test_state_classification() {
        assert!(GuestState::Seats.occupies_floor());
        assert!(GuestState::AssignedToQuest.occupies_floor());
        assert!(!GuestState::StagingArea.occupies_floor());
        assert!(GuestState::StagingArea.is_inside());
        assert!(!GuestState::Deployed.is_inside());
        assert!(!GuestState::AssignedToQuest.can_be_served());
    }
}
