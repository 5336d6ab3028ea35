//! Simulation Context
//!
//! Every resource the tavern logic touches, borrowed together. Per-tick
//! systems take it as a system parameter; the `Tavern` facade fetches the
//! same bundle for external operations, so both paths share one code path.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use tavern_events::{EventKind, SimTime};

use crate::clock::SimClock;
use crate::components::catalog::Catalog;
use crate::components::guest::{GuestState, NpcRegistry};
use crate::components::quest::{QuestBoard, RequirementTable};
use crate::components::seating::Seating;
use crate::components::tavern::{Pantry, TavernState};
use crate::config::TavernConfig;
use crate::events::PendingEvents;
use crate::rng::SimRng;
use crate::scheduler::EventScheduler;

#[derive(SystemParam)]
pub struct TavernCtx<'w> {
    pub clock: Res<'w, SimClock>,
    pub config: Res<'w, TavernConfig>,
    pub catalog: Res<'w, Catalog>,
    pub requirements: Res<'w, RequirementTable>,
    pub scheduler: ResMut<'w, EventScheduler>,
    pub registry: ResMut<'w, NpcRegistry>,
    pub seating: ResMut<'w, Seating>,
    pub board: ResMut<'w, QuestBoard>,
    pub tavern: ResMut<'w, TavernState>,
    pub pantry: ResMut<'w, Pantry>,
    pub rng: ResMut<'w, SimRng>,
    pub events: ResMut<'w, PendingEvents>,
}

impl TavernCtx<'_> {
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// Queues an event stamped with the current time.
    pub fn emit(&mut self, kind: EventKind) {
        let now = self.clock.now();
        self.events.emit(now, kind);
    }

    /// Whether guests are being let in right now.
    pub fn is_open(&self) -> bool {
        self.tavern.open && self.config.hours.is_open_at(self.now().hour())
    }

    /// Whether the floor can take one more guest.
    pub fn floor_has_room(&self) -> bool {
        self.registry.floor_occupancy() < self.config.capacity.floor_capacity
    }

    pub fn staging_has_room(&self) -> bool {
        self.registry.count_in(GuestState::StagingArea)
            < self.config.capacity.staging_capacity
    }
}
