//! Shared scenario helpers for integration tests

#![allow(dead_code)]

use tavern_core::autopilot::{self, AUTOPILOT_INTERVAL};
use tavern_core::{
    Gender, Guest, GuestState, Needs, Npc, NpcId, Preferences, QuestType, Region, RoleProfile,
    Stat, StatBlock, Tavern,
};

pub fn preferences() -> Preferences {
    Preferences {
        favorite_food: "Smoky".to_string(),
        hated_food: "Bitter".to_string(),
        favorite_drink: "Malty".to_string(),
        hated_drink: "Sour".to_string(),
        favorite_region: Region::Ironridge,
        favorite_quest_type: QuestType::Hunt,
        favorite_class: "warrior".to_string(),
    }
}

pub fn adventurer(id: u32, class_id: &str, stats: &[(Stat, i32)]) -> Npc {
    Npc {
        id: NpcId(id),
        name: format!("Adventurer {}", id),
        gender: Gender::Other,
        portrait: "portrait_00".to_string(),
        profile: RoleProfile::adventurer(class_id),
        stats: StatBlock::from_pairs(stats),
        level: 1,
        xp: 0,
        preferences: preferences(),
        needs: Needs::default(),
        loyalty: 0,
        happiness: 0,
    }
}

pub fn quest_giver(id: u32) -> Npc {
    Npc {
        profile: RoleProfile::quest_giver(),
        name: format!("Patron {}", id),
        ..adventurer(id, "", &[])
    }
}

/// Walks a registered NPC in from the street through the normal admission.
pub fn admit(tavern: &mut Tavern, npc: u32) -> GuestState {
    let now = tavern.now();
    let mut guest = Guest::planned(NpcId(npc), now.day_index(), now.hour(), 3, 120);
    guest.state = GuestState::StreetOutside;
    guest.arrived_at = Some(now);
    tavern.ctx().registry.insert_guest(guest);
    tavern
        .admit_guest(NpcId(npc))
        .expect("admission should succeed")
}

/// Forces a guest into a state without going through the lifecycle.
pub fn force_state(tavern: &mut Tavern, npc: u32, state: GuestState) {
    let mut ctx = tavern.ctx();
    if let Some(guest) = ctx.registry.guest_mut(NpcId(npc)) {
        guest.state = state;
    }
}

/// Runs the tavern with an autopilot pass every quarter hour.
pub fn drive(tavern: &mut Tavern, seconds: u64) {
    let mut remaining = seconds;
    while remaining > 0 {
        let chunk = remaining.min(AUTOPILOT_INTERVAL);
        tavern.run_for(chunk);
        autopilot::step(&mut tavern.ctx());
        remaining -= chunk;
    }
}
