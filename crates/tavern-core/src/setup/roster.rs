//! Roster Generation
//!
//! Spawns the NPCs who frequent the tavern: mostly adventurers built from the
//! catalog's class templates, plus quest givers and a few townsfolk.

use rand::Rng;

use super::catalog::{DRINK_FLAVORS, FOOD_FLAVORS};
use crate::components::catalog::Catalog;
use crate::components::npc::{Gender, Needs, Npc, NpcId, Preferences, RoleProfile, StatBlock};
use crate::components::quest::{QuestType, Region};
use crate::rng::weighted_pick;

const FIRST_NAMES: &[&str] = &[
    "Aldric", "Brenna", "Cormac", "Dagny", "Elspeth", "Fenwick", "Greta", "Halvard", "Isolde",
    "Jorund", "Kestrel", "Liesel", "Marek", "Nessa", "Osric", "Perrin", "Quilla", "Roderick",
    "Sigrun", "Tamsin", "Ulric", "Vesna", "Wystan", "Yrsa",
];

const FAMILY_NAMES: &[&str] = &[
    "Ashford", "Blackthorn", "Cinderhill", "Dunmore", "Emberly", "Fairweather", "Greymantle",
    "Hollowell", "Ironwood", "Marsh", "Oakheart", "Redfern", "Stonebridge", "Thistlewood",
];

/// Share of each role in a generated roster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoleRoll {
    Adventurer,
    QuestGiver,
    Informant,
    Builder,
}

const ROLE_WEIGHTS: [(RoleRoll, f32); 4] = [
    (RoleRoll::Adventurer, 0.70),
    (RoleRoll::QuestGiver, 0.20),
    (RoleRoll::Informant, 0.05),
    (RoleRoll::Builder, 0.05),
];

fn pick<'a, R: Rng>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

/// A favorite and a hated flavor that differ.
fn flavor_pair<R: Rng>(rng: &mut R, groups: &[&str]) -> (String, String) {
    let favorite = rng.gen_range(0..groups.len());
    let mut hated = rng.gen_range(0..groups.len() - 1);
    if hated >= favorite {
        hated += 1;
    }
    (groups[favorite].to_string(), groups[hated].to_string())
}

fn roll_preferences<R: Rng>(rng: &mut R, class_ids: &[&str]) -> Preferences {
    let (favorite_food, hated_food) = flavor_pair(rng, FOOD_FLAVORS);
    let (favorite_drink, hated_drink) = flavor_pair(rng, DRINK_FLAVORS);
    let favorite_class = if class_ids.is_empty() {
        String::new()
    } else {
        pick(rng, class_ids).to_string()
    };
    Preferences {
        favorite_food,
        hated_food,
        favorite_drink,
        hated_drink,
        favorite_region: Region::ALL[rng.gen_range(0..Region::ALL.len())],
        favorite_quest_type: QuestType::ALL[rng.gen_range(0..QuestType::ALL.len())],
        favorite_class,
    }
}

/// Builds `count` NPCs with ids starting at `first_id`.
///
/// Adventurers need at least one class template; without any, every NPC is
/// rolled as a quest giver instead.
pub fn generate_roster<R: Rng>(rng: &mut R, catalog: &Catalog, first_id: u32, count: usize) -> Vec<Npc> {
    let class_ids: Vec<&str> = catalog.classes().map(|c| c.id.as_str()).collect();
    let mut roster = Vec::with_capacity(count);

    for index in 0..count {
        let id = NpcId(first_id + index as u32);
        let mut role = weighted_pick(rng, &ROLE_WEIGHTS).unwrap_or(RoleRoll::Adventurer);
        if role == RoleRoll::Adventurer && class_ids.is_empty() {
            role = RoleRoll::QuestGiver;
        }

        let (profile, stats) = match role {
            RoleRoll::Adventurer => {
                let class_id = pick(rng, &class_ids);
                let stats = catalog
                    .class(class_id)
                    .map(|c| c.starting_stats())
                    .unwrap_or_default();
                (RoleProfile::adventurer(class_id), stats)
            }
            RoleRoll::QuestGiver => (RoleProfile::quest_giver(), StatBlock::default()),
            RoleRoll::Informant => (RoleProfile::Informant { rumors_shared: 0 }, StatBlock::default()),
            RoleRoll::Builder => (RoleProfile::Builder { jobs_completed: 0 }, StatBlock::default()),
        };

        let gender = match rng.gen_range(0..10) {
            0..=4 => Gender::Female,
            5..=8 => Gender::Male,
            _ => Gender::Other,
        };
        let name = format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, FAMILY_NAMES));
        let level = match role {
            RoleRoll::QuestGiver => rng.gen_range(1..=3),
            _ => 1,
        };

        roster.push(Npc {
            id,
            name,
            gender,
            portrait: format!("portrait_{:02}", rng.gen_range(0..32)),
            profile,
            stats,
            level,
            xp: 0,
            preferences: roll_preferences(rng, &class_ids),
            needs: Needs::default(),
            loyalty: 0,
            happiness: 0,
        });
    }
    roster
}
