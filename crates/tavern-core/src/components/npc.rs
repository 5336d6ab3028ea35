//! NPC Components
//!
//! The persistent record of every character who may visit the tavern:
//! identity, stats, progression, tastes, needs and role-specific bookkeeping.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::catalog::ConsumableKind;
use super::quest::{QuestId, QuestType, Region};
use crate::rng::weighted_pick;

/// Bounds shared by loyalty and happiness
pub const SENTIMENT_MIN: i32 = -100;
pub const SENTIMENT_MAX: i32 = 100;

/// Experience needed per level
pub const XP_PER_LEVEL: u32 = 100;

/// Unique identifier for an NPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NpcId(pub u32);

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Other,
}

/// Which family a stat belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCategory {
    Ability,
    Skill,
    CombatRole,
}

/// Every numeric stat an NPC carries: eight abilities, nine role skills and
/// four combat-role weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
    Perception,
    Luck,

    Tracking,
    Stealth,
    Lore,
    Persuasion,
    Haggling,
    Carpentry,
    Masonry,
    Smithing,
    Herbalism,

    Tank,
    Damage,
    Healer,
    Support,
}

impl Stat {
    pub const ALL: [Stat; 21] = [
        Stat::Strength,
        Stat::Dexterity,
        Stat::Constitution,
        Stat::Intelligence,
        Stat::Wisdom,
        Stat::Charisma,
        Stat::Perception,
        Stat::Luck,
        Stat::Tracking,
        Stat::Stealth,
        Stat::Lore,
        Stat::Persuasion,
        Stat::Haggling,
        Stat::Carpentry,
        Stat::Masonry,
        Stat::Smithing,
        Stat::Herbalism,
        Stat::Tank,
        Stat::Damage,
        Stat::Healer,
        Stat::Support,
    ];

    pub fn category(self) -> StatCategory {
        match self {
            Stat::Strength
            | Stat::Dexterity
            | Stat::Constitution
            | Stat::Intelligence
            | Stat::Wisdom
            | Stat::Charisma
            | Stat::Perception
            | Stat::Luck => StatCategory::Ability,
            Stat::Tank | Stat::Damage | Stat::Healer | Stat::Support => StatCategory::CombatRole,
            _ => StatCategory::Skill,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Stat values keyed by stat; missing stats read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatBlock(BTreeMap<Stat, i32>);

impl StatBlock {
    pub fn from_pairs(pairs: &[(Stat, i32)]) -> Self {
        Self(pairs.iter().copied().collect())
    }

    pub fn get(&self, stat: Stat) -> i32 {
        self.0.get(&stat).copied().unwrap_or(0)
    }

    pub fn set(&mut self, stat: Stat, value: i32) {
        self.0.insert(stat, value);
    }

    pub fn add(&mut self, stat: Stat, delta: i32) {
        *self.0.entry(stat).or_insert(0) += delta;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, i32)> + '_ {
        self.0.iter().map(|(s, v)| (*s, *v))
    }
}

/// Needs that can be satisfied by serving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedKind {
    Hunger,
    Thirst,
}

impl NeedKind {
    pub fn satisfied_by(kind: ConsumableKind) -> Self {
        match kind {
            ConsumableKind::Food => NeedKind::Hunger,
            ConsumableKind::Drink => NeedKind::Thirst,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    pub hungry: bool,
    pub thirsty: bool,
    pub last_consumed: Option<ConsumableKind>,
}

impl Needs {
    pub fn set(&mut self, need: NeedKind, active: bool) {
        match need {
            NeedKind::Hunger => self.hungry = active,
            NeedKind::Thirst => self.thirsty = active,
        }
    }

    pub fn has(&self, need: NeedKind) -> bool {
        match need {
            NeedKind::Hunger => self.hungry,
            NeedKind::Thirst => self.thirsty,
        }
    }
}

/// Tastes and leanings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub favorite_food: String,
    pub hated_food: String,
    pub favorite_drink: String,
    pub hated_drink: String,
    pub favorite_region: Region,
    pub favorite_quest_type: QuestType,
    pub favorite_class: String,
}

impl Preferences {
    /// Favorite and hated flavor groups for food or drink.
    pub fn taste(&self, kind: ConsumableKind) -> (&str, &str) {
        match kind {
            ConsumableKind::Food => (&self.favorite_food, &self.hated_food),
            ConsumableKind::Drink => (&self.favorite_drink, &self.hated_drink),
        }
    }
}

/// Role tag without the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Adventurer,
    Informant,
    Builder,
    QuestGiver,
}

/// Role-specific state. Only the fields a role uses exist on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleProfile {
    Adventurer {
        class_id: String,
        active_quest: Option<QuestId>,
        quests_completed: u32,
        quests_failed: u32,
    },
    Informant {
        rumors_shared: u32,
    },
    Builder {
        jobs_completed: u32,
    },
    QuestGiver {
        posted_quest: Option<QuestId>,
        quests_posted: u32,
    },
}

impl RoleProfile {
    pub fn adventurer(class_id: impl Into<String>) -> Self {
        RoleProfile::Adventurer {
            class_id: class_id.into(),
            active_quest: None,
            quests_completed: 0,
            quests_failed: 0,
        }
    }

    pub fn quest_giver() -> Self {
        RoleProfile::QuestGiver {
            posted_quest: None,
            quests_posted: 0,
        }
    }

    pub fn kind(&self) -> Role {
        match self {
            RoleProfile::Adventurer { .. } => Role::Adventurer,
            RoleProfile::Informant { .. } => Role::Informant,
            RoleProfile::Builder { .. } => Role::Builder,
            RoleProfile::QuestGiver { .. } => Role::QuestGiver,
        }
    }
}

/// A level gained and the stat that grew with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    pub stat: Stat,
}

/// The persistent NPC record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    pub id: NpcId,
    pub name: String,
    pub gender: Gender,
    pub portrait: String,
    pub profile: RoleProfile,
    pub stats: StatBlock,
    pub level: u32,
    pub xp: u32,
    pub preferences: Preferences,
    pub needs: Needs,
    pub loyalty: i32,
    pub happiness: i32,
}

impl Npc {
    pub fn role(&self) -> Role {
        self.profile.kind()
    }

    pub fn is_adventurer(&self) -> bool {
        self.role() == Role::Adventurer
    }

    pub fn class_id(&self) -> Option<&str> {
        match &self.profile {
            RoleProfile::Adventurer { class_id, .. } => Some(class_id),
            _ => None,
        }
    }

    /// Quest an adventurer is currently committed to.
    pub fn active_quest(&self) -> Option<QuestId> {
        match &self.profile {
            RoleProfile::Adventurer { active_quest, .. } => *active_quest,
            _ => None,
        }
    }

    pub fn set_active_quest(&mut self, quest: Option<QuestId>) {
        if let RoleProfile::Adventurer { active_quest, .. } = &mut self.profile {
            *active_quest = quest;
        }
    }

    /// Quest a quest giver currently has out.
    pub fn posted_quest(&self) -> Option<QuestId> {
        match &self.profile {
            RoleProfile::QuestGiver { posted_quest, .. } => *posted_quest,
            _ => None,
        }
    }

    /// Marks a new quest as posted by this quest giver.
    pub fn record_posting(&mut self, quest: QuestId) {
        if let RoleProfile::QuestGiver {
            posted_quest,
            quests_posted,
        } = &mut self.profile
        {
            *posted_quest = Some(quest);
            *quests_posted += 1;
        }
    }

    /// Lets go of a posted quest if it is the one given.
    pub fn release_posting(&mut self, quest: QuestId) {
        if let RoleProfile::QuestGiver { posted_quest, .. } = &mut self.profile {
            if *posted_quest == Some(quest) {
                *posted_quest = None;
            }
        }
    }

    /// Records a finished quest on an adventurer.
    pub fn record_quest_result(&mut self, success: bool) {
        if let RoleProfile::Adventurer {
            active_quest,
            quests_completed,
            quests_failed,
            ..
        } = &mut self.profile
        {
            *active_quest = None;
            if success {
                *quests_completed += 1;
            } else {
                *quests_failed += 1;
            }
        }
    }

    /// Experience needed to reach the next level.
    pub fn xp_threshold(&self) -> u32 {
        self.level.max(1) * XP_PER_LEVEL
    }

    /// Adds experience and applies every level-up it pays for.
    ///
    /// Excess experience carries over. Each level grows one stat picked by
    /// weight from `growth`; when no weight is positive every listed stat is
    /// equally likely, and an empty list falls back to all stats.
    pub fn gain_xp<R: Rng>(&mut self, amount: u32, growth: &[(Stat, f32)], rng: &mut R) -> Vec<LevelUp> {
        self.level = self.level.max(1);
        self.xp = self.xp.saturating_add(amount);

        let mut gained = Vec::new();
        while self.xp >= self.xp_threshold() {
            self.xp -= self.xp_threshold();
            self.level += 1;
            let stat = pick_growth_stat(growth, rng);
            self.stats.add(stat, 1);
            gained.push(LevelUp {
                level: self.level,
                stat,
            });
        }
        gained
    }

    /// Applies a loyalty change and returns the change actually applied.
    pub fn adjust_loyalty(&mut self, delta: i32) -> i32 {
        let before = self.loyalty;
        self.loyalty = (self.loyalty + delta).clamp(SENTIMENT_MIN, SENTIMENT_MAX);
        self.loyalty - before
    }

    pub fn adjust_happiness(&mut self, delta: i32) {
        self.happiness = (self.happiness + delta).clamp(SENTIMENT_MIN, SENTIMENT_MAX);
    }
}

fn pick_growth_stat<R: Rng>(growth: &[(Stat, f32)], rng: &mut R) -> Stat {
    if let Some(stat) = weighted_pick(rng, growth) {
        return stat;
    }
    let equal: Vec<(Stat, f32)> = if growth.is_empty() {
        Stat::ALL.iter().map(|s| (*s, 1.0)).collect()
    } else {
        growth.iter().map(|(s, _)| (*s, 1.0)).collect()
    };
    weighted_pick(rng, &equal).unwrap_or(Stat::Luck)
}
