//! Quest Components
//!
//! Quest definitions, the quest board, requirement lookup and the pure
//! scoring rules used when a party comes back.

use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use tavern_events::SimTime;

use super::npc::{NpcId, Stat, StatBlock};
use crate::config::QuestConfig;

/// Fixed quest rules
pub mod quest_constants {
    /// Maximum party members per quest
    pub const MAX_PARTY_SIZE: usize = 3;
    /// Travel time reduction when the party has a support-class member
    pub const SUPPORT_TRAVEL_REDUCTION: f32 = 0.10;
    /// Task time reduction when the party spans this many distinct classes
    pub const DIVERSE_PARTY_CLASSES: usize = 3;
    pub const DIVERSE_TASK_REDUCTION: f32 = 0.05;
    /// Shortest possible quest, in time units
    pub const MIN_QUEST_DURATION: f32 = 1.0;
    /// Match score needed for success
    pub const SUCCESS_THRESHOLD: f32 = 0.5;
    /// Reward bonus per empty party slot on success
    pub const EMPTY_SLOT_BONUS: f32 = 0.10;
    /// Fraction of the reward charged to retry a failed quest
    pub const RETRY_FEE_FRACTION: f32 = 0.15;
    pub const REWARD_PER_LEVEL: u32 = 25;
    pub const REWARD_PER_HOUR: u32 = 5;
    pub const XP_PER_LEVEL: u32 = 40;
}

use quest_constants::*;

/// Unique identifier for a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestId(pub u32);

impl fmt::Display for QuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// Quest categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Hunt,
    Escort,
    Gather,
    Explore,
    Rescue,
    Deliver,
    Investigate,
    Defend,
}

impl QuestType {
    pub const ALL: [QuestType; 8] = [
        QuestType::Hunt,
        QuestType::Escort,
        QuestType::Gather,
        QuestType::Explore,
        QuestType::Rescue,
        QuestType::Deliver,
        QuestType::Investigate,
        QuestType::Defend,
    ];

    fn title_word(self) -> &'static str {
        match self {
            QuestType::Hunt => "Hunt",
            QuestType::Escort => "Escort",
            QuestType::Gather => "Gathering",
            QuestType::Explore => "Expedition",
            QuestType::Rescue => "Rescue",
            QuestType::Deliver => "Delivery",
            QuestType::Investigate => "Investigation",
            QuestType::Defend => "Defense",
        }
    }
}

/// Destinations, each with a fixed one-way travel time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Greenhollow,
    Ironridge,
    Mirefen,
    Duskwood,
    Saltmarsh,
    Frostpeak,
    Sunscar,
    Emberwaste,
    Skyreach,
}

impl Region {
    pub const ALL: [Region; 9] = [
        Region::Greenhollow,
        Region::Ironridge,
        Region::Mirefen,
        Region::Duskwood,
        Region::Saltmarsh,
        Region::Frostpeak,
        Region::Sunscar,
        Region::Emberwaste,
        Region::Skyreach,
    ];

    /// One-way travel time in time units (simulated hours).
    pub fn travel_time(self) -> u32 {
        match self {
            Region::Greenhollow => 1,
            Region::Ironridge | Region::Mirefen => 2,
            Region::Duskwood | Region::Saltmarsh => 3,
            Region::Frostpeak | Region::Sunscar => 4,
            Region::Emberwaste => 5,
            Region::Skyreach => 6,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Pooled stat thresholds a party must meet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    pub required: BTreeMap<Stat, i32>,
    #[serde(default)]
    pub bonus: BTreeMap<Stat, i32>,
}

impl Requirements {
    pub fn new(required: &[(Stat, i32)], bonus: &[(Stat, i32)]) -> Self {
        Self {
            required: required.iter().copied().collect(),
            bonus: bonus.iter().copied().collect(),
        }
    }

    /// Same stats with every threshold raised by `steps`.
    fn raised_by(&self, steps: i32) -> Self {
        Self {
            required: self.required.iter().map(|(s, v)| (*s, v + steps)).collect(),
            bonus: self.bonus.iter().map(|(s, v)| (*s, v + steps)).collect(),
        }
    }

    pub fn total_count(&self) -> usize {
        self.required.len() + self.bonus.len()
    }
}

/// Resource: requirement thresholds per (quest type, level).
///
/// Levels above the highest explicit entry are extrapolated by raising every
/// threshold by one per level.
#[derive(Resource, Debug, Clone, Default)]
pub struct RequirementTable {
    entries: BTreeMap<QuestType, BTreeMap<u32, Requirements>>,
}

impl RequirementTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quest_type: QuestType, level: u32, requirements: Requirements) {
        self.entries
            .entry(quest_type)
            .or_default()
            .insert(level, requirements);
    }

    /// Thresholds for a quest type at a level.
    ///
    /// Falls back to the nearest explicit level below, raised by the level
    /// difference. Below the lowest explicit level the lowest entry is used
    /// as-is. An unknown quest type yields empty requirements.
    pub fn lookup(&self, quest_type: QuestType, level: u32) -> Requirements {
        let Some(levels) = self.entries.get(&quest_type) else {
            tracing::warn!("No requirement entries for {:?}", quest_type);
            return Requirements::default();
        };

        if let Some((base_level, base)) = levels.range(..=level).next_back() {
            if *base_level == level {
                return base.clone();
            }
            return base.raised_by((level - base_level) as i32);
        }

        levels
            .values()
            .next()
            .cloned()
            .unwrap_or_default()
    }
}

/// Where a quest is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Unposted,
    Posted,
    /// Party locked in and out on the road
    Accepted,
    Resolved { failed: bool },
}

/// Result stamped on a quest at resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestOutcome {
    pub success: bool,
    pub match_score: f32,
    pub payout: u32,
    pub xp_each: u32,
}

/// A quest definition plus its progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub quest_type: QuestType,
    pub region: Region,
    pub level: u32,
    /// One-way travel time, in time units
    pub travel_time: u32,
    pub task_time: u32,
    /// Time units a posted quest stays on the board unaccepted
    pub deadline: u32,
    pub reward: u32,
    pub xp_reward: u32,
    pub requirements: Requirements,
    pub party: Vec<NpcId>,
    pub status: QuestStatus,
    pub poster: Option<NpcId>,
    pub posted_at: Option<SimTime>,
    pub accepted_at: Option<SimTime>,
    pub expected_return: Option<SimTime>,
    pub completed_at: Option<SimTime>,
    pub outcome: Option<QuestOutcome>,
    /// Times the same party was sent back out after a failure
    #[serde(default)]
    pub retries: u32,
}

impl Quest {
    /// Rolls a new quest definition.
    ///
    /// Type and region are uniform; travel time comes from the region; task
    /// time and deadline padding come from the configured ranges.
    pub fn generate<R: Rng>(
        rng: &mut R,
        id: QuestId,
        level: u32,
        table: &RequirementTable,
        tuning: &QuestConfig,
    ) -> Self {
        let level = level.max(1);
        let quest_type = QuestType::ALL[rng.gen_range(0..QuestType::ALL.len())];
        let region = Region::ALL[rng.gen_range(0..Region::ALL.len())];
        let travel_time = region.travel_time();
        let task_time = roll_range(rng, tuning.task_time_min, tuning.task_time_max);
        let padding = roll_range(rng, tuning.deadline_padding_min, tuning.deadline_padding_max);

        Self {
            id,
            title: format!("{} in {}", quest_type.title_word(), region),
            quest_type,
            region,
            level,
            travel_time,
            task_time,
            deadline: 2 * travel_time + task_time + padding,
            reward: REWARD_PER_LEVEL * level + REWARD_PER_HOUR * (travel_time + task_time),
            xp_reward: XP_PER_LEVEL * level,
            requirements: table.lookup(quest_type, level),
            party: Vec::new(),
            status: QuestStatus::Unposted,
            poster: None,
            posted_at: None,
            accepted_at: None,
            expected_return: None,
            completed_at: None,
            outcome: None,
            retries: 0,
        }
    }

    pub fn is_posted(&self) -> bool {
        self.status == QuestStatus::Posted
    }

    /// Party composition is frozen
    pub fn is_locked(&self) -> bool {
        self.status == QuestStatus::Accepted
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, QuestStatus::Resolved { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, QuestStatus::Resolved { failed: true })
    }

    pub fn has_member(&self, npc: NpcId) -> bool {
        self.party.contains(&npc)
    }

    pub fn open_slots(&self) -> usize {
        MAX_PARTY_SIZE.saturating_sub(self.party.len())
    }

    /// Whether an accepted quest's party is due back.
    pub fn is_due(&self, now: SimTime) -> bool {
        self.is_locked() && self.expected_return.map_or(false, |t| t <= now)
    }

    /// Whether a posted quest has sat unaccepted past its deadline.
    pub fn is_expired(&self, now: SimTime) -> bool {
        self.is_posted()
            && self
                .posted_at
                .map_or(false, |t| t.plus_hours(self.deadline as u64) <= now)
    }

    pub fn retry_fee(&self) -> u32 {
        (self.reward as f32 * RETRY_FEE_FRACTION).round() as u32
    }
}

fn roll_range<R: Rng>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max <= min {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

/// Time units until an accepted party is back.
///
/// `2×travel + task`, minus 10% of travel with a support-class member and
/// 5% of task with three or more distinct classes, floored at one unit.
pub fn expected_duration(
    travel_time: u32,
    task_time: u32,
    party_classes: &[&str],
    support_class: &str,
) -> f32 {
    let base = (2 * travel_time + task_time) as f32;
    let mut reduction = 0.0;
    if party_classes.iter().any(|c| c.eq_ignore_ascii_case(support_class)) {
        reduction += SUPPORT_TRAVEL_REDUCTION * travel_time as f32;
    }
    let distinct: BTreeSet<String> = party_classes.iter().map(|c| c.to_lowercase()).collect();
    if distinct.len() >= DIVERSE_PARTY_CLASSES {
        reduction += DIVERSE_TASK_REDUCTION * task_time as f32;
    }
    (base - reduction).max(MIN_QUEST_DURATION)
}

/// Sums each stat across the party.
pub fn pooled_stats<'a>(members: impl IntoIterator<Item = &'a StatBlock>) -> StatBlock {
    let mut pooled = StatBlock::default();
    for block in members {
        for (stat, value) in block.iter() {
            pooled.add(stat, value);
        }
    }
    pooled
}

/// Fraction of required and bonus thresholds met by pooled stats.
///
/// Any unmet required threshold scores zero. A quest with no thresholds at
/// all also scores zero.
pub fn match_score(requirements: &Requirements, pooled: &StatBlock) -> f32 {
    let total = requirements.total_count();
    if total == 0 {
        return 0.0;
    }

    for (stat, threshold) in &requirements.required {
        if pooled.get(*stat) < *threshold {
            return 0.0;
        }
    }

    let bonus_met = requirements
        .bonus
        .iter()
        .filter(|(stat, threshold)| pooled.get(**stat) >= **threshold)
        .count();

    (requirements.required.len() + bonus_met) as f32 / total as f32
}

/// Reward scaling for a successful party of the given size.
pub fn reward_multiplier(party_size: usize) -> f32 {
    let missing = MAX_PARTY_SIZE.saturating_sub(party_size);
    1.0 + EMPTY_SLOT_BONUS * missing as f32
}

/// Result of putting a quest on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Posted,
    /// The board was full; the quest waits in the backlog
    Backlogged,
}

/// Resource: every quest on the board plus the overflow backlog.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestBoard {
    quests: BTreeMap<QuestId, Quest>,
    backlog: VecDeque<Quest>,
    next_id: u32,
    slots: usize,
}

impl Default for QuestBoard {
    fn default() -> Self {
        Self::new(6)
    }
}

impl QuestBoard {
    pub fn new(slots: usize) -> Self {
        Self {
            quests: BTreeMap::new(),
            backlog: VecDeque::new(),
            next_id: 1,
            slots: slots.max(1),
        }
    }

    pub fn allocate_id(&mut self) -> QuestId {
        let id = QuestId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn is_full(&self) -> bool {
        self.quests.len() >= self.slots
    }

    /// Puts a quest on the board, or in the backlog if the board is full.
    pub fn post(&mut self, mut quest: Quest, now: SimTime) -> PostOutcome {
        if self.is_full() {
            quest.status = QuestStatus::Unposted;
            self.backlog.push_back(quest);
            return PostOutcome::Backlogged;
        }
        quest.status = QuestStatus::Posted;
        quest.posted_at = Some(now);
        self.quests.insert(quest.id, quest);
        PostOutcome::Posted
    }

    /// Takes a quest off the board and promotes the oldest backlog quest.
    /// Returns the removed quest and the id of any promoted one.
    pub fn remove(&mut self, id: QuestId, now: SimTime) -> (Option<Quest>, Option<QuestId>) {
        let removed = self.quests.remove(&id);
        let mut promoted = None;
        if removed.is_some() && !self.is_full() {
            if let Some(next) = self.backlog.pop_front() {
                promoted = Some(next.id);
                self.post(next, now);
            }
        }
        (removed, promoted)
    }

    /// Pulls a quest out of the backlog before it is ever posted.
    pub fn remove_backlogged(&mut self, id: QuestId) -> Option<Quest> {
        let position = self.backlog.iter().position(|q| q.id == id)?;
        self.backlog.remove(position)
    }

    pub fn get(&self, id: QuestId) -> Option<&Quest> {
        self.quests.get(&id)
    }

    pub fn get_mut(&mut self, id: QuestId) -> Option<&mut Quest> {
        self.quests.get_mut(&id)
    }

    pub fn quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.values()
    }

    pub fn backlog(&self) -> impl Iterator<Item = &Quest> {
        self.backlog.iter()
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Accepted quests whose parties are due back, in id order.
    pub fn due_quests(&self, now: SimTime) -> Vec<QuestId> {
        self.quests
            .values()
            .filter(|q| q.is_due(now))
            .map(|q| q.id)
            .collect()
    }

    pub fn expired_quests(&self, now: SimTime) -> Vec<QuestId> {
        self.quests
            .values()
            .filter(|q| q.is_expired(now))
            .map(|q| q.id)
            .collect()
    }

    /// Unresolved quest whose party includes this NPC.
    pub fn quest_of(&self, npc: NpcId) -> Option<QuestId> {
        self.quests
            .values()
            .find(|q| !q.is_complete() && q.has_member(npc))
            .map(|q| q.id)
    }
}
