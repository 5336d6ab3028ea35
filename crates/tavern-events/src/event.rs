//! Event Types
//!
//! Records of everything notable the tavern simulation does, serialized one
//! per line to the event log. Entity ids are raw integers so this crate stays
//! free of simulation types.

use serde::{Deserialize, Serialize};

use crate::SimTime;

/// Primary event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Guest,
    Seating,
    Service,
    Quest,
    Progression,
    Calendar,
    Persistence,
}

impl EventType {
    /// Returns all event type variants.
    pub fn all() -> &'static [EventType] {
        &[
            EventType::Guest,
            EventType::Seating,
            EventType::Service,
            EventType::Quest,
            EventType::Progression,
            EventType::Calendar,
            EventType::Persistence,
        ]
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Guest reached the street outside and is waiting to get in
    GuestArrived { npc: u32 },
    /// Guest got in but is waiting in the entrance for floor space
    GuestStaged { npc: u32 },
    GuestAdmitted { npc: u32, departs_at: SimTime },
    /// Guest waited too long outside and went home
    GuestGaveUp { npc: u32, next_visit_day: u64 },
    GuestSeated { npc: u32, table: u32, seat: u32 },
    GuestUnseated { npc: u32, table: u32, seat: u32 },
    GuestDeparted { npc: u32, forced: bool },
    ItemServed {
        npc: u32,
        item: String,
        reaction: String,
        gold: u32,
        loyalty_change: i32,
    },
    ItemSold { npc: u32, item: String, price: u32 },
    ServingRequested { npc: u32, item: String },
    QuestPosted { quest: u32, poster: Option<u32> },
    QuestBacklogged { quest: u32 },
    QuestAccepted {
        quest: u32,
        party: Vec<u32>,
        expected_return: SimTime,
    },
    QuestResolved {
        quest: u32,
        success: bool,
        match_score: f32,
        payout: u32,
    },
    QuestRetried { quest: u32, fee: u32 },
    QuestDismissed { quest: u32 },
    QuestExpired { quest: u32 },
    LevelUp { npc: u32, level: u32, stat: String },
    DayStarted { day: u64 },
    TavernOpened { day: u64 },
    LastCall { sent_away: usize },
    TavernClosed { evicted: usize },
    AutosaveRequested,
}

impl EventKind {
    /// Category of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::GuestArrived { .. }
            | EventKind::GuestStaged { .. }
            | EventKind::GuestAdmitted { .. }
            | EventKind::GuestGaveUp { .. }
            | EventKind::GuestDeparted { .. } => EventType::Guest,
            EventKind::GuestSeated { .. } | EventKind::GuestUnseated { .. } => EventType::Seating,
            EventKind::ItemServed { .. }
            | EventKind::ItemSold { .. }
            | EventKind::ServingRequested { .. } => EventType::Service,
            EventKind::QuestPosted { .. }
            | EventKind::QuestBacklogged { .. }
            | EventKind::QuestAccepted { .. }
            | EventKind::QuestResolved { .. }
            | EventKind::QuestRetried { .. }
            | EventKind::QuestDismissed { .. }
            | EventKind::QuestExpired { .. } => EventType::Quest,
            EventKind::LevelUp { .. } => EventType::Progression,
            EventKind::DayStarted { .. }
            | EventKind::TavernOpened { .. }
            | EventKind::LastCall { .. }
            | EventKind::TavernClosed { .. } => EventType::Calendar,
            EventKind::AutosaveRequested => EventType::Persistence,
        }
    }

    /// NPC ids this event is about.
    pub fn npc_ids(&self) -> Vec<u32> {
        match self {
            EventKind::GuestArrived { npc }
            | EventKind::GuestStaged { npc }
            | EventKind::GuestAdmitted { npc, .. }
            | EventKind::GuestGaveUp { npc, .. }
            | EventKind::GuestSeated { npc, .. }
            | EventKind::GuestUnseated { npc, .. }
            | EventKind::GuestDeparted { npc, .. }
            | EventKind::ItemServed { npc, .. }
            | EventKind::ItemSold { npc, .. }
            | EventKind::ServingRequested { npc, .. }
            | EventKind::LevelUp { npc, .. } => vec![*npc],
            EventKind::QuestPosted { poster, .. } => poster.iter().copied().collect(),
            EventKind::QuestAccepted { party, .. } => party.clone(),
            _ => Vec::new(),
        }
    }
}

/// A single logged event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TavernEvent {
    /// Unique identifier (e.g., "evt_00000042")
    pub event_id: String,
    pub timestamp: SimTime,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl TavernEvent {
    pub fn new(event_id: impl Into<String>, timestamp: SimTime, kind: EventKind) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp,
            kind,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    pub fn involves_npc(&self, npc: u32) -> bool {
        self.kind.npc_ids().contains(&npc)
    }

    /// Serializes this event as a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}
