//! Tavern State
//!
//! Purse, reputation, daily boundary bookkeeping and the pantry.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RENOWN_MIN: f32 = 0.0;
pub const RENOWN_MAX: f32 = 100.0;

/// Which daily boundaries have already run for `day`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayFlags {
    /// `None` until the first day begins
    pub day: Option<u64>,
    pub opened: bool,
    pub last_call: bool,
    pub closed: bool,
}

/// Resource: tavern-wide scalars.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TavernState {
    pub gold: i64,
    pub renown: f32,
    pub flags: DayFlags,
    /// Whether guests are currently being admitted
    pub open: bool,
}

impl Default for TavernState {
    fn default() -> Self {
        Self::new(100, 10.0)
    }
}

impl TavernState {
    pub fn new(gold: i64, renown: f32) -> Self {
        Self {
            gold,
            renown: renown.clamp(RENOWN_MIN, RENOWN_MAX),
            flags: DayFlags::default(),
            open: false,
        }
    }

    pub fn adjust_renown(&mut self, delta: f32) {
        self.renown = (self.renown + delta).clamp(RENOWN_MIN, RENOWN_MAX);
    }

    pub fn can_afford(&self, amount: i64) -> bool {
        self.gold >= amount
    }

    /// Resets the boundary flags when a new day starts.
    pub fn begin_day(&mut self, day: u64) {
        if self.flags.day != Some(day) {
            self.flags = DayFlags {
                day: Some(day),
                ..DayFlags::default()
            };
        }
    }
}

/// Resource: units in stock per menu item.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pantry {
    stock: BTreeMap<String, u32>,
}

impl Pantry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock(&self, item: &str) -> u32 {
        self.stock.get(item).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item: &str, quantity: u32) {
        *self.stock.entry(item.to_string()).or_insert(0) += quantity;
    }

    /// Takes one unit. Returns false when nothing is left.
    pub fn take_one(&mut self, item: &str) -> bool {
        match self.stock.get_mut(item) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, u32)> {
        self.stock.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
