//! Taste and Economy Rules
//!
//! Pure functions: how a guest reacts to an item, what that reaction is worth
//! in loyalty and time, and how much gold a serving or a sale yields.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::components::catalog::Rarity;

/// Economy constants
pub mod economy_constants {
    /// Extra loyalty for fast service, unless the item was disliked
    pub const FAST_SERVICE_BONUS: i32 = 1;
    pub const LOYALTY_GOLD_WEIGHT: f32 = 0.25;
    pub const RENOWN_GOLD_WEIGHT: f32 = 0.10;
    /// Base markup a guest will accept on a sale
    pub const BASE_MARKUP: f32 = 1.25;
}

use economy_constants::*;

/// How a guest feels about what they were served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    Loved,
    Liked,
    Neutral,
    Disliked,
}

impl Reaction {
    pub fn loyalty_delta(self) -> i32 {
        match self {
            Reaction::Loved => 6,
            Reaction::Liked => 3,
            Reaction::Neutral => 2,
            Reaction::Disliked => -6,
        }
    }

    /// Extra minutes of stay
    pub fn stay_bonus_minutes(self) -> u32 {
        match self {
            Reaction::Loved => 5,
            Reaction::Liked => 3,
            Reaction::Neutral => 1,
            Reaction::Disliked => 0,
        }
    }

    pub fn repeat_chance(self) -> f32 {
        match self {
            Reaction::Loved => 0.20,
            Reaction::Liked => 0.10,
            Reaction::Neutral | Reaction::Disliked => 0.0,
        }
    }

    pub fn taste_multiplier(self) -> f32 {
        match self {
            Reaction::Loved => 1.20,
            Reaction::Liked => 1.10,
            Reaction::Neutral => 1.00,
            Reaction::Disliked => 0.80,
        }
    }

    /// Willingness-to-pay adjustment for a sale
    pub fn flavor_match_bonus(self) -> f32 {
        match self {
            Reaction::Loved => 0.30,
            Reaction::Liked => 0.15,
            Reaction::Neutral => 0.0,
            Reaction::Disliked => -0.30,
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reaction::Loved => "loved",
            Reaction::Liked => "liked",
            Reaction::Neutral => "neutral",
            Reaction::Disliked => "disliked",
        };
        f.write_str(name)
    }
}

/// Reaction to a set of flavor tokens given a favorite and a hated group.
///
/// A lone favorite flavor is loved; a favorite among others is liked; a
/// hated flavor without the favorite is disliked; anything else is neutral.
pub fn evaluate_reaction(favorite: &str, hated: &str, tokens: &[&str]) -> Reaction {
    let has = |group: &str| !group.is_empty() && tokens.iter().any(|t| t.eq_ignore_ascii_case(group));
    match (has(favorite), has(hated)) {
        (true, false) if tokens.len() == 1 => Reaction::Loved,
        (true, false) => Reaction::Liked,
        (false, true) => Reaction::Disliked,
        _ => Reaction::Neutral,
    }
}

/// Loyalty change for one serving.
pub fn loyalty_change(reaction: Reaction, fast_service: bool) -> i32 {
    let mut delta = reaction.loyalty_delta();
    if fast_service && reaction != Reaction::Disliked {
        delta += FAST_SERVICE_BONUS;
    }
    delta
}

pub fn loyalty_multiplier(loyalty: i32) -> f32 {
    1.0 + (loyalty as f32 / 100.0) * LOYALTY_GOLD_WEIGHT
}

pub fn renown_multiplier(renown: f32) -> f32 {
    1.0 + (renown / 100.0) * RENOWN_GOLD_WEIGHT
}

/// Gold for one serving: at least 1 when the item has a price.
pub fn gold_earned(base_price: u32, reaction: Reaction, loyalty: i32, renown: f32) -> u32 {
    if base_price == 0 {
        return 0;
    }
    let raw = base_price as f32
        * reaction.taste_multiplier()
        * loyalty_multiplier(loyalty)
        * renown_multiplier(renown);
    (raw.round() as u32).max(1)
}

pub fn rarity_factor(rarity: Rarity) -> f32 {
    match rarity {
        Rarity::Common => 0.0,
        Rarity::Uncommon => 0.10,
        Rarity::Rare => 0.25,
        Rarity::Legendary => 0.50,
    }
}

/// Most a guest will pay for an item.
pub fn max_price(base_cost: u32, renown: f32, loyalty: i32, reaction: Reaction, rarity: Rarity) -> f32 {
    let renown_factor = (renown / 100.0) * RENOWN_GOLD_WEIGHT;
    let loyalty_factor = (loyalty as f32 / 100.0) * LOYALTY_GOLD_WEIGHT;
    base_cost as f32
        * (BASE_MARKUP + renown_factor + loyalty_factor + reaction.flavor_match_bonus() + rarity_factor(rarity))
}

pub fn accepts_sale(asking_price: u32, max_price: f32) -> bool {
    asking_price as f32 <= max_price
}
