//! Random Number Helpers
//!
//! The simulation draws all randomness from one seeded generator so a run is
//! reproducible from its seed.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

/// Cumulative-weight roll over `(item, weight)` pairs.
///
/// Entries with non-positive weight are never picked. Returns `None` when no
/// entry has positive weight.
pub fn weighted_pick<T: Copy, R: Rng>(rng: &mut R, candidates: &[(T, f32)]) -> Option<T> {
    let total: f32 = candidates
        .iter()
        .filter(|(_, w)| *w > 0.0)
        .map(|(_, w)| *w)
        .sum();
    if total <= 0.0 {
        return None;
    }

    let roll = rng.gen::<f32>() * total;
    let mut cumulative = 0.0;
    let mut last = None;
    for (item, weight) in candidates.iter().filter(|(_, w)| *w > 0.0) {
        cumulative += weight;
        last = Some(*item);
        if roll < cumulative {
            return Some(*item);
        }
    }
    // Float rounding can leave the roll just past the final boundary
    last
}
