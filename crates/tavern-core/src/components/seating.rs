//! Tables and Seats
//!
//! Seat occupancy is stored once, as an optional guest id per seat, so the
//! seat ↔ guest relation cannot drift out of sync.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::npc::NpcId;

/// A (table, seat) position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatRef {
    pub table: usize,
    pub seat: usize,
}

impl SeatRef {
    pub fn new(table: usize, seat: usize) -> Self {
        Self { table, seat }
    }
}

impl fmt::Display for SeatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {} seat {}", self.table, self.seat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    seats: Vec<Option<NpcId>>,
}

impl Table {
    pub fn new(seat_count: usize) -> Self {
        Self {
            seats: vec![None; seat_count],
        }
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    pub fn occupied(&self) -> usize {
        self.seats.iter().filter(|s| s.is_some()).count()
    }
}

/// Resource: every table in the tavern.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seating {
    tables: Vec<Table>,
}

impl Seating {
    pub fn new(layout: &[usize]) -> Self {
        Self {
            tables: layout.iter().map(|n| Table::new(*n)).collect(),
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn total_seats(&self) -> usize {
        self.tables.iter().map(Table::seat_count).sum()
    }

    pub fn occupied_seats(&self) -> usize {
        self.tables.iter().map(Table::occupied).sum()
    }

    pub fn exists(&self, seat: SeatRef) -> bool {
        self.tables
            .get(seat.table)
            .map_or(false, |t| seat.seat < t.seat_count())
    }

    pub fn occupant(&self, seat: SeatRef) -> Option<NpcId> {
        self.tables
            .get(seat.table)
            .and_then(|t| t.seats.get(seat.seat))
            .copied()
            .flatten()
    }

    /// Seat currently held by a guest.
    pub fn seat_of(&self, npc: NpcId) -> Option<SeatRef> {
        self.tables.iter().enumerate().find_map(|(t, table)| {
            table
                .seats
                .iter()
                .position(|s| *s == Some(npc))
                .map(|s| SeatRef::new(t, s))
        })
    }

    /// First empty seat in table order.
    pub fn first_free(&self) -> Option<SeatRef> {
        self.tables.iter().enumerate().find_map(|(t, table)| {
            table
                .seats
                .iter()
                .position(Option::is_none)
                .map(|s| SeatRef::new(t, s))
        })
    }

    /// Binds a guest to a free seat, releasing any seat the guest held.
    /// Returns false if the seat does not exist or is taken by someone else.
    pub fn assign(&mut self, npc: NpcId, seat: SeatRef) -> bool {
        match self.occupant(seat) {
            Some(current) if current == npc => return true,
            Some(_) => return false,
            None if !self.exists(seat) => return false,
            None => {}
        }
        self.free(npc);
        if let Some(slot) = self
            .tables
            .get_mut(seat.table)
            .and_then(|t| t.seats.get_mut(seat.seat))
        {
            *slot = Some(npc);
            return true;
        }
        false
    }

    /// Releases the guest's seat. Returns the seat that was freed, if any.
    pub fn free(&mut self, npc: NpcId) -> Option<SeatRef> {
        let seat = self.seat_of(npc)?;
        if let Some(slot) = self
            .tables
            .get_mut(seat.table)
            .and_then(|t| t.seats.get_mut(seat.seat))
        {
            *slot = None;
        }
        Some(seat)
    }
}
