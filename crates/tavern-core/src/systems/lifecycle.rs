//! Guest Lifecycle
//!
//! Legal transitions of a guest through a visit:
//!
//! ```text
//! Elsewhere → StreetOutside → {StagingArea | TavernFloor} ↔ Seats → Departed
//!                                   ↘ AssignedToQuest → Deployed ↗
//! ```
//!
//! Every transition validates first and mutates second, so a rejected call
//! leaves the registry, the seating and the scheduler untouched.

use rand::Rng;
use tavern_events::{EventKind, SimTime};

use super::context::TavernCtx;
use crate::components::guest::{Guest, GuestState};
use crate::components::npc::NpcId;
use crate::components::seating::SeatRef;
use crate::error::{declined, TavernError, TavernResult};

/// Plans the NPC's next visit and installs a fresh guest wrapper.
///
/// The visit is today if the rolled hour is still ahead, otherwise tomorrow.
pub fn queue_guest(ctx: &mut TavernCtx, npc: NpcId) -> TavernResult<()> {
    if ctx.registry.npc(npc).is_none() {
        return declined(TavernError::UnknownNpc(npc));
    }
    if let Some(state) = ctx.registry.guest_state(npc) {
        if state.is_inside() || state == GuestState::Deployed {
            return declined(TavernError::InvalidGuestState {
                npc,
                state: Some(state),
                action: "be queued",
            });
        }
    }

    let guest = plan_visit(ctx, npc);
    ctx.registry.insert_guest(guest);
    Ok(())
}

fn plan_visit(ctx: &mut TavernCtx, npc: NpcId) -> Guest {
    let hours = ctx.config.hours.clone();
    let guests = ctx.config.guests.clone();
    let now = ctx.now();
    let rng = &mut ctx.rng.0;

    let visit_hour = roll(rng, hours.opening_hour, hours.last_call_hour.saturating_sub(1));
    let visit_day = if now.hour() < visit_hour {
        now.day_index()
    } else {
        now.day_index() + 1
    };
    let wait_tolerance = roll(rng, guests.wait_tolerance_min_hours, guests.wait_tolerance_max_hours);
    let linger = roll(rng, guests.linger_min_minutes, guests.linger_max_minutes);

    Guest::planned(npc, visit_day, visit_hour, wait_tolerance, linger)
}

fn roll<R: Rng>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max <= min {
        min
    } else {
        rng.gen_range(min..=max)
    }
}

/// Seconds a guest stays after admission, stretched by renown.
pub fn linger_seconds(ctx: &TavernCtx, linger_minutes: u32) -> u64 {
    let tuning = &ctx.config.guests;
    let bonus = (ctx.tavern.renown * tuning.renown_linger_bonus).clamp(0.0, tuning.max_linger_bonus);
    (linger_minutes as f32 * 60.0 * (1.0 + bonus)).round() as u64
}

/// Lets a queued guest in: onto the floor if there is room, else into the
/// staging area if that has room, else the guest stays on the street.
///
/// Returns the state the guest ends up in.
pub fn admit_guest(ctx: &mut TavernCtx, npc: NpcId) -> TavernResult<GuestState> {
    let state = current_state(ctx, npc)?;
    if !matches!(state, GuestState::StreetOutside | GuestState::StagingArea) {
        return declined(TavernError::InvalidGuestState {
            npc,
            state: Some(state),
            action: "be admitted",
        });
    }
    if !ctx.is_open() {
        return declined(TavernError::TavernClosed);
    }

    if ctx.floor_has_room() {
        place_on_floor(ctx, npc);
        return Ok(GuestState::TavernFloor);
    }
    if state == GuestState::StreetOutside && ctx.staging_has_room() {
        let now = ctx.now();
        if let Some(guest) = ctx.registry.guest_mut(npc) {
            guest.state = GuestState::StagingArea;
            guest.staged_at = Some(now);
        }
        ctx.emit(EventKind::GuestStaged { npc: npc.0 });
        tracing::debug!("Guest {} waits in the staging area", npc);
        return Ok(GuestState::StagingArea);
    }
    Ok(state)
}

/// Puts a guest on the floor and schedules the departure.
fn place_on_floor(ctx: &mut TavernCtx, npc: NpcId) {
    let now = ctx.now();
    let Some(linger) = ctx.registry.guest(npc).map(|g| g.linger_minutes) else {
        return;
    };
    let departs_at = now.plus_seconds(linger_seconds(ctx, linger));

    if let Some(guest) = ctx.registry.guest_mut(npc) {
        guest.state = GuestState::TavernFloor;
        guest.staged_at = None;
        guest.admitted_at = Some(now);
        guest.departs_at = Some(departs_at);
    }
    ctx.scheduler.schedule_departure(npc, departs_at);
    ctx.emit(EventKind::GuestAdmitted {
        npc: npc.0,
        departs_at,
    });
    tracing::debug!("Guest {} admitted until {}", npc, departs_at);
}

/// Ends a visit. Frees the seat, drops any pending departure, pulls the guest
/// out of an unlocked quest party and queues the next visit.
///
/// Removing a guest who already left is a no-op that returns `Ok(false)`.
pub fn remove_guest(ctx: &mut TavernCtx, npc: NpcId, forced: bool) -> TavernResult<bool> {
    if ctx.registry.npc(npc).is_none() {
        return declined(TavernError::UnknownNpc(npc));
    }
    let state = match ctx.registry.guest_state(npc) {
        None | Some(GuestState::Elsewhere) | Some(GuestState::Departed) => {
            tracing::debug!("Guest {} already gone", npc);
            return Ok(false);
        }
        Some(state) => state,
    };
    match state {
        GuestState::Deployed => {
            return declined(TavernError::InvalidGuestState {
                npc,
                state: Some(state),
                action: "be removed",
            });
        }
        GuestState::StreetOutside => {
            give_up(ctx, npc);
            return Ok(true);
        }
        _ => {}
    }

    if state == GuestState::AssignedToQuest {
        if let Some(quest_id) = ctx.board.quest_of(npc) {
            if let Some(quest) = ctx.board.get_mut(quest_id) {
                quest.party.retain(|member| *member != npc);
            }
        }
    }
    clear_seat(ctx, npc);
    ctx.scheduler.cancel_departure(npc);
    if let Some(guest) = ctx.registry.guest_mut(npc) {
        guest.state = GuestState::Departed;
        guest.departs_at = None;
    }
    ctx.emit(EventKind::GuestDeparted { npc: npc.0, forced });
    tracing::debug!("Guest {} departed (forced: {})", npc, forced);

    requeue(ctx, npc);
    Ok(true)
}

/// Handles a departure that came due on the scheduler.
pub fn depart_on_schedule(ctx: &mut TavernCtx, npc: NpcId) {
    match ctx.registry.guest_state(npc) {
        Some(GuestState::TavernFloor) | Some(GuestState::Seats) => {
            if let Err(e) = remove_guest(ctx, npc, false) {
                tracing::debug!("Scheduled departure of {} dropped: {}", npc, e);
            }
        }
        other => {
            tracing::debug!("Stale departure for {} while {:?}", npc, other);
        }
    }
}

/// A street guest stops waiting and comes back another day.
fn give_up(ctx: &mut TavernCtx, npc: NpcId) {
    requeue(ctx, npc);
    let next_visit_day = ctx.registry.guest(npc).map_or(0, |g| g.visit_day);
    ctx.emit(EventKind::GuestGaveUp {
        npc: npc.0,
        next_visit_day,
    });
}

fn requeue(ctx: &mut TavernCtx, npc: NpcId) {
    let guest = plan_visit(ctx, npc);
    ctx.registry.insert_guest(guest);
}

/// Brings a guest back from a quest party or a finished quest.
///
/// The guest comes back through the door: onto the floor when open with
/// room, onto the street when open but full, and back to the visit queue
/// when closed.
pub fn return_to_tavern(ctx: &mut TavernCtx, npc: NpcId) {
    let now = ctx.now();
    ctx.scheduler.cancel_departure(npc);
    let has_wrapper = ctx.registry.guest(npc).is_some();
    if !has_wrapper || !ctx.is_open() {
        requeue(ctx, npc);
        return;
    }
    // Off the floor first so the room check does not count the guest
    if let Some(guest) = ctx.registry.guest_mut(npc) {
        guest.state = GuestState::StreetOutside;
        guest.arrived_at = Some(now);
        guest.visit_day = now.day_index();
        guest.visit_hour = now.hour();
        guest.staged_at = None;
        guest.departs_at = None;
    }
    if ctx.floor_has_room() {
        place_on_floor(ctx, npc);
    }
}

/// Moves a floor guest into a seat.
pub fn seat_guest(ctx: &mut TavernCtx, npc: NpcId, seat: SeatRef) -> TavernResult<()> {
    let state = current_state(ctx, npc)?;
    if !matches!(state, GuestState::TavernFloor | GuestState::Seats) {
        return declined(TavernError::InvalidGuestState {
            npc,
            state: Some(state),
            action: "be seated",
        });
    }
    if !ctx.seating.exists(seat) {
        return declined(TavernError::UnknownSeat(seat));
    }
    match ctx.seating.occupant(seat) {
        Some(current) if current == npc => return Ok(()),
        Some(_) => return declined(TavernError::SeatTaken(seat)),
        None => {}
    }

    clear_seat(ctx, npc);
    ctx.seating.assign(npc, seat);
    if let Some(guest) = ctx.registry.guest_mut(npc) {
        guest.state = GuestState::Seats;
    }
    ctx.emit(EventKind::GuestSeated {
        npc: npc.0,
        table: seat.table as u32,
        seat: seat.seat as u32,
    });
    Ok(())
}

/// Moves a seated guest back to the floor.
pub fn unseat_guest(ctx: &mut TavernCtx, npc: NpcId) -> TavernResult<()> {
    let state = current_state(ctx, npc)?;
    if state != GuestState::Seats {
        return declined(TavernError::InvalidGuestState {
            npc,
            state: Some(state),
            action: "be unseated",
        });
    }
    clear_seat(ctx, npc);
    if let Some(guest) = ctx.registry.guest_mut(npc) {
        guest.state = GuestState::TavernFloor;
    }
    Ok(())
}

/// Frees the guest's seat, if any.
pub(crate) fn clear_seat(ctx: &mut TavernCtx, npc: NpcId) {
    if let Some(seat) = ctx.seating.free(npc) {
        ctx.emit(EventKind::GuestUnseated {
            npc: npc.0,
            table: seat.table as u32,
            seat: seat.seat as u32,
        });
    }
}

fn current_state(ctx: &TavernCtx, npc: NpcId) -> TavernResult<GuestState> {
    if ctx.registry.npc(npc).is_none() {
        return declined(TavernError::UnknownNpc(npc));
    }
    match ctx.registry.guest_state(npc) {
        Some(state) => Ok(state),
        None => declined(TavernError::InvalidGuestState {
            npc,
            state: None,
            action: "act",
        }),
    }
}

/// One pass of arrivals, admissions and give-ups at the current time.
pub fn tick_guests(ctx: &mut TavernCtx) {
    let now = ctx.now();

    if ctx.is_open() {
        let arriving: Vec<NpcId> = ctx
            .registry
            .guests()
            .filter(|g| g.should_arrive(now))
            .map(|g| g.npc)
            .collect();
        for npc in arriving {
            arrive(ctx, npc, now);
        }

        for npc in ctx.registry.staging_queue() {
            if !ctx.floor_has_room() {
                break;
            }
            place_on_floor(ctx, npc);
        }

        for npc in ctx.registry.street_queue() {
            if !ctx.floor_has_room() && !ctx.staging_has_room() {
                break;
            }
            // Refused guests wait on the street for the next sweep
            if let Err(e) = admit_guest(ctx, npc) {
                tracing::debug!("{} stays on the street: {}", npc, e);
            }
        }
    }

    let impatient: Vec<NpcId> = ctx
        .registry
        .guests()
        .filter(|g| g.out_of_patience(now))
        .map(|g| g.npc)
        .collect();
    for npc in impatient {
        give_up(ctx, npc);
    }
}

fn arrive(ctx: &mut TavernCtx, npc: NpcId, now: SimTime) {
    if let Some(guest) = ctx.registry.guest_mut(npc) {
        guest.state = GuestState::StreetOutside;
        guest.arrived_at = Some(now);
        // Late arrivals (after a closed stretch) wait from now
        if guest.visit_day < now.day_index() {
            guest.visit_day = now.day_index();
            guest.visit_hour = now.hour();
        }
    }
    ctx.emit(EventKind::GuestArrived { npc: npc.0 });
}

/// Sends every street guest home, returning how many left.
pub fn send_away_street(ctx: &mut TavernCtx) -> usize {
    let street = ctx.registry.ids_in(GuestState::StreetOutside);
    for npc in &street {
        give_up(ctx, *npc);
    }
    street.len()
}

/// Force-removes every guest inside, returning how many were evicted.
pub fn evict_all(ctx: &mut TavernCtx) -> usize {
    let inside: Vec<NpcId> = ctx
        .registry
        .guests()
        .filter(|g| g.state.is_inside())
        .map(|g| g.npc)
        .collect();
    let mut evicted = 0;
    for npc in inside {
        if let Ok(true) = remove_guest(ctx, npc, true) {
            evicted += 1;
        }
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::npc::tests::sample_npc;
    use crate::config::TavernConfig;
    use crate::sim::Tavern;

    fn open_tavern(config: TavernConfig, npcs: u32) -> Tavern {
        let mut tavern = Tavern::bare_at(config, SimTime::at(0, 9));
        for id in 1..=npcs {
            tavern.add_npc(sample_npc(id));
        }
        // First tick runs the opening boundary
        tavern.tick();
        tavern
    }

    fn put_on_street(tavern: &mut Tavern, npc: u32) {
        let now = tavern.now();
        let mut guest = Guest::planned(NpcId(npc), now.day_index(), now.hour(), 3, 60);
        guest.state = GuestState::StreetOutside;
        guest.arrived_at = Some(now);
        tavern.ctx().registry.insert_guest(guest);
    }

    #[test]
    fn test_admit_schedules_departure() {
        let mut tavern = open_tavern(TavernConfig::default(), 1);
        put_on_street(&mut tavern, 1);

        let mut ctx = tavern.ctx();
        let state = admit_guest(&mut ctx, NpcId(1)).unwrap();
        assert_eq!(state, GuestState::TavernFloor);
        let departs = ctx.registry.guest(NpcId(1)).unwrap().departs_at.unwrap();
        assert_eq!(ctx.scheduler.pending_departure(NpcId(1)), Some(departs));
        // 60 minutes stretched by renown 10 × 0.005 = 5%
        assert_eq!(departs, ctx.now().plus_seconds(3780));
    }

    #[test]
    fn test_admit_overflows_to_staging_then_street() {
        let mut config = TavernConfig::default();
        config.capacity.floor_capacity = 1;
        config.capacity.staging_capacity = 1;
        let mut tavern = open_tavern(config, 3);
        for id in 1..=3 {
            put_on_street(&mut tavern, id);
        }

        let mut ctx = tavern.ctx();
        assert_eq!(admit_guest(&mut ctx, NpcId(1)).unwrap(), GuestState::TavernFloor);
        assert_eq!(admit_guest(&mut ctx, NpcId(2)).unwrap(), GuestState::StagingArea);
        assert_eq!(admit_guest(&mut ctx, NpcId(3)).unwrap(), GuestState::StreetOutside);
        assert_eq!(ctx.scheduler.pending_departure(NpcId(2)), None);

        // Freeing the floor promotes the staging guest on the next sweep
        remove_guest(&mut ctx, NpcId(1), true).unwrap();
        tick_guests(&mut ctx);
        assert_eq!(ctx.registry.guest_state(NpcId(2)), Some(GuestState::TavernFloor));
        assert_eq!(ctx.registry.guest_state(NpcId(3)), Some(GuestState::StagingArea));
    }

    #[test]
    fn test_admitting_inside_guest_is_rejected() {
        let mut tavern = open_tavern(TavernConfig::default(), 1);
        put_on_street(&mut tavern, 1);
        let mut ctx = tavern.ctx();
        admit_guest(&mut ctx, NpcId(1)).unwrap();

        let err = admit_guest(&mut ctx, NpcId(1)).unwrap_err();
        assert!(matches!(err, TavernError::InvalidGuestState { .. }));
        assert_eq!(ctx.registry.floor_occupancy(), 1);
    }

    #[test]
    fn test_remove_twice_is_idempotent() {
        let mut tavern = open_tavern(TavernConfig::default(), 1);
        put_on_street(&mut tavern, 1);
        let mut ctx = tavern.ctx();
        admit_guest(&mut ctx, NpcId(1)).unwrap();
        seat_guest(&mut ctx, NpcId(1), SeatRef::new(0, 0)).unwrap();

        assert!(remove_guest(&mut ctx, NpcId(1), true).unwrap());
        assert!(!remove_guest(&mut ctx, NpcId(1), true).unwrap());
        assert_eq!(ctx.seating.occupied_seats(), 0);
        assert!(ctx.scheduler.is_empty());
        assert_eq!(ctx.registry.guest_state(NpcId(1)), Some(GuestState::Elsewhere));

        let departures = ctx
            .events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::GuestDeparted { .. }))
            .count();
        assert_eq!(departures, 1);
    }

    #[test]
    fn test_seat_and_unseat() {
        let mut tavern = open_tavern(TavernConfig::default(), 2);
        put_on_street(&mut tavern, 1);
        put_on_street(&mut tavern, 2);
        let mut ctx = tavern.ctx();
        admit_guest(&mut ctx, NpcId(1)).unwrap();
        admit_guest(&mut ctx, NpcId(2)).unwrap();

        seat_guest(&mut ctx, NpcId(1), SeatRef::new(1, 1)).unwrap();
        assert_eq!(ctx.registry.guest_state(NpcId(1)), Some(GuestState::Seats));
        assert_eq!(
            seat_guest(&mut ctx, NpcId(2), SeatRef::new(1, 1)),
            Err(TavernError::SeatTaken(SeatRef::new(1, 1)))
        );
        assert_eq!(
            seat_guest(&mut ctx, NpcId(2), SeatRef::new(9, 0)),
            Err(TavernError::UnknownSeat(SeatRef::new(9, 0)))
        );

        unseat_guest(&mut ctx, NpcId(1)).unwrap();
        assert_eq!(ctx.registry.guest_state(NpcId(1)), Some(GuestState::TavernFloor));
        assert_eq!(ctx.seating.seat_of(NpcId(1)), None);
    }

    #[test]
    fn test_queue_plans_next_visit() {
        let mut tavern = open_tavern(TavernConfig::default(), 1);
        let mut ctx = tavern.ctx();
        queue_guest(&mut ctx, NpcId(1)).unwrap();
        let guest = ctx.registry.guest(NpcId(1)).unwrap();
        assert_eq!(guest.state, GuestState::Elsewhere);
        assert!((8..22).contains(&guest.visit_hour));
        let expected_day = if guest.visit_hour > 9 { 0 } else { 1 };
        assert_eq!(guest.visit_day, expected_day);
        assert!((60..=180).contains(&guest.linger_minutes));

        assert_eq!(queue_guest(&mut ctx, NpcId(7)), Err(TavernError::UnknownNpc(NpcId(7))));
    }

    #[test]
    fn test_impatient_guest_gives_up() {
        let mut tavern = open_tavern(TavernConfig::default(), 1);
        let now = tavern.now();
        let mut guest = Guest::planned(NpcId(1), now.day_index(), 5, 1, 60);
        guest.state = GuestState::StreetOutside;
        tavern.ctx().registry.insert_guest(guest);

        let mut ctx = tavern.ctx();
        // Block admissions so patience is what decides
        ctx.tavern.open = false;
        tick_guests(&mut ctx);
        assert_eq!(ctx.registry.guest_state(NpcId(1)), Some(GuestState::Elsewhere));
        assert!(ctx
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::GuestGaveUp { npc: 1, .. })));
    }
}
