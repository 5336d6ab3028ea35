//! Autopilot
//!
//! Stands in for the player when the simulation runs headless. Every call to
//! [`step`] looks at the current tavern and issues the same operations a
//! player would: seating, serving, posting and staffing quests, cleaning up
//! the board and topping up the pantry. All choices are deterministic given
//! the tavern state and the shared RNG.

use crate::components::catalog::ConsumableKind;
use crate::components::guest::GuestState;
use crate::components::npc::{NeedKind, NpcId, Role};
use crate::components::quest::quest_constants::{MAX_PARTY_SIZE, SUCCESS_THRESHOLD};
use crate::components::quest::{match_score, pooled_stats, QuestId, Requirements};
use crate::systems::{self, TavernCtx};

/// Simulated seconds between autopilot passes
pub const AUTOPILOT_INTERVAL: u64 = 15 * 60;

/// Restock when an item falls below this many units
const LOW_STOCK: u32 = 3;
const RESTOCK_QUANTITY: u32 = 10;

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutopilotReport {
    pub seated: usize,
    pub served: usize,
    pub posted: usize,
    pub parties_sent: usize,
    pub retried: usize,
    pub dismissed: usize,
    pub restocked: usize,
}

/// Runs one autopilot pass.
pub fn step(ctx: &mut TavernCtx) -> AutopilotReport {
    let mut report = AutopilotReport::default();
    if ctx.is_open() {
        seat_guests(ctx, &mut report);
        serve_guests(ctx, &mut report);
        post_quests(ctx, &mut report);
        staff_quests(ctx, &mut report);
    }
    clear_board(ctx, &mut report);
    restock_pantry(ctx, &mut report);

    if report != AutopilotReport::default() {
        tracing::debug!("Autopilot at {}: {:?}", ctx.now(), report);
    }
    report
}

fn seat_guests(ctx: &mut TavernCtx, report: &mut AutopilotReport) {
    for npc in ctx.registry.ids_in(GuestState::TavernFloor) {
        let Some(seat) = ctx.seating.first_free() else {
            break;
        };
        if systems::seat_guest(ctx, npc, seat).is_ok() {
            report.seated += 1;
        }
    }
}

/// Picks an in-stock item of the right kind, favoring the guest's favorite
/// flavor and then the cheapest.
fn choose_item(ctx: &TavernCtx, npc: NpcId, kind: ConsumableKind) -> Option<String> {
    let record = ctx.registry.npc(npc)?;
    let (favorite, hated) = record.preferences.taste(kind);
    ctx.catalog
        .items()
        .filter(|item| item.kind == kind && ctx.pantry.stock(&item.id) > 0)
        .filter(|item| !item.flavor_tokens().iter().any(|t| t.eq_ignore_ascii_case(hated)))
        .min_by_key(|item| {
            let loved = item
                .flavor_tokens()
                .iter()
                .any(|t| t.eq_ignore_ascii_case(favorite));
            (!loved, item.base_price, item.id.clone())
        })
        .map(|item| item.id.clone())
}

fn serve_guests(ctx: &mut TavernCtx, report: &mut AutopilotReport) {
    let mut diners: Vec<NpcId> = ctx.registry.ids_in(GuestState::Seats);
    diners.extend(ctx.registry.ids_in(GuestState::TavernFloor));

    for npc in diners {
        for (need, kind) in [
            (NeedKind::Hunger, ConsumableKind::Food),
            (NeedKind::Thirst, ConsumableKind::Drink),
        ] {
            let needy = ctx.registry.npc(npc).map_or(false, |n| n.needs.has(need));
            if !needy {
                continue;
            }
            let Some(item) = choose_item(ctx, npc, kind) else {
                continue;
            };
            // Seated guests get their order faster
            let fast = ctx.registry.guest_state(npc) == Some(GuestState::Seats);
            if let Ok(result) = systems::serve_item(ctx, npc, &item, fast) {
                report.served += 1;
                if result.wants_another_serving && systems::serve_item(ctx, npc, &item, fast).is_ok() {
                    report.served += 1;
                }
            }
        }
    }
}

fn post_quests(ctx: &mut TavernCtx, report: &mut AutopilotReport) {
    if ctx.board.is_full() {
        return;
    }
    let givers: Vec<NpcId> = ctx
        .registry
        .guests()
        .filter(|g| g.state.can_be_served())
        .filter(|g| {
            ctx.registry
                .npc(g.npc)
                .map_or(false, |n| n.role() == Role::QuestGiver && n.posted_quest().is_none())
        })
        .map(|g| g.npc)
        .collect();

    // One posting per pass keeps the board from flooding
    if let Some(poster) = givers.first() {
        if systems::post_quest(ctx, *poster).is_ok() {
            report.posted += 1;
        }
    }
}

/// How much an adventurer's stats cover the requirement thresholds.
fn relevance(ctx: &TavernCtx, npc: NpcId, requirements: &Requirements) -> i32 {
    let Some(record) = ctx.registry.npc(npc) else {
        return 0;
    };
    let required: i32 = requirements.required.keys().map(|s| record.stats.get(*s)).sum();
    let bonus: i32 = requirements.bonus.keys().map(|s| record.stats.get(*s)).sum();
    2 * required + bonus
}

fn available_adventurers(ctx: &TavernCtx) -> Vec<NpcId> {
    ctx.registry
        .guests()
        .filter(|g| {
            matches!(
                g.state,
                GuestState::TavernFloor | GuestState::Seats | GuestState::StagingArea
            )
        })
        .map(|g| g.npc)
        .filter(|npc| {
            ctx.registry
                .npc(*npc)
                .map_or(false, |n| n.is_adventurer() && n.active_quest().is_none())
                && ctx.board.quest_of(*npc).is_none()
        })
        .collect()
}

/// Sends a party out on each posted quest once one can be formed.
///
/// Members are added best-first until the pooled stats pass; a full party
/// is sent even if it falls short.
fn staff_quests(ctx: &mut TavernCtx, report: &mut AutopilotReport) {
    let posted: Vec<(QuestId, Requirements)> = ctx
        .board
        .quests()
        .filter(|q| q.is_posted())
        .map(|q| (q.id, q.requirements.clone()))
        .collect();

    for (quest, requirements) in posted {
        let mut candidates = available_adventurers(ctx);
        candidates.sort_by_key(|npc| (-relevance(ctx, *npc, &requirements), *npc));

        let mut party = Vec::new();
        let mut score = 0.0;
        for npc in candidates.into_iter().take(MAX_PARTY_SIZE) {
            party.push(npc);
            let pooled = pooled_stats(
                party
                    .iter()
                    .filter_map(|m| ctx.registry.npc(*m))
                    .map(|n| &n.stats),
            );
            score = match_score(&requirements, &pooled);
            if score >= SUCCESS_THRESHOLD {
                break;
            }
        }

        let ready = score >= SUCCESS_THRESHOLD || party.len() == MAX_PARTY_SIZE;
        if ready && systems::accept_quest(ctx, quest, &party).is_ok() {
            report.parties_sent += 1;
        }
    }
}

/// Dismisses finished quests; failed ones get one retry when affordable.
fn clear_board(ctx: &mut TavernCtx, report: &mut AutopilotReport) {
    let finished: Vec<(QuestId, bool)> = ctx
        .board
        .quests()
        .filter(|q| q.is_complete())
        .map(|q| (q.id, q.is_failed() && q.retries == 0))
        .collect();

    for (quest, retry) in finished {
        if retry && ctx.is_open() && systems::retry_quest(ctx, quest).is_ok() {
            report.retried += 1;
            continue;
        }
        if systems::dismiss_quest(ctx, quest).is_ok() {
            report.dismissed += 1;
        }
    }
}

fn restock_pantry(ctx: &mut TavernCtx, report: &mut AutopilotReport) {
    let low: Vec<String> = ctx
        .catalog
        .items()
        .filter(|item| ctx.pantry.stock(&item.id) < LOW_STOCK)
        .map(|item| item.id.clone())
        .collect();
    for item in low {
        if systems::restock(ctx, &item, RESTOCK_QUANTITY).is_ok() {
            report.restocked += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::guest::Guest;
    use crate::components::npc::tests::sample_npc;
    use crate::components::npc::{Stat, StatBlock};
    use crate::components::quest::{PostOutcome, Requirements};
    use crate::config::TavernConfig;
    use crate::setup::{default_catalog, default_requirements};
    use crate::sim::Tavern;
    use tavern_events::SimTime;

    fn open_tavern(config: TavernConfig, ids: &[u32]) -> Tavern {
        let mut tavern = Tavern::new(config, default_catalog(), default_requirements(), SimTime::at(0, 9));
        for id in ids {
            tavern.add_npc(sample_npc(*id));
        }
        tavern.tick();
        for id in ids {
            let now = tavern.now();
            let mut guest = Guest::planned(NpcId(*id), 0, 9, 3, 120);
            guest.state = GuestState::StreetOutside;
            guest.arrived_at = Some(now);
            tavern.ctx().registry.insert_guest(guest);
            tavern.admit_guest(NpcId(*id)).unwrap();
        }
        tavern
    }

    #[test]
    fn test_seats_floor_guests() {
        let mut tavern = open_tavern(TavernConfig::default(), &[1, 2]);
        let report = step(&mut tavern.ctx());
        assert_eq!(report.seated, 2);
        assert_eq!(tavern.seating().occupied_seats(), 2);
    }

    #[test]
    fn test_serves_favorites_to_needy_guests() {
        let mut tavern = open_tavern(TavernConfig::default(), &[1]);
        {
            let mut ctx = tavern.ctx();
            let npc = ctx.registry.npc_mut(NpcId(1)).unwrap();
            npc.needs.hungry = true;
            npc.needs.thirsty = false;
        }
        let report = step(&mut tavern.ctx());
        assert!(report.served >= 1);
        // Cheapest smoky dish
        assert!(tavern.pantry().stock("smoked_sausage") < 20);
        assert!(!tavern.registry().npc(NpcId(1)).unwrap().needs.hungry);
    }

    #[test]
    fn test_restocks_low_items() {
        let mut config = TavernConfig::default();
        config.economy.starting_stock = 0;
        config.economy.starting_gold = 1_000;
        let mut tavern = open_tavern(config, &[]);

        let report = step(&mut tavern.ctx());
        assert_eq!(report.restocked, 11);
        assert!(tavern.catalog().items().all(|i| tavern.pantry().stock(&i.id) == RESTOCK_QUANTITY));
        assert_eq!(tavern.state().gold, 490);
    }

    #[test]
    fn test_sends_qualified_party() {
        let mut tavern = open_tavern(TavernConfig::default(), &[1, 2, 3]);
        {
            let mut ctx = tavern.ctx();
            let npc = ctx.registry.npc_mut(NpcId(2)).unwrap();
            npc.stats = StatBlock::from_pairs(&[(Stat::Tank, 8)]);
        }
        let mut quest = tavern.generate_quest(1);
        quest.requirements = Requirements::new(&[(Stat::Tank, 5)], &[]);
        let id = quest.id;
        assert_eq!(tavern.publish_quest(quest), PostOutcome::Posted);

        let report = step(&mut tavern.ctx());
        assert_eq!(report.parties_sent, 1);
        assert_eq!(tavern.board().get(id).unwrap().party, vec![NpcId(2)]);
    }

    #[test]
    fn test_closed_tavern_only_tidies() {
        let mut tavern = Tavern::new(
            TavernConfig::default(),
            default_catalog(),
            default_requirements(),
            SimTime::at(0, 23).plus_minutes(30),
        );
        tavern.add_npc(sample_npc(1));
        tavern.tick();
        let report = step(&mut tavern.ctx());
        assert_eq!(report.seated, 0);
        assert_eq!(report.posted, 0);
        assert_eq!(report.parties_sent, 0);
    }
}
