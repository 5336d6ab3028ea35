//! Serving and economy integration tests

mod common;

use tavern_core::economy::Reaction;
use tavern_core::setup::{default_catalog, default_requirements};
use tavern_core::{GuestState, NpcId, SeatRef, Tavern, TavernConfig, TavernError};
use tavern_events::{EventKind, SimTime};

fn open_tavern(npcs: u32) -> Tavern {
    let mut tavern = Tavern::new(
        TavernConfig::default(),
        default_catalog(),
        default_requirements(),
        SimTime::at(0, 9),
    );
    for id in 1..=npcs {
        tavern.add_npc(common::adventurer(id, "warrior", &[]));
    }
    tavern.tick();
    for id in 1..=npcs {
        common::admit(&mut tavern, id);
    }
    tavern.drain_events();
    tavern
}

/// A favorite flavor is loved: loyalty, gold, renown and a longer stay.
#[test]
fn test_loved_serving_on_the_floor() {
    let mut tavern = open_tavern(1);
    let departs = tavern.registry().guest(NpcId(1)).unwrap().departs_at.unwrap();

    let result = tavern.serve_item(NpcId(1), "smoked_sausage", false).unwrap();

    assert_eq!(result.reaction, Reaction::Loved);
    assert_eq!(result.loyalty_change, 6);
    assert_eq!(result.gold_earned, 12);
    assert_eq!(result.stay_bonus_minutes, 5);
    assert_eq!(tavern.state().gold, 112);
    assert!((tavern.state().renown - 10.2).abs() < 1e-4);
    assert_eq!(tavern.pantry().stock("smoked_sausage"), 19);

    let later = departs.plus_minutes(5);
    assert_eq!(tavern.registry().guest(NpcId(1)).unwrap().departs_at, Some(later));
    assert_eq!(tavern.scheduler().pending_departure(NpcId(1)), Some(later));
}

/// Seated guests get fast service on top of the reaction.
#[test]
fn test_seated_serving_is_fast() {
    let mut tavern = open_tavern(1);
    tavern.seat_guest(NpcId(1), SeatRef::new(1, 0)).unwrap();
    assert_eq!(tavern.registry().guest_state(NpcId(1)), Some(GuestState::Seats));

    let result = tavern.serve_item(NpcId(1), "smoked_sausage", true).unwrap();
    assert_eq!(result.loyalty_change, 7);

    // Hated flavors cost loyalty regardless of speed
    let result = tavern.serve_item(NpcId(1), "dandelion_salad", true).unwrap();
    assert_eq!(result.reaction, Reaction::Disliked);
    assert_eq!(result.loyalty_change, -6);
    assert_eq!(tavern.registry().npc(NpcId(1)).unwrap().loyalty, 1);
}

/// A satisfied need comes back after the refresh interval.
#[test]
fn test_need_returns_after_refresh() {
    let mut tavern = open_tavern(1);
    tavern.ctx().registry.npc_mut(NpcId(1)).unwrap().needs.hungry = true;

    tavern.serve_item(NpcId(1), "honey_cake", false).unwrap();
    assert!(!tavern.registry().npc(NpcId(1)).unwrap().needs.hungry);

    tavern.run_for(89 * 60);
    assert!(!tavern.registry().npc(NpcId(1)).unwrap().needs.hungry);
    tavern.run_for(60);
    assert!(tavern.registry().npc(NpcId(1)).unwrap().needs.hungry);
}

/// An empty pantry refuses service until restocked.
#[test]
fn test_out_of_stock_until_restocked() {
    let mut config = TavernConfig::default();
    config.economy.starting_stock = 0;
    let mut tavern = Tavern::new(config, default_catalog(), default_requirements(), SimTime::at(0, 9));
    tavern.add_npc(common::adventurer(1, "warrior", &[]));
    tavern.tick();
    common::admit(&mut tavern, 1);

    let err = tavern.serve_item(NpcId(1), "house_ale", false).unwrap_err();
    assert!(matches!(err, TavernError::OutOfStock(_)));
    assert_eq!(tavern.state().gold, 100);

    // 4 gold × 5 at half price, rounded up
    assert_eq!(tavern.restock("house_ale", 5).unwrap(), 10);
    assert_eq!(tavern.state().gold, 90);
    tavern.serve_item(NpcId(1), "house_ale", false).unwrap();
    assert_eq!(tavern.pantry().stock("house_ale"), 4);
}

/// Guests away on a quest cannot be served.
#[test]
fn test_deployed_guest_cannot_be_served() {
    let mut tavern = open_tavern(1);
    let quest = tavern.generate_quest(1);
    let id = quest.id;
    tavern.publish_quest(quest);
    tavern.accept_quest(id, &[NpcId(1)]).unwrap();

    let err = tavern.serve_item(NpcId(1), "house_ale", false).unwrap_err();
    assert!(matches!(err, TavernError::InvalidGuestState { .. }));
    assert_eq!(tavern.pantry().stock("house_ale"), 20);
}

/// Every serving during a day of service shows up in the event stream.
#[test]
fn test_day_of_service_logs_servings() {
    let mut tavern = Tavern::with_default_content(TavernConfig::default());
    common::drive(&mut tavern, 20 * 3600);

    let events = tavern.drain_events();
    let served = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::ItemServed { .. }))
        .count();
    assert!(served > 0, "nobody was served all day");
    for event in &events {
        if let EventKind::ItemServed { item, .. } = &event.kind {
            assert!(tavern.catalog().item(item).is_some());
        }
    }
}
