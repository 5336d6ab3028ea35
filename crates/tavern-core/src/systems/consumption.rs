//! Consumption & Sales
//!
//! Serving food and drink to guests, restocking the pantry, and the
//! willingness-to-pay gate for direct sales.

use rand::Rng;
use tavern_events::EventKind;

use super::context::TavernCtx;
use crate::components::npc::{NeedKind, NpcId};
use crate::economy::{
    accepts_sale, evaluate_reaction, gold_earned, loyalty_change, max_price, Reaction,
};
use crate::error::{declined, TavernError, TavernResult};

/// Renown change for a loved or disliked serving
const SERVING_RENOWN: f32 = 0.2;

/// What a single serving did.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionResult {
    pub reaction: Reaction,
    /// Loyalty change actually applied after clamping
    pub loyalty_change: i32,
    pub gold_earned: u32,
    pub stay_bonus_minutes: u32,
    pub wants_another_serving: bool,
}

/// Serves one unit of a menu item to a guest on the floor or seated.
pub fn serve_item(
    ctx: &mut TavernCtx,
    npc: NpcId,
    item_id: &str,
    fast: bool,
) -> TavernResult<ConsumptionResult> {
    let Some(item) = ctx.catalog.item(item_id) else {
        return declined(TavernError::UnknownItem(item_id.to_string()));
    };
    let Some(record) = ctx.registry.npc(npc) else {
        return declined(TavernError::UnknownNpc(npc));
    };
    let state = ctx.registry.guest_state(npc);
    if !state.map_or(false, |s| s.can_be_served()) {
        return declined(TavernError::InvalidGuestState {
            npc,
            state,
            action: "be served",
        });
    }
    if ctx.pantry.stock(item_id) == 0 {
        return declined(TavernError::OutOfStock(item_id.to_string()));
    }

    let (favorite, hated) = record.preferences.taste(item.kind);
    let reaction = evaluate_reaction(favorite, hated, &item.flavor_tokens());
    let gold = gold_earned(item.base_price, reaction, record.loyalty, ctx.tavern.renown);
    let kind = item.kind;
    let item_name = item.name.clone();

    ctx.pantry.take_one(item_id);
    let need = NeedKind::satisfied_by(kind);
    let applied = match ctx.registry.npc_mut(npc) {
        Some(record) => {
            let applied = record.adjust_loyalty(loyalty_change(reaction, fast));
            record.adjust_happiness(applied / 2);
            record.needs.set(need, false);
            record.needs.last_consumed = Some(kind);
            applied
        }
        None => 0,
    };

    ctx.tavern.gold += gold as i64;
    match reaction {
        Reaction::Loved => ctx.tavern.adjust_renown(SERVING_RENOWN),
        Reaction::Disliked => ctx.tavern.adjust_renown(-SERVING_RENOWN),
        Reaction::Liked | Reaction::Neutral => {}
    }

    let now = ctx.now();
    let refresh_at = now.plus_minutes(ctx.config.guests.need_refresh_minutes as u64);
    ctx.scheduler.schedule_refresh(npc, need, refresh_at);

    let stay_bonus = reaction.stay_bonus_minutes();
    if stay_bonus > 0 {
        extend_stay(ctx, npc, stay_bonus);
    }

    let wants_another = ctx.rng.0.gen::<f32>() < reaction.repeat_chance();

    ctx.emit(EventKind::ItemServed {
        npc: npc.0,
        item: item_id.to_string(),
        reaction: reaction.to_string(),
        gold,
        loyalty_change: applied,
    });
    if wants_another {
        ctx.emit(EventKind::ServingRequested {
            npc: npc.0,
            item: item_id.to_string(),
        });
    }
    tracing::debug!("Served {} to {}: {} (+{} gold)", item_name, npc, reaction, gold);

    Ok(ConsumptionResult {
        reaction,
        loyalty_change: applied,
        gold_earned: gold,
        stay_bonus_minutes: stay_bonus,
        wants_another_serving: wants_another,
    })
}

/// Pushes the guest's scheduled departure back.
fn extend_stay(ctx: &mut TavernCtx, npc: NpcId, minutes: u32) {
    let Some(guest) = ctx.registry.guest_mut(npc) else {
        return;
    };
    let Some(departs_at) = guest.departs_at else {
        return;
    };
    let later = departs_at.plus_minutes(minutes as u64);
    guest.departs_at = Some(later);
    ctx.scheduler.schedule_departure(npc, later);
}

/// Buys stock for the pantry at half the base price, rounded up.
///
/// Returns the gold spent.
pub fn restock(ctx: &mut TavernCtx, item_id: &str, quantity: u32) -> TavernResult<i64> {
    let Some(item) = ctx.catalog.item(item_id) else {
        return declined(TavernError::UnknownItem(item_id.to_string()));
    };
    let cost = (item.base_price as i64 * quantity as i64 + 1) / 2;
    if !ctx.tavern.can_afford(cost) {
        return declined(TavernError::InsufficientGold {
            needed: cost,
            available: ctx.tavern.gold,
        });
    }
    ctx.tavern.gold -= cost;
    ctx.pantry.add(item_id, quantity);
    tracing::debug!("Restocked {} × {} for {} gold", quantity, item_id, cost);
    Ok(cost)
}

/// Offers an item to a guest at an asking price.
///
/// The guest buys only if the price is within what they are willing to pay.
pub fn sell_item(ctx: &mut TavernCtx, npc: NpcId, item_id: &str, asking: u32) -> TavernResult<()> {
    let Some(item) = ctx.catalog.item(item_id) else {
        return declined(TavernError::UnknownItem(item_id.to_string()));
    };
    if !item.purchasable {
        return declined(TavernError::NotPurchasable(item_id.to_string()));
    }
    let Some(record) = ctx.registry.npc(npc) else {
        return declined(TavernError::UnknownNpc(npc));
    };
    let state = ctx.registry.guest_state(npc);
    if !state.map_or(false, |s| s.can_be_served()) {
        return declined(TavernError::InvalidGuestState {
            npc,
            state,
            action: "buy",
        });
    }
    if ctx.pantry.stock(item_id) == 0 {
        return declined(TavernError::OutOfStock(item_id.to_string()));
    }

    let (favorite, hated) = record.preferences.taste(item.kind);
    let reaction = evaluate_reaction(favorite, hated, &item.flavor_tokens());
    let limit = max_price(
        item.base_price,
        ctx.tavern.renown,
        record.loyalty,
        reaction,
        item.rarity,
    );
    if !accepts_sale(asking, limit) {
        return declined(TavernError::PriceRejected {
            npc,
            asking,
            max_price: limit,
        });
    }

    ctx.pantry.take_one(item_id);
    ctx.tavern.gold += asking as i64;
    ctx.emit(EventKind::ItemSold {
        npc: npc.0,
        item: item_id.to_string(),
        price: asking,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::catalog::{Catalog, ConsumableKind, MenuItem, Rarity};
    use crate::components::guest::{Guest, GuestState};
    use crate::components::npc::tests::sample_npc;
    use crate::components::quest::RequirementTable;
    use crate::config::TavernConfig;
    use crate::sim::Tavern;
    use tavern_events::SimTime;

    fn item(id: &str, kind: ConsumableKind, price: u32, flavor: &str) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            base_price: price,
            flavor: flavor.to_string(),
            purchasable: true,
            rarity: Rarity::Common,
        }
    }

    fn tavern_with_guest() -> Tavern {
        let mut catalog = Catalog::new();
        catalog.add_item(item("smoked_ham", ConsumableKind::Food, 10, "Smoky"));
        catalog.add_item(item("spiced_stew", ConsumableKind::Food, 10, "Smoky+Spicy"));
        catalog.add_item(item("bitter_greens", ConsumableKind::Food, 10, "Bitter"));
        catalog.add_item(item("honey_mead", ConsumableKind::Drink, 8, "Sweet"));
        let mut tavern = Tavern::new(
            TavernConfig::default(),
            catalog,
            RequirementTable::new(),
            SimTime::at(0, 9),
        );
        tavern.add_npc(sample_npc(1));
        tavern.tick();

        let now = tavern.now();
        let mut ctx = tavern.ctx();
        let mut guest = Guest::planned(NpcId(1), 0, 9, 3, 60);
        guest.state = GuestState::TavernFloor;
        guest.admitted_at = Some(now);
        guest.departs_at = Some(now.plus_hours(1));
        ctx.scheduler.schedule_departure(NpcId(1), now.plus_hours(1));
        ctx.registry.insert_guest(guest);
        if let Some(npc) = ctx.registry.npc_mut(NpcId(1)) {
            npc.needs.hungry = true;
        }
        tavern
    }

    #[test]
    fn test_single_favorite_flavor_is_loved() {
        let mut tavern = tavern_with_guest();
        let mut ctx = tavern.ctx();
        let stock = ctx.pantry.stock("smoked_ham");
        let departs = ctx.registry.guest(NpcId(1)).unwrap().departs_at.unwrap();

        let result = serve_item(&mut ctx, NpcId(1), "smoked_ham", false).unwrap();
        assert_eq!(result.reaction, Reaction::Loved);
        assert_eq!(result.loyalty_change, 6);
        assert_eq!(result.stay_bonus_minutes, 5);
        // 10 × 1.2 × 1.0 × 1.01 = 12.12
        assert_eq!(result.gold_earned, 12);

        let npc = ctx.registry.npc(NpcId(1)).unwrap();
        assert_eq!(npc.loyalty, 6);
        assert_eq!(npc.happiness, 3);
        assert!(!npc.needs.hungry);
        assert_eq!(npc.needs.last_consumed, Some(ConsumableKind::Food));
        assert_eq!(ctx.pantry.stock("smoked_ham"), stock - 1);
        assert_eq!(
            ctx.scheduler.pending_departure(NpcId(1)),
            Some(departs.plus_minutes(5))
        );
    }

    #[test]
    fn test_fast_service_adds_loyalty() {
        let mut tavern = tavern_with_guest();
        let mut ctx = tavern.ctx();
        let result = serve_item(&mut ctx, NpcId(1), "smoked_ham", true).unwrap();
        assert_eq!(result.loyalty_change, 7);

        let result = serve_item(&mut ctx, NpcId(1), "spiced_stew", true).unwrap();
        assert_eq!(result.reaction, Reaction::Liked);
        assert_eq!(result.loyalty_change, 4);

        let result = serve_item(&mut ctx, NpcId(1), "bitter_greens", true).unwrap();
        assert_eq!(result.reaction, Reaction::Disliked);
        assert_eq!(result.loyalty_change, -6);
        assert_eq!(result.stay_bonus_minutes, 0);
        assert!(!result.wants_another_serving);
    }

    #[test]
    fn test_serve_schedules_need_refresh() {
        let mut tavern = tavern_with_guest();
        {
            let mut ctx = tavern.ctx();
            serve_item(&mut ctx, NpcId(1), "honey_mead", false).unwrap();
            assert!(!ctx.registry.npc(NpcId(1)).unwrap().needs.thirsty);
        }
        tavern.run_for(90 * 60);
        assert!(tavern.ctx().registry.npc(NpcId(1)).unwrap().needs.thirsty);
    }

    #[test]
    fn test_second_serving_pushes_refresh_back() {
        let mut tavern = tavern_with_guest();
        {
            let mut ctx = tavern.ctx();
            serve_item(&mut ctx, NpcId(1), "smoked_ham", false).unwrap();
        }
        tavern.run_for(30 * 60);
        {
            let mut ctx = tavern.ctx();
            if let Some(npc) = ctx.registry.npc_mut(NpcId(1)) {
                npc.needs.hungry = true;
            }
            serve_item(&mut ctx, NpcId(1), "smoked_ham", false).unwrap();
            let again = ctx.now().plus_minutes(90);
            assert_eq!(ctx.scheduler.pending_refresh(NpcId(1), NeedKind::Hunger), Some(again));
        }

        // Past the first serving's refresh time
        tavern.run_for(60 * 60);
        assert!(!tavern.ctx().registry.npc(NpcId(1)).unwrap().needs.hungry);
        tavern.run_for(30 * 60);
        assert!(tavern.ctx().registry.npc(NpcId(1)).unwrap().needs.hungry);
    }

    #[test]
    fn test_serve_rejections_leave_state() {
        let mut tavern = tavern_with_guest();
        let mut ctx = tavern.ctx();
        let gold = ctx.tavern.gold;

        assert_eq!(
            serve_item(&mut ctx, NpcId(1), "dragon_egg", false),
            Err(TavernError::UnknownItem("dragon_egg".to_string()))
        );
        while ctx.pantry.take_one("smoked_ham") {}
        assert_eq!(
            serve_item(&mut ctx, NpcId(1), "smoked_ham", false),
            Err(TavernError::OutOfStock("smoked_ham".to_string()))
        );
        if let Some(guest) = ctx.registry.guest_mut(NpcId(1)) {
            guest.state = GuestState::StagingArea;
        }
        let err = serve_item(&mut ctx, NpcId(1), "honey_mead", false).unwrap_err();
        assert!(matches!(err, TavernError::InvalidGuestState { .. }));
        assert_eq!(ctx.tavern.gold, gold);
        assert_eq!(ctx.registry.npc(NpcId(1)).unwrap().loyalty, 0);
    }

    #[test]
    fn test_restock_costs_half_price() {
        let mut tavern = tavern_with_guest();
        let mut ctx = tavern.ctx();
        ctx.tavern.gold = 30;
        let before = ctx.pantry.stock("honey_mead");
        assert_eq!(restock(&mut ctx, "honey_mead", 5), Ok(20));
        assert_eq!(ctx.tavern.gold, 10);
        assert_eq!(ctx.pantry.stock("honey_mead"), before + 5);
        assert_eq!(
            restock(&mut ctx, "honey_mead", 5),
            Err(TavernError::InsufficientGold {
                needed: 20,
                available: 10
            })
        );
    }

    #[test]
    fn test_sale_gated_by_willingness() {
        let mut tavern = tavern_with_guest();
        let mut ctx = tavern.ctx();
        // Loved, common, loyalty 0, renown 10: 10 × (1.25 + 0.01 + 0.30) = 15.6
        let err = sell_item(&mut ctx, NpcId(1), "smoked_ham", 16).unwrap_err();
        assert!(matches!(err, TavernError::PriceRejected { asking: 16, .. }));

        let gold = ctx.tavern.gold;
        sell_item(&mut ctx, NpcId(1), "smoked_ham", 15).unwrap();
        assert_eq!(ctx.tavern.gold, gold + 15);
    }
}
