//! Default Content
//!
//! The stock menu, adventurer classes and quest requirement tables used when
//! no custom content is supplied.

use crate::components::catalog::{Catalog, ClassTemplate, ConsumableKind, MenuItem, Rarity};
use crate::components::npc::{Stat, StatBlock};
use crate::components::quest::{QuestType, RequirementTable, Requirements};

/// Flavor groups that food can carry
pub const FOOD_FLAVORS: &[&str] = &["Smoky", "Spicy", "Savory", "Sweet", "Bitter", "Herbal"];

/// Flavor groups that drinks can carry
pub const DRINK_FLAVORS: &[&str] = &["Malty", "Fruity", "Sweet", "Sour", "Bitter", "Herbal"];

fn menu_item(
    id: &str,
    name: &str,
    kind: ConsumableKind,
    base_price: u32,
    flavor: &str,
    rarity: Rarity,
) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        base_price,
        flavor: flavor.to_string(),
        purchasable: true,
        rarity,
    }
}

fn class(
    id: &str,
    name: &str,
    base: &[(Stat, i32)],
    growth: &[(Stat, f32)],
    roles: &[(Stat, i32)],
) -> ClassTemplate {
    ClassTemplate {
        id: id.to_string(),
        name: name.to_string(),
        base_stats: StatBlock::from_pairs(base),
        growth: growth.to_vec(),
        role_weights: StatBlock::from_pairs(roles),
    }
}

/// Menu items and adventurer classes.
pub fn default_catalog() -> Catalog {
    use ConsumableKind::{Drink, Food};
    use Rarity::*;

    let mut catalog = Catalog::new();
    for item in [
        menu_item("smoked_sausage", "Smoked Sausage", Food, 6, "Smoky", Common),
        menu_item("pepper_stew", "Pepper Stew", Food, 8, "Spicy+Savory", Common),
        menu_item("roast_fowl", "Roast Fowl", Food, 12, "Savory+Herbal", Uncommon),
        menu_item("honey_cake", "Honey Cake", Food, 5, "Sweet", Common),
        menu_item("dandelion_salad", "Dandelion Salad", Food, 4, "Bitter+Herbal", Common),
        menu_item("dragon_chili", "Dragon Chili", Food, 20, "Spicy+Smoky", Rare),
        menu_item("house_ale", "House Ale", Drink, 4, "Malty", Common),
        menu_item("berry_cider", "Berry Cider", Drink, 5, "Fruity+Sweet", Common),
        menu_item("sour_stout", "Sour Stout", Drink, 6, "Sour+Malty", Common),
        menu_item("wormwood_tonic", "Wormwood Tonic", Drink, 7, "Bitter+Herbal", Uncommon),
        menu_item("elven_wine", "Elven Wine", Drink, 25, "Fruity", Legendary),
    ] {
        catalog.add_item(item);
    }

    for template in [
        class(
            "warrior",
            "Warrior",
            &[(Stat::Strength, 6), (Stat::Constitution, 5), (Stat::Dexterity, 3)],
            &[(Stat::Strength, 3.0), (Stat::Constitution, 2.0), (Stat::Tank, 1.0)],
            &[(Stat::Tank, 4), (Stat::Damage, 2)],
        ),
        class(
            "rogue",
            "Rogue",
            &[(Stat::Dexterity, 6), (Stat::Stealth, 4), (Stat::Luck, 3)],
            &[(Stat::Dexterity, 3.0), (Stat::Stealth, 2.0), (Stat::Damage, 1.0)],
            &[(Stat::Damage, 4), (Stat::Support, 1)],
        ),
        class(
            "ranger",
            "Ranger",
            &[(Stat::Dexterity, 5), (Stat::Perception, 4), (Stat::Tracking, 4)],
            &[(Stat::Tracking, 3.0), (Stat::Perception, 2.0), (Stat::Damage, 1.0)],
            &[(Stat::Damage, 3), (Stat::Support, 1)],
        ),
        class(
            "mage",
            "Mage",
            &[(Stat::Intelligence, 6), (Stat::Lore, 4), (Stat::Wisdom, 3)],
            &[(Stat::Intelligence, 3.0), (Stat::Lore, 2.0), (Stat::Damage, 1.0)],
            &[(Stat::Damage, 4)],
        ),
        class(
            "cleric",
            "Cleric",
            &[(Stat::Wisdom, 6), (Stat::Herbalism, 3), (Stat::Constitution, 3)],
            &[(Stat::Wisdom, 3.0), (Stat::Healer, 2.0), (Stat::Herbalism, 1.0)],
            &[(Stat::Healer, 4), (Stat::Tank, 1)],
        ),
        class(
            "bard",
            "Bard",
            &[(Stat::Charisma, 6), (Stat::Persuasion, 4), (Stat::Luck, 3)],
            &[(Stat::Charisma, 3.0), (Stat::Persuasion, 2.0), (Stat::Support, 1.0)],
            &[(Stat::Support, 4), (Stat::Healer, 1)],
        ),
    ] {
        catalog.add_class(template);
    }
    catalog
}

/// Level 1 and level 5 thresholds for every quest type. Other levels are
/// extrapolated by the table.
pub fn default_requirements() -> RequirementTable {
    let rows: [(QuestType, &[(Stat, i32)], &[(Stat, i32)]); 8] = [
        (QuestType::Hunt, &[(Stat::Damage, 3), (Stat::Tracking, 2)], &[(Stat::Dexterity, 6)]),
        (QuestType::Escort, &[(Stat::Tank, 3)], &[(Stat::Perception, 4), (Stat::Healer, 2)]),
        (QuestType::Gather, &[(Stat::Herbalism, 2)], &[(Stat::Perception, 3), (Stat::Luck, 3)]),
        (QuestType::Explore, &[(Stat::Perception, 3)], &[(Stat::Tracking, 3), (Stat::Lore, 2)]),
        (QuestType::Rescue, &[(Stat::Tank, 2), (Stat::Healer, 2)], &[(Stat::Stealth, 3)]),
        (QuestType::Deliver, &[(Stat::Dexterity, 3)], &[(Stat::Persuasion, 3)]),
        (QuestType::Investigate, &[(Stat::Lore, 3)], &[(Stat::Perception, 4), (Stat::Persuasion, 2)]),
        (QuestType::Defend, &[(Stat::Tank, 4)], &[(Stat::Damage, 4), (Stat::Support, 2)]),
    ];

    let mut table = RequirementTable::new();
    for (quest_type, required, bonus) in rows {
        let base = Requirements::new(required, bonus);
        table.insert(quest_type, 1, base.clone());
        let scaled: Vec<(Stat, i32)> = required.iter().map(|(s, v)| (*s, v * 3)).collect();
        let scaled_bonus: Vec<(Stat, i32)> = bonus.iter().map(|(s, v)| (*s, v * 2)).collect();
        table.insert(quest_type, 5, Requirements::new(&scaled, &scaled_bonus));
    }
    table
}
