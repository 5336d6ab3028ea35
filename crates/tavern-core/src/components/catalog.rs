//! Static Content Catalog
//!
//! Menu items and adventurer class templates. Lookups that miss return
//! `None`; callers fall back to the raw id for display.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::npc::{Stat, StatBlock};

/// Food or drink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumableKind {
    Food,
    Drink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// Something the tavern can serve or sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub kind: ConsumableKind,
    pub base_price: u32,
    /// Flavor descriptor, e.g. `"Smoky+Salty"`
    pub flavor: String,
    #[serde(default = "default_purchasable")]
    pub purchasable: bool,
    #[serde(default = "default_rarity")]
    pub rarity: Rarity,
}

fn default_purchasable() -> bool {
    true
}

fn default_rarity() -> Rarity {
    Rarity::Common
}

impl MenuItem {
    /// Distinct flavor tokens, split on `+` and whitespace.
    pub fn flavor_tokens(&self) -> Vec<&str> {
        flavor_tokens(&self.flavor)
    }
}

/// Splits a flavor descriptor into distinct, non-empty tokens in order.
pub fn flavor_tokens(descriptor: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for token in descriptor.split(|c: char| c == '+' || c.is_whitespace()) {
        if !token.is_empty() && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Starting stats and growth of an adventurer class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTemplate {
    pub id: String,
    pub name: String,
    pub base_stats: StatBlock,
    /// Weight of each stat in the level-up growth roll
    pub growth: Vec<(Stat, f32)>,
    /// Tank / Damage / Healer / Support weights
    pub role_weights: StatBlock,
}

impl ClassTemplate {
    /// Base stats with the combat role weights folded in.
    pub fn starting_stats(&self) -> StatBlock {
        let mut stats = self.base_stats.clone();
        for (stat, value) in self.role_weights.iter() {
            stats.add(stat, value);
        }
        stats
    }
}

/// Resource: read-only menu and class data.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    items: BTreeMap<String, MenuItem>,
    classes: BTreeMap<String, ClassTemplate>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: MenuItem) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn add_class(&mut self, template: ClassTemplate) {
        self.classes.insert(template.id.clone(), template);
    }

    pub fn item(&self, id: &str) -> Option<&MenuItem> {
        self.items.get(id)
    }

    pub fn class(&self, id: &str) -> Option<&ClassTemplate> {
        self.classes.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassTemplate> {
        self.classes.values()
    }

    /// Item name, or the raw id when the item is unknown.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.items.get(id).map(|item| item.name.as_str()).unwrap_or(id)
    }

    /// Growth weights for a class; empty when the class is unknown.
    pub fn growth_for(&self, class_id: &str) -> &[(Stat, f32)] {
        match self.classes.get(class_id) {
            Some(template) => &template.growth,
            None => {
                tracing::debug!("Unknown class '{}', using uniform growth", class_id);
                &[]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stew() -> MenuItem {
        MenuItem {
            id: "stew".to_string(),
            name: "Hearty Stew".to_string(),
            kind: ConsumableKind::Food,
            base_price: 8,
            flavor: "Smoky+Salty".to_string(),
            purchasable: true,
            rarity: Rarity::Common,
        }
    }

    #[test]
    fn test_flavor_tokens_split_and_dedupe() {
        assert_eq!(flavor_tokens("Smoky+Salty Sweet"), vec!["Smoky", "Salty", "Sweet"]);
        assert_eq!(flavor_tokens("Smoky + Smoky"), vec!["Smoky"]);
        assert!(flavor_tokens("  + ").is_empty());
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let mut catalog = Catalog::new();
        catalog.add_item(stew());
        assert_eq!(catalog.display_name("stew"), "Hearty Stew");
        assert_eq!(catalog.display_name("mystery_pie"), "mystery_pie");
        assert!(catalog.item("mystery_pie").is_none());
    }

    #[test]
    fn test_starting_stats_include_role_weights() {
        let template = ClassTemplate {
            id: "warrior".to_string(),
            name: "Warrior".to_string(),
            base_stats: StatBlock::from_pairs(&[(Stat::Strength, 5)]),
            growth: vec![(Stat::Strength, 1.0)],
            role_weights: StatBlock::from_pairs(&[(Stat::Tank, 3), (Stat::Damage, 2)]),
        };
        let stats = template.starting_stats();
        assert_eq!(stats.get(Stat::Strength), 5);
        assert_eq!(stats.get(Stat::Tank), 3);
        assert_eq!(stats.get(Stat::Damage), 2);
    }

    #[test]
    fn test_item_defaults_from_json() {
        let json = r#"{"id":"ale","name":"Ale","kind":"drink","base_price":3,"flavor":"Bitter"}"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert!(item.purchasable);
        assert_eq!(item.rarity, Rarity::Common);
    }
}
