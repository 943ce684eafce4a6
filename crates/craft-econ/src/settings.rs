//! Value changes: user prices, recipe overrides, profession levels, station
//! upgrades and the global margin and calorie cost.
//!
//! Each setter writes one value and then runs a single propagation pass that
//! marks every affected root before computing any of them.

use craft_core::{validate_money, EconomyGraph, SkillLevel, StationKey, UpgradeLevel};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::propagation::{propagate, NodeRef, Outcome, PassSummary};

/// Per recipe overrides. `None` clears an override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecipeSettings {
    pub margin: Option<Decimal>,
    /// A batch size of zero clears it.
    pub batch_size: Option<u32>,
    pub fixed_cost: Option<Decimal>,
}

/// Set the price of a user priced input.
///
/// Produced items are priced by their recipes; asking to price one is ignored.
pub fn set_item_price(graph: &mut EconomyGraph, item: &str, price: Decimal) -> Result<Outcome, EngineError> {
    validate_money("price", price)?;
    if !graph.is_input(item) {
        warn!(%item, "price ignored: not an input");
        return Ok(Outcome::Ignored);
    }
    graph.item_mut(item)?.price = price;
    let summary = propagate(graph, &[NodeRef::item(item)])?;
    info!(%item, %price, "input price set");
    Ok(Outcome::Applied(summary))
}

/// Set the price of a byproduct no tracked recipe produces as a main product.
pub fn set_byproduct_price(
    graph: &mut EconomyGraph,
    item: &str,
    price: Decimal,
) -> Result<Outcome, EngineError> {
    validate_money("price", price)?;
    if !graph.is_byproduct(item) || graph.is_product(item) {
        warn!(%item, "price ignored: not a user priced byproduct");
        return Ok(Outcome::Ignored);
    }
    graph.item_mut(item)?.price = price;
    let summary = propagate(graph, &[NodeRef::item(item)])?;
    info!(%item, %price, "byproduct price set");
    Ok(Outcome::Applied(summary))
}

/// Replace a recipe's margin, batch size and fixed cost overrides.
pub fn update_recipe_settings(
    graph: &mut EconomyGraph,
    recipe: &str,
    settings: RecipeSettings,
) -> Result<Outcome, EngineError> {
    if let Some(fixed) = settings.fixed_cost {
        validate_money("fixed cost", fixed)?;
    }
    let target = graph.recipe_mut(recipe)?;
    target.margin = settings.margin;
    target.batch_size = settings.batch_size.filter(|size| *size > 0);
    target.fixed_cost = settings.fixed_cost;
    let summary = propagate(graph, &[NodeRef::recipe(recipe)])?;
    info!(%recipe, "recipe settings updated");
    Ok(Outcome::Applied(summary))
}

/// Change a profession's level and lavish workspace flag, repricing every
/// recipe that lists it.
pub fn update_profession(
    graph: &mut EconomyGraph,
    profession: &str,
    level: SkillLevel,
    lavish_workspace: bool,
) -> Result<Outcome, EngineError> {
    let Some(target) = graph.professions.get_mut(profession) else {
        warn!(%profession, "profession not in use");
        return Ok(Outcome::Ignored);
    };
    target.set_level(level, lavish_workspace);
    let lavish = target.has_lavish_workspace;
    let roots: Vec<NodeRef> = graph
        .recipes_with_profession(profession)
        .into_iter()
        .map(NodeRef::Recipe)
        .collect();
    let summary = propagate(graph, &roots)?;
    info!(%profession, level = level.get(), lavish, "profession updated");
    Ok(Outcome::Applied(summary))
}

/// Change a station's upgrade level, repricing the recipes crafted there.
pub fn update_station_upgrade(
    graph: &mut EconomyGraph,
    station: &StationKey,
    level: UpgradeLevel,
) -> Result<Outcome, EngineError> {
    let target = graph.station_mut(station)?;
    target.upgrade_level = level;
    let roots: Vec<NodeRef> = target
        .used_by_recipes
        .iter()
        .map(|name| NodeRef::recipe(name.as_str()))
        .collect();
    let summary = propagate(graph, &roots)?;
    info!(%station, level = level.get(), "station upgraded");
    Ok(Outcome::Applied(summary))
}

/// Set the global default margin.
pub fn set_margin(graph: &mut EconomyGraph, margin: Decimal) -> Result<Outcome, EngineError> {
    graph.margin = margin;
    let summary = reprice_all(graph)?;
    info!(%margin, "global margin set");
    Ok(Outcome::Applied(summary))
}

/// Set the global cost of one thousand calories.
pub fn set_calorie_cost(graph: &mut EconomyGraph, calorie_cost: Decimal) -> Result<Outcome, EngineError> {
    validate_money("calorie cost", calorie_cost)?;
    graph.calorie_cost = calorie_cost;
    let summary = reprice_all(graph)?;
    info!(%calorie_cost, "calorie cost set");
    Ok(Outcome::Applied(summary))
}

fn reprice_all(graph: &mut EconomyGraph) -> Result<PassSummary, EngineError> {
    let roots: Vec<NodeRef> = graph.recipes.keys().cloned().map(NodeRef::Recipe).collect();
    propagate(graph, &roots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::add_catalog_recipe;
    use craft_core::{Catalog, ValidationError};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    const CATALOG: &str = r#"[
      {
        "name": "Smelt Ore", "table": "Furnace", "calorie": 500,
        "ingredients": [{"item": "Ore", "quantity": 10}],
        "products": [{"item": "Bar", "quantity": 5, "isConstant": true},
                     {"item": "Slag", "quantity": 2}],
        "profession": [{"skill": "Smelting", "level": 1}]
      },
      {
        "name": "Saw Plank", "table": "Sawmill", "calorie": 200,
        "ingredients": [{"item": "Log", "quantity": 2}],
        "products": [{"item": "Plank", "quantity": 4, "isConstant": true}],
        "profession": [{"skill": "Carpentry"}]
      },
      {
        "name": "Build Crate", "table": "Bench",
        "ingredients": [{"item": "Plank", "quantity": 4, "isConstant": true},
                        {"item": "Bar", "quantity": 1, "isConstant": true}],
        "products": [{"item": "Crate", "quantity": 1, "isConstant": true}],
        "profession": [{"skill": "Carpentry"}, {"skill": "Smelting"}]
      }
    ]"#;

    fn dec(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    fn graph() -> EconomyGraph {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let mut g = EconomyGraph::default();
        for name in ["Smelt Ore", "Saw Plank", "Build Crate"] {
            add_catalog_recipe(&mut g, &catalog, name).unwrap();
        }
        g
    }

    fn recipe_prices(g: &EconomyGraph) -> BTreeMap<String, Decimal> {
        g.recipes.iter().map(|(k, r)| (k.clone(), r.price)).collect()
    }

    #[test]
    fn input_price_flows_downstream() {
        let mut g = graph();
        set_item_price(&mut g, "Ore", dec(2, 0)).unwrap();
        set_item_price(&mut g, "Log", dec(4, 0)).unwrap();
        assert_eq!(g.items["Bar"].price, dec(4, 0));
        assert_eq!(g.items["Plank"].price, dec(2, 0));
        assert_eq!(g.items["Crate"].price, dec(12, 0));
    }

    #[test]
    fn derived_and_unknown_prices_are_ignored() {
        let mut g = graph();
        assert_eq!(set_item_price(&mut g, "Bar", dec(9, 0)).unwrap(), Outcome::Ignored);
        assert_eq!(set_item_price(&mut g, "Nope", dec(9, 0)).unwrap(), Outcome::Ignored);
        assert_eq!(
            set_item_price(&mut g, "Ore", dec(-1, 0)),
            Err(EngineError::Validation(ValidationError::NegativeMoney("price".into())))
        );
    }

    #[test]
    fn byproduct_price_credits_its_recipe() {
        let mut g = graph();
        set_item_price(&mut g, "Ore", dec(2, 0)).unwrap();
        assert_eq!(set_item_price(&mut g, "Slag", dec(15, 1)).unwrap(), Outcome::Ignored);
        assert!(set_byproduct_price(&mut g, "Slag", dec(15, 1)).unwrap().is_applied());
        assert_eq!(g.recipes["Smelt Ore"].price, dec(34, 1));
        assert_eq!(g.items["Crate"].price, dec(34, 1));
        assert_eq!(set_byproduct_price(&mut g, "Ore", dec(1, 0)).unwrap(), Outcome::Ignored);
    }

    #[test]
    fn station_upgrade_reprices_its_recipes() {
        let mut g = graph();
        set_item_price(&mut g, "Ore", dec(2, 0)).unwrap();
        let furnace = StationKey::new("Furnace", "Smelting");
        update_station_upgrade(&mut g, &furnace, UpgradeLevel::new(2).unwrap()).unwrap();
        assert_eq!(g.recipes["Smelt Ore"].price, dec(3, 0));
        assert_eq!(g.items["Crate"].price, dec(3, 0));

        let missing = StationKey::new("Kiln", "Pottery");
        assert!(matches!(
            update_station_upgrade(&mut g, &missing, UpgradeLevel::default()),
            Err(EngineError::Lookup(_))
        ));
    }

    #[test]
    fn calories_scale_with_skill() {
        let mut g = graph();
        set_calorie_cost(&mut g, dec(10, 0)).unwrap();
        // 10 * 1 * 500 / 1000 = 5 over 5 bars
        assert_eq!(g.recipes["Smelt Ore"].price, dec(1, 0));
        update_profession(&mut g, "Smelting", SkillLevel::new(1).unwrap(), false).unwrap();
        assert_eq!(g.recipes["Smelt Ore"].price, dec(5, 1));
        assert!(set_calorie_cost(&mut g, dec(-1, 0)).is_err());
    }

    #[test]
    fn lavish_workspace_only_from_level_six() {
        let mut g = graph();
        set_item_price(&mut g, "Log", dec(10, 0)).unwrap();
        update_profession(&mut g, "Carpentry", SkillLevel::new(5).unwrap(), true).unwrap();
        assert!(!g.professions["Carpentry"].has_lavish_workspace);
        assert_eq!(g.recipes["Saw Plank"].price, dec(5, 0));
        update_profession(&mut g, "Carpentry", SkillLevel::new(6).unwrap(), true).unwrap();
        // 2 * 0.95 * 10 / 4
        assert_eq!(g.recipes["Saw Plank"].price, dec(475, 2));
        assert_eq!(
            update_profession(&mut g, "Alchemy", SkillLevel::default(), false).unwrap(),
            Outcome::Ignored
        );
    }

    #[test]
    fn margins_and_recipe_overrides() {
        let mut g = graph();
        set_item_price(&mut g, "Log", dec(10, 0)).unwrap();
        set_margin(&mut g, dec(5, 1)).unwrap();
        assert_eq!(g.recipes["Saw Plank"].price, dec(75, 1));

        let settings = RecipeSettings {
            margin: Some(Decimal::ZERO),
            batch_size: Some(0),
            fixed_cost: Some(dec(4, 0)),
        };
        update_recipe_settings(&mut g, "Saw Plank", settings).unwrap();
        assert_eq!(g.recipes["Saw Plank"].batch_size, None);
        assert_eq!(g.recipes["Saw Plank"].price, dec(6, 0));
        assert!(matches!(
            update_recipe_settings(&mut g, "Nope", RecipeSettings::default()),
            Err(EngineError::Lookup(_))
        ));
    }

    proptest! {
        #[test]
        fn profession_change_leaves_other_recipes_alone(
            level in 0u8..=SkillLevel::MAX,
            lavish in any::<bool>(),
            cost in 1i64..10_000,
            ore in 0i64..10_000,
            log in 0i64..10_000,
        ) {
            let mut g = graph();
            set_calorie_cost(&mut g, Decimal::new(cost, 2)).unwrap();
            set_item_price(&mut g, "Ore", Decimal::new(ore, 2)).unwrap();
            set_item_price(&mut g, "Log", Decimal::new(log, 2)).unwrap();
            let before = recipe_prices(&g);
            update_profession(&mut g, "Smelting", SkillLevel::new(level).unwrap(), lavish).unwrap();
            let after = recipe_prices(&g);
            // Build Crate lists Smelting second and consumes Bar
            prop_assert_eq!(&before["Saw Plank"], &after["Saw Plank"]);
        }
    }
}
