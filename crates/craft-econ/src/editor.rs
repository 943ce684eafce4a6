//! Structural edits: adding and removing recipes, keeping the item
//! classification sets, stations and professions consistent with the recipe
//! set, then propagating prices from whatever changed.

use craft_core::{Catalog, CraftingStation, EconomyGraph, Item, Profession, Recipe};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::propagation::{propagate, NodeRef, Outcome};

/// Add `recipe` to the graph. A recipe whose name is already present is
/// ignored.
///
/// Every check that can fail runs before the graph is touched.
pub fn add_recipe(
    graph: &mut EconomyGraph,
    catalog: &Catalog,
    recipe: Recipe,
) -> Result<Outcome, EngineError> {
    if graph.recipes.contains_key(&recipe.name) {
        debug!(recipe = %recipe.name, "recipe already present");
        return Ok(Outcome::Ignored);
    }
    if recipe.main_product.quantity <= Decimal::ZERO {
        return Err(EngineError::NonPositiveQuantity(recipe.name));
    }
    let station_key = recipe.station_key()?;
    let primary = recipe.primary_profession()?.clone();

    for ingredient in &recipe.ingredients {
        let key = ingredient.key();
        graph
            .items
            .entry(key.to_string())
            .or_insert_with(|| Item::new(key, ingredient.display_name(), catalog.can_produce(key)))
            .used_in_recipes
            .insert(recipe.name.clone());
        if !graph.products.contains(key) {
            graph.inputs.insert(key.to_string());
        }
    }

    let main = &recipe.main_product;
    graph
        .items
        .entry(main.name.clone())
        .or_insert_with(|| Item::new(&main.name, main.display_name(), catalog.can_produce(&main.name)))
        .product_of_recipes
        .insert(recipe.name.clone());
    graph.inputs.remove(&main.name);
    graph.products.insert(main.name.clone());

    if let Some(byproduct) = &recipe.byproduct {
        graph
            .items
            .entry(byproduct.name.clone())
            .or_insert_with(|| {
                Item::new(
                    &byproduct.name,
                    byproduct.display_name(),
                    catalog.can_produce(&byproduct.name),
                )
            })
            .byproduct_of_recipes
            .insert(recipe.name.clone());
        graph.byproducts.insert(byproduct.name.clone());
    }

    graph
        .crafting_stations
        .entry(station_key.clone())
        .or_insert_with(|| CraftingStation::new(&station_key))
        .used_by_recipes
        .insert(recipe.name.clone());

    // an existing profession keeps its level
    graph
        .professions
        .entry(primary.name.clone())
        .or_insert_with(|| {
            let display = primary.display_name.as_deref().unwrap_or(&primary.name);
            Profession::new(&primary.name, display)
        });

    let name = recipe.name.clone();
    graph.recipes.insert(name.clone(), recipe);
    let summary = propagate(graph, &[NodeRef::Recipe(name.clone())])?;
    info!(recipe = %name, station = %station_key, "recipe added");
    Ok(Outcome::Applied(summary))
}

/// Add the catalog recipe called `name`.
pub fn add_catalog_recipe(
    graph: &mut EconomyGraph,
    catalog: &Catalog,
    name: &str,
) -> Result<Outcome, EngineError> {
    let recipe = catalog
        .get(name)
        .cloned()
        .ok_or_else(|| EngineError::UnknownRecipe(name.to_string()))?;
    add_recipe(graph, catalog, recipe)
}

/// Add the first catalog recipe whose main product is `item`, if any.
pub fn add_recipe_for_item(
    graph: &mut EconomyGraph,
    catalog: &Catalog,
    item: &str,
) -> Result<Outcome, EngineError> {
    match catalog.producer_of(item) {
        Some(recipe) => add_recipe(graph, catalog, recipe.clone()),
        None => {
            debug!(%item, "no catalog recipe produces item");
            Ok(Outcome::Ignored)
        }
    }
}

/// Remove the recipe called `name`, releasing every item, station and
/// profession nothing else references. Unknown names are ignored.
pub fn remove_recipe(graph: &mut EconomyGraph, name: &str) -> Result<Outcome, EngineError> {
    let Some(recipe) = graph.recipes.remove(name) else {
        debug!(recipe = %name, "recipe not present");
        return Ok(Outcome::Ignored);
    };

    let keys: BTreeSet<&str> = recipe.ingredients.iter().map(|i| i.key()).collect();
    for key in keys {
        let item = graph.item_mut(key)?;
        item.used_in_recipes.remove(name);
        if item.used_in_recipes.is_empty() {
            // products stay put even when nothing consumes them anymore
            graph.inputs.remove(key);
            graph.release_item(key);
        }
    }

    if let Some(byproduct) = &recipe.byproduct {
        let item = graph.item_mut(&byproduct.name)?;
        item.byproduct_of_recipes.remove(name);
        if item.byproduct_of_recipes.is_empty() {
            graph.byproducts.remove(&byproduct.name);
            graph.release_item(&byproduct.name);
        }
    }

    let product = &recipe.main_product.name;
    let item = graph.item_mut(product)?;
    item.product_of_recipes.remove(name);
    if item.product_of_recipes.is_empty() {
        let still_used = !item.used_in_recipes.is_empty();
        graph.products.remove(product);
        if still_used {
            // back to a user priced input, keeping its last price
            graph.inputs.insert(product.clone());
        }
        graph.release_item(product);
    }

    let station_key = recipe.station_key()?;
    let station = graph.station_mut(&station_key)?;
    station.used_by_recipes.remove(name);
    if station.used_by_recipes.is_empty() {
        graph.crafting_stations.remove(&station_key);
        if !graph.profession_has_station(&station_key.profession) {
            graph.professions.remove(&station_key.profession);
        }
    }

    let roots: Vec<NodeRef> = if graph.is_product(product) {
        vec![NodeRef::Item(product.clone())]
    } else {
        Vec::new()
    };
    let summary = propagate(graph, &roots)?;
    info!(recipe = %name, "recipe removed");
    Ok(Outcome::Applied(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_core::{CatalogError, StationKey};
    use proptest::prelude::*;

    const CATALOG: &str = r#"[
      {
        "name": "Smelt Ore", "table": "Furnace",
        "ingredients": [{"item": "Ore", "quantity": 10}],
        "products": [{"item": "Bar", "quantity": 5, "isConstant": true},
                     {"item": "Slag", "quantity": 2}],
        "profession": [{"skill": "Smelting", "level": 1}]
      },
      {
        "name": "Crush Slag", "table": "Crusher",
        "ingredients": [{"item": "Slag", "quantity": 4, "isConstant": true}],
        "products": [{"item": "Gravel", "quantity": 2, "isConstant": true}],
        "profession": [{"skill": "Mining"}]
      },
      {
        "name": "Forge Sword", "table": "Anvil",
        "ingredients": [{"item": "Bar", "quantity": 3, "isConstant": true},
                        {"tag": "Wood", "quantity": 1, "isConstant": true}],
        "products": [{"item": "Sword", "quantity": 1, "isConstant": true}],
        "profession": [{"skill": "Smithing"}]
      },
      {
        "name": "Cast Bar", "table": "Furnace",
        "ingredients": [{"item": "Scrap", "quantity": 2, "isConstant": true}],
        "products": [{"item": "Bar", "quantity": 1, "isConstant": true}],
        "profession": [{"skill": "Smelting"}]
      },
      {
        "name": "Remelt Slag", "table": "Furnace",
        "ingredients": [{"item": "Scrap", "quantity": 1, "isConstant": true}],
        "products": [{"item": "Slag", "quantity": 1, "isConstant": true}],
        "profession": [{"skill": "Smelting"}]
      }
    ]"#;

    fn catalog() -> Result<Catalog, CatalogError> {
        Catalog::from_json(CATALOG)
    }

    fn dec(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    /// Everything except prices, which propagation is free to rewrite.
    fn structure(g: &EconomyGraph) -> impl PartialEq + std::fmt::Debug {
        let items: Vec<_> = g
            .items
            .values()
            .map(|i| {
                (
                    i.name.clone(),
                    i.used_in_recipes.clone(),
                    i.product_of_recipes.clone(),
                    i.byproduct_of_recipes.clone(),
                )
            })
            .collect();
        let stations: Vec<_> = g
            .crafting_stations
            .iter()
            .map(|(k, s)| (k.clone(), s.used_by_recipes.clone(), s.upgrade_level))
            .collect();
        (
            g.recipes.keys().cloned().collect::<Vec<_>>(),
            items,
            g.inputs.clone(),
            g.products.clone(),
            g.byproducts.clone(),
            stations,
            g.professions.clone(),
        )
    }

    #[test]
    fn add_creates_records_lazily() {
        let catalog = catalog().unwrap();
        let mut g = EconomyGraph::default();
        let outcome = add_catalog_recipe(&mut g, &catalog, "Smelt Ore").unwrap();
        assert!(outcome.is_applied());

        assert!(g.is_input("Ore") && !g.is_product("Ore"));
        assert!(g.is_product("Bar") && !g.is_input("Bar"));
        assert!(g.is_byproduct("Slag"));
        assert!(g.items["Bar"].can_be_produced);
        assert!(!g.items["Ore"].can_be_produced);
        let station = &g.crafting_stations[&StationKey::new("Furnace", "Smelting")];
        assert!(station.used_by_recipes.contains("Smelt Ore"));
        assert_eq!(station.workflow_factor, Decimal::ONE);
        assert_eq!(g.professions["Smelting"].level.get(), 0);

        // idempotent
        assert_eq!(
            add_catalog_recipe(&mut g, &catalog, "Smelt Ore").unwrap(),
            Outcome::Ignored
        );
    }

    #[test]
    fn add_moves_input_into_products() {
        let catalog = catalog().unwrap();
        let mut g = EconomyGraph::default();
        add_catalog_recipe(&mut g, &catalog, "Forge Sword").unwrap();
        assert!(g.is_input("Bar"));
        assert!(g.is_input("Wood"));
        assert!(g.item("Ore").is_err());

        g.item_mut("Wood").unwrap().price = dec(3, 0);
        g.item_mut("Bar").unwrap().price = dec(100, 0);
        add_catalog_recipe(&mut g, &catalog, "Cast Bar").unwrap();
        assert!(g.is_product("Bar") && !g.is_input("Bar"));
        assert_eq!(g.items["Bar"].used_in_recipes.len(), 1);

        g.item_mut("Scrap").unwrap().price = dec(4, 0);
        let summary = propagate(&mut g, &[NodeRef::item("Scrap")]).unwrap();
        assert_eq!(summary.settled, 0);
        assert_eq!(g.items["Bar"].price, dec(8, 0));
        assert_eq!(g.items["Sword"].price, dec(27, 0));
    }

    #[test]
    fn add_keeps_existing_profession_level() {
        let catalog = catalog().unwrap();
        let mut g = EconomyGraph::default();
        add_catalog_recipe(&mut g, &catalog, "Smelt Ore").unwrap();
        g.profession_mut("Smelting")
            .unwrap()
            .set_level(craft_core::SkillLevel::new(4).unwrap(), false);
        add_catalog_recipe(&mut g, &catalog, "Cast Bar").unwrap();
        assert_eq!(g.professions["Smelting"].level.get(), 4);
        assert_eq!(g.crafting_stations.len(), 1);
    }

    #[test]
    fn unknown_catalog_recipe_is_an_error() {
        let catalog = catalog().unwrap();
        let mut g = EconomyGraph::default();
        assert_eq!(
            add_catalog_recipe(&mut g, &catalog, "Brew Ale"),
            Err(EngineError::UnknownRecipe("Brew Ale".into()))
        );
        assert_eq!(g, EconomyGraph::default());
    }

    #[test]
    fn add_for_item_uses_first_producer() {
        let catalog = catalog().unwrap();
        let mut g = EconomyGraph::default();
        add_recipe_for_item(&mut g, &catalog, "Bar").unwrap();
        assert!(g.recipes.contains_key("Smelt Ore"));
        assert!(!g.recipes.contains_key("Cast Bar"));
        assert_eq!(
            add_recipe_for_item(&mut g, &catalog, "Ore").unwrap(),
            Outcome::Ignored
        );
    }

    #[test]
    fn removing_last_producer_of_consumed_byproduct_keeps_it_as_input() {
        let catalog = catalog().unwrap();
        let mut g = EconomyGraph::default();
        add_catalog_recipe(&mut g, &catalog, "Smelt Ore").unwrap();
        add_catalog_recipe(&mut g, &catalog, "Crush Slag").unwrap();
        assert!(g.is_input("Slag") && g.is_byproduct("Slag"));
        g.item_mut("Slag").unwrap().price = dec(15, 1);

        remove_recipe(&mut g, "Smelt Ore").unwrap();
        assert!(!g.is_byproduct("Slag"));
        assert!(g.is_input("Slag"));
        assert_eq!(g.items["Slag"].price, dec(15, 1));
        assert!(!g.items.contains_key("Ore"));
        assert!(!g.items.contains_key("Bar"));
        assert!(!g.professions.contains_key("Smelting"));
        assert!(g.professions.contains_key("Mining"));
    }

    #[test]
    fn removing_a_producer_reprices_from_the_rest() {
        let catalog = catalog().unwrap();
        let mut g = EconomyGraph::default();
        add_catalog_recipe(&mut g, &catalog, "Forge Sword").unwrap();
        add_catalog_recipe(&mut g, &catalog, "Smelt Ore").unwrap();
        add_catalog_recipe(&mut g, &catalog, "Cast Bar").unwrap();
        g.item_mut("Ore").unwrap().price = dec(2, 0);
        g.item_mut("Scrap").unwrap().price = dec(1, 0);
        propagate(&mut g, &[NodeRef::item("Ore"), NodeRef::item("Scrap")]).unwrap();
        // Smelt Ore: 20 / 5 = 4, Cast Bar: 2 / 1 = 2
        assert_eq!(g.items["Bar"].price, dec(2, 0));

        remove_recipe(&mut g, "Cast Bar").unwrap();
        assert!(g.is_product("Bar"));
        assert_eq!(g.items["Bar"].price, dec(4, 0));
        assert_eq!(g.items["Sword"].price, dec(12, 0));
        // the shared furnace survives
        assert!(g
            .crafting_stations
            .contains_key(&StationKey::new("Furnace", "Smelting")));

        remove_recipe(&mut g, "Smelt Ore").unwrap();
        assert!(g.is_input("Bar"));
        assert_eq!(g.items["Bar"].price, dec(4, 0));
    }

    #[test]
    fn remove_unknown_recipe_is_ignored() {
        let mut g = EconomyGraph::default();
        assert_eq!(remove_recipe(&mut g, "Nope").unwrap(), Outcome::Ignored);
    }

    #[test]
    fn byproduct_consumed_then_produced_leaves_inputs() {
        let catalog = catalog().unwrap();
        let mut g = EconomyGraph::default();
        add_catalog_recipe(&mut g, &catalog, "Smelt Ore").unwrap();
        assert!(!g.is_input("Slag"));
        add_catalog_recipe(&mut g, &catalog, "Crush Slag").unwrap();
        assert!(g.is_input("Slag"));
        assert!(g.inputs.is_disjoint(&g.products));

        add_catalog_recipe(&mut g, &catalog, "Remelt Slag").unwrap();
        assert!(g.is_product("Slag") && g.is_byproduct("Slag"));
        assert!(!g.is_input("Slag"));
        assert!(g.inputs.is_disjoint(&g.products));

        remove_recipe(&mut g, "Remelt Slag").unwrap();
        assert!(g.is_input("Slag") && !g.is_product("Slag"));
        assert!(g.inputs.is_disjoint(&g.products));
    }

    const NAMES: [&str; 5] = ["Smelt Ore", "Crush Slag", "Forge Sword", "Cast Bar", "Remelt Slag"];

    proptest! {
        #[test]
        fn add_then_remove_restores_structure(
            existing in proptest::sample::subsequence(NAMES.to_vec(), 0..5),
            added in proptest::sample::select(NAMES.to_vec()),
        ) {
            let catalog = catalog().unwrap();
            let mut g = EconomyGraph::default();
            for name in existing.iter().filter(|n| **n != added) {
                add_catalog_recipe(&mut g, &catalog, name).unwrap();
                prop_assert!(g.inputs.is_disjoint(&g.products), "after adding {}", name);
            }
            let before = structure(&g);
            add_catalog_recipe(&mut g, &catalog, added).unwrap();
            prop_assert!(g.inputs.is_disjoint(&g.products), "after adding {}", added);
            remove_recipe(&mut g, added).unwrap();
            prop_assert!(g.inputs.is_disjoint(&g.products), "after removing {}", added);
            prop_assert_eq!(structure(&g), before);
        }
    }
}
