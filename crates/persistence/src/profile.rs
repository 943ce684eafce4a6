//! Profile documents: one economy graph plus its catalog, in the exported
//! JSON layout.

use craft_core::{
    Catalog, CraftingStation, EconomyGraph, Item, Profession, Recipe, StationKey, UpgradeLevel,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tagged::{TaggedMap, TaggedSet};
use crate::SnapshotError;

/// One item record as it appears under `inputs`, `products` or `byproducts`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDocument {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    #[serde(default)]
    pub used_in_recipes: TaggedSet<String>,
    #[serde(default)]
    pub product_of_recipes: TaggedSet<String>,
    #[serde(default)]
    pub byproduct_of_recipes: TaggedSet<String>,
    #[serde(default)]
    pub can_be_produced: bool,
}

impl From<&Item> for ItemDocument {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            display_name: item.display_name.clone(),
            price: item.price,
            used_in_recipes: TaggedSet(item.used_in_recipes.clone()),
            product_of_recipes: TaggedSet(item.product_of_recipes.clone()),
            byproduct_of_recipes: TaggedSet(item.byproduct_of_recipes.clone()),
            can_be_produced: item.can_be_produced,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDocument {
    pub table: String,
    pub profession: String,
    #[serde(default)]
    pub upgrade_level: UpgradeLevel,
    #[serde(
        default = "one",
        serialize_with = "rust_decimal::serde::float::serialize"
    )]
    pub workflow_factor: Decimal,
    #[serde(default)]
    pub used_by_recipes: TaggedSet<String>,
}

fn one() -> Decimal {
    Decimal::ONE
}

impl From<&CraftingStation> for StationDocument {
    fn from(station: &CraftingStation) -> Self {
        Self {
            table: station.table.clone(),
            profession: station.profession.clone(),
            upgrade_level: station.upgrade_level,
            workflow_factor: station.workflow_factor,
            used_by_recipes: TaggedSet(station.used_by_recipes.clone()),
        }
    }
}

/// An exported profile.
///
/// An item that is both an input and a byproduct is written under both keys;
/// loading merges the copies back into one record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub id: String,
    pub name: String,
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub calorie_cost: Decimal,
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub margin: Decimal,
    #[serde(default)]
    pub recipes: TaggedMap<String, Recipe>,
    #[serde(default)]
    pub inputs: TaggedMap<String, ItemDocument>,
    #[serde(default)]
    pub products: TaggedMap<String, ItemDocument>,
    #[serde(default)]
    pub byproducts: TaggedMap<String, ItemDocument>,
    #[serde(default)]
    pub crafting_stations: TaggedMap<StationKey, StationDocument>,
    #[serde(default)]
    pub professions: TaggedMap<String, Profession>,
    /// The catalog the profile picks recipes from.
    #[serde(default)]
    pub data: Catalog,
}

/// Which view an item document was read from, lowest price priority first.
#[derive(Clone, Copy, Debug)]
enum View {
    Byproduct,
    Input,
    Product,
}

impl ProfileDocument {
    /// Capture a graph and its catalog.
    pub fn from_graph(id: impl Into<String>, name: impl Into<String>, catalog: &Catalog, graph: &EconomyGraph) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            calorie_cost: graph.calorie_cost,
            margin: graph.margin,
            recipes: graph.recipes.iter().map(|(k, r)| (k.clone(), r.clone())).collect(),
            inputs: graph.input_items().map(|i| (i.name.clone(), i.into())).collect(),
            products: graph.product_items().map(|i| (i.name.clone(), i.into())).collect(),
            byproducts: graph.byproduct_items().map(|i| (i.name.clone(), i.into())).collect(),
            crafting_stations: graph
                .crafting_stations
                .iter()
                .map(|(k, s)| (k.clone(), s.into()))
                .collect(),
            professions: graph
                .professions
                .iter()
                .map(|(k, p)| (k.clone(), p.clone()))
                .collect(),
            data: catalog.clone(),
        }
    }

    /// Rebuild the catalog and graph, checking the cross references a
    /// propagation pass relies on.
    pub fn into_graph(self) -> Result<(Catalog, EconomyGraph), SnapshotError> {
        let mut graph = EconomyGraph::with_settings(self.margin, self.calorie_cost);
        // later views win on price
        for (view, items) in [
            (View::Byproduct, self.byproducts),
            (View::Input, self.inputs),
            (View::Product, self.products),
        ] {
            for (key, doc) in items {
                merge_item(&mut graph, view, key, doc);
            }
        }
        graph.recipes = self.recipes.0;
        for (key, doc) in self.crafting_stations {
            let station = CraftingStation {
                table: doc.table,
                profession: doc.profession,
                upgrade_level: doc.upgrade_level,
                workflow_factor: doc.workflow_factor,
                used_by_recipes: doc.used_by_recipes.0,
            };
            graph.crafting_stations.insert(key, station);
        }
        // documents can carry a lavish flag their level does not allow
        graph.professions = self
            .professions
            .0
            .into_iter()
            .map(|(name, mut profession)| {
                profession.set_level(profession.level, profession.has_lavish_workspace);
                (name, profession)
            })
            .collect();
        check_references(&graph)?;
        debug!(
            recipes = graph.recipes.len(),
            items = graph.items.len(),
            "profile document decoded"
        );
        Ok((self.data, graph))
    }
}

fn merge_item(graph: &mut EconomyGraph, view: View, key: String, doc: ItemDocument) {
    match view {
        View::Byproduct => graph.byproducts.insert(key.clone()),
        View::Input => graph.inputs.insert(key.clone()),
        View::Product => graph.products.insert(key.clone()),
    };
    let record = graph
        .items
        .entry(key.clone())
        .or_insert_with(|| Item::new(key, doc.display_name.clone(), doc.can_be_produced));
    record.price = doc.price;
    record.can_be_produced |= doc.can_be_produced;
    record.used_in_recipes.extend(doc.used_in_recipes.0);
    record.product_of_recipes.extend(doc.product_of_recipes.0);
    record.byproduct_of_recipes.extend(doc.byproduct_of_recipes.0);
}

fn check_references(graph: &EconomyGraph) -> Result<(), SnapshotError> {
    for recipe in graph.recipes.values() {
        let inconsistent = |what: String| SnapshotError::Inconsistent {
            recipe: recipe.name.clone(),
            what,
        };
        for ingredient in &recipe.ingredients {
            graph
                .ingredient_item(&ingredient.reference)
                .map_err(|e| inconsistent(e.to_string()))?;
        }
        if !graph.is_product(&recipe.main_product.name) {
            return Err(inconsistent(format!(
                "main product {} is not a product",
                recipe.main_product.name
            )));
        }
        if let Some(byproduct) = &recipe.byproduct {
            if !graph.is_byproduct(&byproduct.name) {
                return Err(inconsistent(format!(
                    "byproduct {} is not a byproduct",
                    byproduct.name
                )));
            }
        }
        let station = graph
            .station_for_recipe(recipe)
            .map_err(|e| inconsistent(e.to_string()))?;
        graph
            .profession(&station.profession)
            .map_err(|e| inconsistent(e.to_string()))?;
    }
    Ok(())
}

/// Serialize a profile document as pretty JSON.
pub fn export_profile(document: &ProfileDocument) -> Result<String, SnapshotError> {
    let text = serde_json::to_string_pretty(document)?;
    info!(profile = %document.name, bytes = text.len(), "profile exported");
    Ok(text)
}

/// Parse a profile document. Nothing is applied anywhere; callers swap the
/// decoded graph in only once this succeeds.
pub fn import_profile(text: &str) -> Result<ProfileDocument, SnapshotError> {
    let document: ProfileDocument = serde_json::from_str(text)?;
    info!(profile = %document.name, recipes = document.recipes.0.len(), "profile parsed");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_econ::{add_catalog_recipe, set_byproduct_price, set_item_price, update_station_upgrade};

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
      }
    ]"#;

    fn sample() -> (Catalog, EconomyGraph) {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let mut g = EconomyGraph::with_settings(Decimal::new(1, 1), Decimal::new(2, 0));
        add_catalog_recipe(&mut g, &catalog, "Smelt Ore").unwrap();
        add_catalog_recipe(&mut g, &catalog, "Crush Slag").unwrap();
        set_item_price(&mut g, "Ore", Decimal::new(2, 0)).unwrap();
        set_item_price(&mut g, "Slag", Decimal::new(15, 1)).unwrap();
        update_station_upgrade(
            &mut g,
            &StationKey::new("Furnace", "Smelting"),
            UpgradeLevel::new(2).unwrap(),
        )
        .unwrap();
        (catalog, g)
    }

    #[test]
    fn exported_layout_uses_tagged_collections() {
        let (catalog, g) = sample();
        let doc = ProfileDocument::from_graph("p1", "Main", &catalog, &g);
        let value: serde_json::Value = serde_json::from_str(&export_profile(&doc).unwrap()).unwrap();
        assert_eq!(value["recipes"]["_type"], "map");
        assert_eq!(value["craftingStations"]["map"][0][0], "Crusher|Mining");
        assert_eq!(value["inputs"]["map"][1][0], "Slag");
        assert_eq!(value["byproducts"]["map"][0][1]["byproductOfRecipes"]["_type"], "set");
        assert_eq!(value["margin"], 0.1);
        assert!(value["data"].is_array());
    }

    #[test]
    fn shared_items_come_back_as_one_record() {
        let (catalog, g) = sample();
        let doc = ProfileDocument::from_graph("p1", "Main", &catalog, &g);
        let text = export_profile(&doc).unwrap();
        let (catalog_back, g_back) = import_profile(&text).unwrap().into_graph().unwrap();
        assert_eq!(catalog_back, catalog);
        assert_eq!(g_back, g);
        assert!(g_back.is_input("Slag") && g_back.is_byproduct("Slag"));
        assert_eq!(g_back.items["Slag"].byproduct_of_recipes.len(), 1);
        assert_eq!(g_back.items["Slag"].used_in_recipes.len(), 1);
    }

    #[test]
    fn graph_from_document_keeps_pricing_live() {
        let (catalog, g) = sample();
        let doc = ProfileDocument::from_graph("p1", "Main", &catalog, &g);
        let (_, mut g_back) = doc.into_graph().unwrap();
        set_byproduct_price(&mut g_back, "Slag", Decimal::new(5, 1)).unwrap();
        // (15 - 1) * 1.1 / 5
        assert_eq!(g_back.items["Bar"].price, Decimal::new(308, 2));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(import_profile("{"), Err(SnapshotError::Json(_))));
        assert!(matches!(
            import_profile(r#"{"id":"x","name":"y","recipes":{"_type":"set","set":[]}}"#),
            Err(SnapshotError::Json(_))
        ));

        let (catalog, g) = sample();
        let mut doc = ProfileDocument::from_graph("p1", "Main", &catalog, &g);
        doc.crafting_stations.0.clear();
        assert!(matches!(
            doc.into_graph(),
            Err(SnapshotError::Inconsistent { .. })
        ));
    }

    #[test]
    fn lavish_flag_is_gated_by_level_on_load() {
        let (catalog, g) = sample();
        let mut doc = ProfileDocument::from_graph("p1", "Main", &catalog, &g);
        for (name, level) in [("Smelting", 3), ("Mining", 6)] {
            let profession = doc.professions.0.get_mut(name).unwrap();
            profession.level = craft_core::SkillLevel::new(level).unwrap();
            profession.has_lavish_workspace = true;
        }
        let (_, g_back) = doc.into_graph().unwrap();
        assert!(!g_back.professions["Smelting"].has_lavish_workspace);
        assert_eq!(g_back.professions["Smelting"].level.get(), 3);
        assert!(g_back.professions["Mining"].has_lavish_workspace);
    }

    #[test]
    fn missing_fields_default() {
        let (catalog, graph) = import_profile(r#"{"id":"x","name":"Empty"}"#)
            .unwrap()
            .into_graph()
            .unwrap();
        assert!(catalog.is_empty());
        assert_eq!(graph, EconomyGraph::default());
    }
}
