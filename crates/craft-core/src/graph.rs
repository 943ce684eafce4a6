//! The mutable economy graph and its definite lookups.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::LookupError;
use crate::model::{CraftingStation, Item, ItemRef, Profession, Recipe, StationKey};

/// Working state of one profile.
///
/// Every item has exactly one record in `items`. The `inputs`, `products` and
/// `byproducts` sets classify those records by name; one item can sit in
/// `byproducts` and in one of `inputs`/`products` at the same time, and a price
/// written to its record is visible from every set it belongs to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EconomyGraph {
    /// Global cost of one thousand calories.
    pub calorie_cost: Decimal,
    /// Global default margin.
    pub margin: Decimal,
    /// Recipes by name.
    pub recipes: BTreeMap<String, Recipe>,
    /// Item records by name.
    pub items: BTreeMap<String, Item>,
    /// Items consumed by some recipe and produced by none.
    pub inputs: BTreeSet<String>,
    /// Items that are the main product of some recipe.
    pub products: BTreeSet<String>,
    /// Items that are the byproduct of some recipe.
    pub byproducts: BTreeSet<String>,
    /// Stations by `table|profession`.
    pub crafting_stations: BTreeMap<StationKey, CraftingStation>,
    /// Professions by name.
    pub professions: BTreeMap<String, Profession>,
}

impl EconomyGraph {
    /// Empty graph with the given global settings.
    pub fn with_settings(margin: Decimal, calorie_cost: Decimal) -> Self {
        Self {
            margin,
            calorie_cost,
            ..Self::default()
        }
    }

    /// Drop every recipe, item, station and profession, keeping the global
    /// margin and calorie cost.
    pub fn clear_structure(&mut self) {
        *self = Self::with_settings(self.margin, self.calorie_cost);
    }

    pub fn recipe(&self, name: &str) -> Result<&Recipe, LookupError> {
        self.recipes
            .get(name)
            .ok_or_else(|| LookupError::RecipeNotFound(name.to_string()))
    }

    pub fn recipe_mut(&mut self, name: &str) -> Result<&mut Recipe, LookupError> {
        self.recipes
            .get_mut(name)
            .ok_or_else(|| LookupError::RecipeNotFound(name.to_string()))
    }

    pub fn item(&self, name: &str) -> Result<&Item, LookupError> {
        self.items
            .get(name)
            .ok_or_else(|| LookupError::ItemNotFound(name.to_string()))
    }

    pub fn item_mut(&mut self, name: &str) -> Result<&mut Item, LookupError> {
        self.items
            .get_mut(name)
            .ok_or_else(|| LookupError::ItemNotFound(name.to_string()))
    }

    /// Resolve an ingredient to its item. Only inputs and products qualify;
    /// an item known solely as a byproduct is not an ingredient.
    pub fn ingredient_item(&self, reference: &ItemRef) -> Result<&Item, LookupError> {
        let key = reference.key();
        if !self.inputs.contains(key) && !self.products.contains(key) {
            return Err(LookupError::IngredientNotFound(key.to_string()));
        }
        self.items
            .get(key)
            .ok_or_else(|| LookupError::IngredientNotFound(key.to_string()))
    }

    /// Station a recipe is crafted at, from its table and first profession.
    pub fn station_for_recipe(&self, recipe: &Recipe) -> Result<&CraftingStation, LookupError> {
        let key = recipe.station_key()?;
        self.crafting_stations
            .get(&key)
            .ok_or_else(|| LookupError::StationNotFound(key.to_string()))
    }

    pub fn station_mut(&mut self, key: &StationKey) -> Result<&mut CraftingStation, LookupError> {
        self.crafting_stations
            .get_mut(key)
            .ok_or_else(|| LookupError::StationNotFound(key.to_string()))
    }

    pub fn profession(&self, name: &str) -> Result<&Profession, LookupError> {
        self.professions
            .get(name)
            .ok_or_else(|| LookupError::ProfessionNotFound(name.to_string()))
    }

    pub fn profession_mut(&mut self, name: &str) -> Result<&mut Profession, LookupError> {
        self.professions
            .get_mut(name)
            .ok_or_else(|| LookupError::ProfessionNotFound(name.to_string()))
    }

    pub fn is_input(&self, name: &str) -> bool {
        self.inputs.contains(name)
    }

    pub fn is_product(&self, name: &str) -> bool {
        self.products.contains(name)
    }

    pub fn is_byproduct(&self, name: &str) -> bool {
        self.byproducts.contains(name)
    }

    /// Input records in name order.
    pub fn input_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.classified(&self.inputs)
    }

    /// Product records in name order.
    pub fn product_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.classified(&self.products)
    }

    /// Byproduct records in name order.
    pub fn byproduct_items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.classified(&self.byproducts)
    }

    fn classified<'a>(&'a self, names: &'a BTreeSet<String>) -> impl Iterator<Item = &'a Item> + 'a {
        names.iter().filter_map(move |name| self.items.get(name))
    }

    /// Delete an item record once it belongs to no classification set.
    /// Returns whether the record was removed.
    pub fn release_item(&mut self, name: &str) -> bool {
        if self.inputs.contains(name) || self.products.contains(name) || self.byproducts.contains(name) {
            return false;
        }
        self.items.remove(name).is_some()
    }

    /// Names of recipes listing the profession anywhere in their professions.
    pub fn recipes_with_profession(&self, profession: &str) -> Vec<String> {
        self.recipes
            .values()
            .filter(|r| r.uses_profession(profession))
            .map(|r| r.name.clone())
            .collect()
    }

    /// Whether any remaining station is operated by the profession.
    pub fn profession_has_station(&self, profession: &str) -> bool {
        self.crafting_stations
            .values()
            .any(|s| s.profession == profession)
    }
}
