//! A named profile: one catalog and the economy graph built from it.

use craft_core::{Catalog, EconomyGraph, Item, SkillLevel, UpgradeLevel};
use craft_econ::{self as econ, Outcome, PassSummary};
use persistence::{export_profile, import_profile, ProfileDocument};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

use crate::config::EngineConfig;
use crate::error::IntentError;
use crate::intent::Intent;

/// Opaque profile identifier, shown as 16 hex digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(ProfileId)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub catalog: Catalog,
    pub graph: EconomyGraph,
}

impl Profile {
    /// An empty profile using the configured global settings.
    pub fn new(id: ProfileId, name: impl Into<String>, config: &EngineConfig) -> Self {
        Self {
            id,
            name: name.into(),
            catalog: Catalog::default(),
            graph: EconomyGraph::with_settings(config.margin, config.calorie_cost),
        }
    }

    /// Apply one intent.
    ///
    /// Graph edits run on a copy that replaces the live graph only on
    /// success, so a failing intent leaves the profile exactly as it was.
    pub fn apply(&mut self, intent: Intent) -> Result<Outcome, IntentError> {
        let kind = intent.kind();
        let result = match intent {
            Intent::ReplaceCatalog { json } => self.replace_catalog(&json),
            Intent::ImportProfile { json } => self.import(&json),
            edit => {
                let mut working = self.graph.clone();
                let outcome = apply_edit(&mut working, &self.catalog, edit);
                if outcome.is_ok() {
                    self.graph = working;
                }
                outcome
            }
        };
        match &result {
            Ok(Outcome::Applied(summary)) => {
                info!(profile = %self.id, intent = kind, computed = summary.computed, "intent applied")
            }
            Ok(Outcome::Ignored) => info!(profile = %self.id, intent = kind, "intent ignored"),
            Err(err) => error!(profile = %self.id, intent = kind, %err, "intent failed; profile unchanged"),
        }
        result
    }

    /// Swap in a new catalog, clearing every recipe, item, station and
    /// profession. Global margin and calorie cost are kept.
    fn replace_catalog(&mut self, json: &str) -> Result<Outcome, IntentError> {
        let catalog = Catalog::from_json(json)?;
        self.catalog = catalog;
        self.graph.clear_structure();
        Ok(Outcome::Applied(PassSummary::default()))
    }

    /// Replace catalog and graph from an exported document, keeping this
    /// profile's id and name.
    fn import(&mut self, json: &str) -> Result<Outcome, IntentError> {
        let (catalog, graph) = import_profile(json)?.into_graph()?;
        self.catalog = catalog;
        self.graph = graph;
        Ok(Outcome::Applied(PassSummary::default()))
    }

    pub fn to_document(&self) -> ProfileDocument {
        ProfileDocument::from_graph(self.id.to_string(), &self.name, &self.catalog, &self.graph)
    }

    /// The profile as an exported JSON document.
    pub fn export(&self) -> Result<String, IntentError> {
        Ok(export_profile(&self.to_document())?)
    }

    pub fn report(&self) -> PriceReport {
        PriceReport::from_graph(&self.graph)
    }
}

fn apply_edit(graph: &mut EconomyGraph, catalog: &Catalog, intent: Intent) -> Result<Outcome, IntentError> {
    let outcome = match intent {
        Intent::AddRecipe { recipe } => econ::add_catalog_recipe(graph, catalog, &recipe)?,
        Intent::AddRecipeForItem { item } => econ::add_recipe_for_item(graph, catalog, &item)?,
        Intent::RemoveRecipe { recipe } => econ::remove_recipe(graph, &recipe)?,
        Intent::SetItemPrice { item, price } => econ::set_item_price(graph, &item, price)?,
        Intent::SetByproductPrice { item, price } => econ::set_byproduct_price(graph, &item, price)?,
        Intent::UpdateRecipeSettings { recipe, settings } => {
            econ::update_recipe_settings(graph, &recipe, settings)?
        }
        Intent::UpdateProfession {
            profession,
            level,
            lavish_workspace,
        } => econ::update_profession(graph, &profession, SkillLevel::new(level)?, lavish_workspace)?,
        Intent::UpdateStationUpgrade { station, level } => {
            econ::update_station_upgrade(graph, &station, UpgradeLevel::new(level)?)?
        }
        Intent::SetMargin { margin } => econ::set_margin(graph, margin)?,
        Intent::SetCalorieCost { calorie_cost } => econ::set_calorie_cost(graph, calorie_cost)?,
        Intent::ReplaceCatalog { .. } | Intent::ImportProfile { .. } => Outcome::Ignored,
    };
    Ok(outcome)
}

/// One priced row of a [`PriceReport`].
#[derive(Clone, Debug, PartialEq)]
pub struct PriceLine {
    pub name: String,
    pub display_name: String,
    pub price: Decimal,
}

impl From<&Item> for PriceLine {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            display_name: item.display_name.clone(),
            price: item.price,
        }
    }
}

/// Current prices, grouped the way a user reads them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceReport {
    pub inputs: Vec<PriceLine>,
    pub products: Vec<PriceLine>,
    pub byproducts: Vec<PriceLine>,
    pub recipes: Vec<PriceLine>,
}

impl PriceReport {
    pub fn from_graph(graph: &EconomyGraph) -> Self {
        Self {
            inputs: graph.input_items().map(PriceLine::from).collect(),
            products: graph.product_items().map(PriceLine::from).collect(),
            byproducts: graph.byproduct_items().map(PriceLine::from).collect(),
            recipes: graph
                .recipes
                .values()
                .map(|r| PriceLine {
                    name: r.name.clone(),
                    display_name: r.main_product.display_name().to_string(),
                    price: r.price,
                })
                .collect(),
        }
    }

    /// Price of a product, input or byproduct by item name.
    pub fn item_price(&self, name: &str) -> Option<Decimal> {
        self.products
            .iter()
            .chain(&self.inputs)
            .chain(&self.byproducts)
            .find(|line| line.name == name)
            .map(|line| line.price)
    }
}

impl fmt::Display for PriceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (title, lines) in [
            ("Inputs", &self.inputs),
            ("Products", &self.products),
            ("Byproducts", &self.byproducts),
            ("Recipes", &self.recipes),
        ] {
            if lines.is_empty() {
                continue;
            }
            writeln!(f, "{title}")?;
            for line in lines {
                writeln!(f, "  {:<32} {:>12}", line.name, line.price.round_dp(2))?;
            }
        }
        Ok(())
    }
}
