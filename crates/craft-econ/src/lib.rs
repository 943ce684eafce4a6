#![deny(warnings)]

//! Pricing engine for the crafting economy.
//!
//! - [`pricing`]: the unit price of one recipe from current prices
//! - [`propagation`]: the mark/compute walk that keeps derived prices
//!   consistent after a change, tolerating cycles
//! - [`editor`]: adding and removing recipes
//! - [`settings`]: user prices, recipe overrides, levels and global settings
//!
//! Every mutating function takes the [`EconomyGraph`](craft_core::EconomyGraph)
//! by `&mut` and returns an [`Outcome`] once all dependent prices are
//! refreshed.

pub mod editor;
mod error;
pub mod pricing;
pub mod propagation;
pub mod settings;

pub use editor::{add_catalog_recipe, add_recipe, add_recipe_for_item, remove_recipe};
pub use error::EngineError;
pub use pricing::{price_recipe, CostBreakdown, ProductionConditions};
pub use propagation::{propagate, NodeRef, Outcome, PassSummary, PriceOutcome, PropagationPass};
pub use settings::{
    set_byproduct_price, set_calorie_cost, set_item_price, set_margin, update_profession,
    update_recipe_settings, update_station_upgrade, RecipeSettings,
};
