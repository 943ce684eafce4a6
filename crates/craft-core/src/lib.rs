#![deny(warnings)]

//! Core domain models and invariants for the crafting economy.
//!
//! This crate defines the entities priced by the engine (items, recipes,
//! crafting stations, professions), the [`EconomyGraph`] that holds one
//! profile's working state, and the [`Catalog`] of recipe definitions loaded
//! from an external document.

mod catalog;
mod error;
mod graph;
mod model;

pub use catalog::{select_products, Catalog, ProductSelection, RecipeDefinition};
pub use error::{CatalogError, LookupError, ValidationError};
pub use graph::EconomyGraph;
pub use model::{
    CraftingStation, Ingredient, Item, ItemRef, Product, Profession, ProfessionRequirement, Recipe,
    SkillLevel, StationKey, UpgradeLevel,
};

/// Reject negative monetary values such as prices, costs and calorie costs.
pub fn validate_money(field: &str, value: rust_decimal::Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::NegativeMoney(field.to_string()));
    }
    Ok(())
}
