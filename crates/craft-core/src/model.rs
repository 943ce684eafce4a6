//! Entities of the crafting economy: items, recipes, stations and professions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{LookupError, ValidationError};

/// Worker skill level of a profession, 0 through 7.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SkillLevel(u8);

impl SkillLevel {
    /// Highest attainable skill level.
    pub const MAX: u8 = 7;
    /// Level from which a lavish workspace can apply.
    pub const LAVISH_MIN: u8 = 6;

    /// Validate and wrap a raw level.
    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if level > Self::MAX {
            return Err(ValidationError::SkillLevelOutOfRange(level));
        }
        Ok(Self(level))
    }

    /// Raw level value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Whether the lavish workspace bonus may be enabled at this level.
    pub fn allows_lavish_workspace(self) -> bool {
        self.0 >= Self::LAVISH_MIN
    }
}

impl TryFrom<u8> for SkillLevel {
    type Error = ValidationError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<SkillLevel> for u8 {
    fn from(level: SkillLevel) -> Self {
        level.0
    }
}

/// Upgrade level of a crafting station, 0 through 5.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct UpgradeLevel(u8);

impl UpgradeLevel {
    /// Highest station upgrade.
    pub const MAX: u8 = 5;

    /// Validate and wrap a raw level.
    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if level > Self::MAX {
            return Err(ValidationError::UpgradeLevelOutOfRange(level));
        }
        Ok(Self(level))
    }

    /// Raw level value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for UpgradeLevel {
    type Error = ValidationError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<UpgradeLevel> for u8 {
    fn from(level: UpgradeLevel) -> Self {
        level.0
    }
}

/// What an ingredient slot accepts: one concrete item or any item with a tag.
///
/// Both resolve to a single key in the graph; a tag is priced like an item.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemRef {
    /// A concrete item name.
    Item(String),
    /// A tag shared by interchangeable items.
    Tag(String),
}

impl ItemRef {
    /// Graph key of the referenced item or tag.
    pub fn key(&self) -> &str {
        match self {
            ItemRef::Item(name) | ItemRef::Tag(name) => name,
        }
    }
}

/// One consumed entry of a recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawIngredient", into = "RawIngredient")]
pub struct Ingredient {
    /// Item or tag consumed.
    pub reference: ItemRef,
    /// Amount consumed per craft.
    pub quantity: Decimal,
    /// Constant ingredients ignore station upgrades and workspace bonuses.
    pub is_constant: bool,
    /// Human readable name, when the source provides one.
    pub display_name: Option<String>,
}

impl Ingredient {
    /// Graph key of this ingredient.
    pub fn key(&self) -> &str {
        self.reference.key()
    }

    /// Name shown to users, falling back to the key.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_else(|| self.key())
    }
}

/// Document shape of an ingredient: `{ item, tag, quantity, isConstant }`
/// where exactly one of `item`/`tag` is set.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIngredient {
    #[serde(default)]
    item: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    quantity: Decimal,
    #[serde(default)]
    is_constant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl TryFrom<RawIngredient> for Ingredient {
    type Error = &'static str;

    fn try_from(raw: RawIngredient) -> Result<Self, Self::Error> {
        let reference = match (raw.item, raw.tag) {
            (Some(item), _) => ItemRef::Item(item),
            (None, Some(tag)) => ItemRef::Tag(tag),
            (None, None) => return Err("ingredient names neither an item nor a tag"),
        };
        Ok(Self {
            reference,
            quantity: raw.quantity,
            is_constant: raw.is_constant,
            display_name: raw.display_name,
        })
    }
}

impl From<Ingredient> for RawIngredient {
    fn from(ingredient: Ingredient) -> Self {
        let (item, tag) = match ingredient.reference {
            ItemRef::Item(name) => (Some(name), None),
            ItemRef::Tag(name) => (None, Some(name)),
        };
        Self {
            item,
            tag,
            quantity: ingredient.quantity,
            is_constant: ingredient.is_constant,
            display_name: ingredient.display_name,
        }
    }
}

/// One yielded entry of a recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Item produced.
    #[serde(rename = "item")]
    pub name: String,
    /// Amount produced per craft.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub quantity: Decimal,
    /// Non-constant outputs scale with the batch, e.g. slag or tailings.
    #[serde(default)]
    pub is_constant: bool,
    /// Human readable name, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Product {
    /// Name shown to users, falling back to the item key.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A profession a recipe asks for, with the minimum level to unlock it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionRequirement {
    /// Profession name.
    #[serde(rename = "skill", alias = "name")]
    pub name: String,
    /// Level needed to unlock the recipe. Informational only.
    #[serde(default)]
    pub level: u8,
    /// Human readable name, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A crafting transformation with its derived price and user overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique recipe name.
    pub name: String,
    /// Consumed entries, in declaration order.
    pub ingredients: Vec<Ingredient>,
    /// The output this recipe is for.
    pub main_product: Product,
    /// Secondary output credited against the cost.
    #[serde(default)]
    pub byproduct: Option<Product>,
    /// Professions in declaration order; the first decides the station.
    pub professions: Vec<ProfessionRequirement>,
    /// Station type name.
    pub table: String,
    /// Calories spent per craft.
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub calories: Option<Decimal>,
    /// Derived unit price of the main product.
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    /// Overrides the global margin when set.
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub margin: Option<Decimal>,
    /// Crafts per batch; non-constant ingredients round up to whole batch units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    /// Flat cost added per craft.
    #[serde(
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed_cost: Option<Decimal>,
}

impl Recipe {
    /// First listed profession, which decides the station.
    pub fn primary_profession(&self) -> Result<&ProfessionRequirement, LookupError> {
        self.professions
            .first()
            .ok_or_else(|| LookupError::MissingProfession(self.name.clone()))
    }

    /// Key of the station this recipe is crafted at.
    pub fn station_key(&self) -> Result<StationKey, LookupError> {
        let profession = self.primary_profession()?;
        Ok(StationKey::new(&self.table, &profession.name))
    }

    /// Whether any listed profession has this name.
    pub fn uses_profession(&self, name: &str) -> bool {
        self.professions.iter().any(|p| p.name == name)
    }
}

/// Any tradeable good tracked by the graph.
///
/// One record exists per item name; whether it is an input, a product or a
/// byproduct is recorded by the graph's classification sets.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// Unique item key.
    pub name: String,
    /// Human readable name.
    pub display_name: String,
    /// Current unit price; user supplied unless some recipe produces the item.
    pub price: Decimal,
    /// Recipes consuming this item.
    pub used_in_recipes: BTreeSet<String>,
    /// Recipes yielding this item as their main product.
    pub product_of_recipes: BTreeSet<String>,
    /// Recipes yielding this item as a byproduct.
    pub byproduct_of_recipes: BTreeSet<String>,
    /// Whether the catalog has a recipe with this item as main product.
    pub can_be_produced: bool,
}

impl Item {
    /// Fresh record with a zero price and no references.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, can_be_produced: bool) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            price: Decimal::ZERO,
            used_in_recipes: BTreeSet::new(),
            product_of_recipes: BTreeSet::new(),
            byproduct_of_recipes: BTreeSet::new(),
            can_be_produced,
        }
    }
}

/// Composite key of a crafting station: `table|profession`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationKey {
    /// Station type name.
    pub table: String,
    /// Profession operating the station.
    pub profession: String,
}

impl StationKey {
    pub fn new(table: impl Into<String>, profession: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            profession: profession.into(),
        }
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.table, self.profession)
    }
}

impl FromStr for StationKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('|') {
            Some((table, profession)) if !table.is_empty() && !profession.is_empty() => {
                Ok(Self::new(table, profession))
            }
            _ => Err(ValidationError::MalformedStationKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for StationKey {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<StationKey> for String {
    fn from(key: StationKey) -> Self {
        key.to_string()
    }
}

/// A production facility operated by one profession.
#[derive(Clone, Debug, PartialEq)]
pub struct CraftingStation {
    /// Station type name.
    pub table: String,
    /// Profession operating the station.
    pub profession: String,
    /// Upgrade installed, lowering non-constant ingredient use.
    pub upgrade_level: UpgradeLevel,
    /// Throughput factor. Not used in pricing.
    pub workflow_factor: Decimal,
    /// Recipes crafted here.
    pub used_by_recipes: BTreeSet<String>,
}

impl CraftingStation {
    /// A fresh, un-upgraded station.
    pub fn new(key: &StationKey) -> Self {
        Self {
            table: key.table.clone(),
            profession: key.profession.clone(),
            upgrade_level: UpgradeLevel::default(),
            workflow_factor: Decimal::ONE,
            used_by_recipes: BTreeSet::new(),
        }
    }
}

/// A worker skill and its level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profession {
    /// Profession name.
    pub name: String,
    /// Human readable name.
    #[serde(default)]
    pub display_name: String,
    /// Current skill level.
    #[serde(default)]
    pub level: SkillLevel,
    /// Lavish workspace bonus; only ever true at level 6 or above.
    #[serde(default)]
    pub has_lavish_workspace: bool,
}

impl Profession {
    /// A fresh level 0 profession.
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            level: SkillLevel::default(),
            has_lavish_workspace: false,
        }
    }

    /// Set the level, clearing the lavish flag when the level cannot carry it.
    pub fn set_level(&mut self, level: SkillLevel, lavish_workspace: bool) {
        self.level = level;
        self.has_lavish_workspace = level.allows_lavish_workspace() && lavish_workspace;
    }
}
