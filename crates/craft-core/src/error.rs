//! Error types shared by the catalog, the entity model and graph lookups.

use thiserror::Error;

/// A definite lookup into the economy graph failed.
///
/// These only occur when the graph's cross references are inconsistent, so
/// they indicate a bug in whatever edited the graph last.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No recipe with this name is registered.
    #[error("recipe {0} not found")]
    RecipeNotFound(String),
    /// No item record with this key exists.
    #[error("item {0} not found")]
    ItemNotFound(String),
    /// The key exists neither as an input nor as a product.
    #[error("could not find ingredient or product with key {0}")]
    IngredientNotFound(String),
    /// No station exists for the `table|profession` key.
    #[error("could not find station {0}")]
    StationNotFound(String),
    /// No profession with this name is registered.
    #[error("profession {0} not found")]
    ProfessionNotFound(String),
    /// The recipe lists no profession, so it has no station.
    #[error("recipe {0} lists no profession")]
    MissingProfession(String),
}

/// Bounds and sign checks on user supplied values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Skill levels range over 0..=7.
    #[error("skill level {0} is out of range [0, 7]")]
    SkillLevelOutOfRange(u8),
    /// Station upgrade levels range over 0..=5.
    #[error("upgrade level {0} is out of range [0, 5]")]
    UpgradeLevelOutOfRange(u8),
    /// Prices, costs and calorie costs must not be negative.
    #[error("negative monetary value for {0}")]
    NegativeMoney(String),
    /// A station key must look like `table|profession`.
    #[error("malformed station key {0:?}")]
    MalformedStationKey(String),
}

/// The recipe catalog document could not be turned into recipes.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The document is not valid JSON for the catalog schema.
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// A recipe declares no products at all.
    #[error("recipe {0} declares no products")]
    NoProducts(String),
    /// A recipe lists no profession, so no station could be derived.
    #[error("recipe {0} lists no profession")]
    NoProfession(String),
    /// Main product quantities must be strictly positive.
    #[error("recipe {0} has a non-positive main product quantity")]
    NonPositiveQuantity(String),
    /// Two recipes share one name.
    #[error("duplicate recipe name {0}")]
    DuplicateRecipe(String),
    /// Station tables and profession names cannot contain the `|` that
    /// separates them in a station key.
    #[error("recipe {recipe}: {name:?} contains '|'")]
    ReservedCharacter { recipe: String, name: String },
}
