use craft_core::StationKey;
use craft_econ::RecipeSettings;
use rust_decimal::Decimal;

/// A mutation requested on one profile. Every intent runs to completion,
/// including price propagation, before the next one is accepted.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// Add the catalog recipe with this name.
    AddRecipe { recipe: String },
    /// Add the first catalog recipe producing this item.
    AddRecipeForItem { item: String },
    RemoveRecipe { recipe: String },
    SetItemPrice { item: String, price: Decimal },
    SetByproductPrice { item: String, price: Decimal },
    UpdateRecipeSettings { recipe: String, settings: RecipeSettings },
    /// Levels are validated when the intent is applied.
    UpdateProfession {
        profession: String,
        level: u8,
        lavish_workspace: bool,
    },
    UpdateStationUpgrade { station: StationKey, level: u8 },
    SetMargin { margin: Decimal },
    SetCalorieCost { calorie_cost: Decimal },
    /// Replace the catalog with a JSON catalog document and clear the graph.
    ReplaceCatalog { json: String },
    /// Replace the whole profile state with an exported profile document.
    ImportProfile { json: String },
}

impl Intent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::AddRecipe { .. } => "add_recipe",
            Intent::AddRecipeForItem { .. } => "add_recipe_for_item",
            Intent::RemoveRecipe { .. } => "remove_recipe",
            Intent::SetItemPrice { .. } => "set_item_price",
            Intent::SetByproductPrice { .. } => "set_byproduct_price",
            Intent::UpdateRecipeSettings { .. } => "update_recipe_settings",
            Intent::UpdateProfession { .. } => "update_profession",
            Intent::UpdateStationUpgrade { .. } => "update_station_upgrade",
            Intent::SetMargin { .. } => "set_margin",
            Intent::SetCalorieCost { .. } => "set_calorie_cost",
            Intent::ReplaceCatalog { .. } => "replace_catalog",
            Intent::ImportProfile { .. } => "import_profile",
        }
    }
}
