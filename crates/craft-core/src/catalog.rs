//! Domain catalog: the static recipe definitions a profile can pick from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::model::{Ingredient, Product, ProfessionRequirement, Recipe};

/// A recipe as it appears in a catalog document, before the main product and
/// byproduct have been chosen.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDefinition {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default, rename = "profession", alias = "professions")]
    pub professions: Vec<ProfessionRequirement>,
    #[serde(default, rename = "calorie", alias = "calories")]
    pub calories: Option<Decimal>,
    #[serde(default)]
    pub xp: Option<Decimal>,
}

/// Main product, optional byproduct, and whatever else the recipe declared.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductSelection {
    pub main_product: Product,
    pub byproduct: Option<Product>,
    pub dropped: Vec<Product>,
}

/// Pick the output a recipe is for.
///
/// A single product is the main product. With several, the first
/// non-constant product becomes the byproduct as long as a constant product
/// remains; the main product is then the largest remaining quantity, with
/// declaration order breaking ties. If no non-constant product can be set
/// aside this way, the two largest quantities become main product and
/// byproduct. Anything beyond that is returned in `dropped`.
pub fn select_products(
    recipe: &str,
    mut products: Vec<Product>,
) -> Result<ProductSelection, CatalogError> {
    if products.is_empty() {
        return Err(CatalogError::NoProducts(recipe.to_string()));
    }
    let has_constant = products.iter().any(|p| p.is_constant);
    let scaling = if has_constant {
        products.iter().position(|p| !p.is_constant)
    } else {
        None
    };
    let mut byproduct = scaling.map(|idx| products.remove(idx));

    // stable, so equal quantities keep declaration order
    products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    let mut rest = products.into_iter();
    let main_product = rest
        .next()
        .ok_or_else(|| CatalogError::NoProducts(recipe.to_string()))?;
    if byproduct.is_none() {
        byproduct = rest.next();
    }
    if main_product.quantity <= Decimal::ZERO {
        return Err(CatalogError::NonPositiveQuantity(recipe.to_string()));
    }
    Ok(ProductSelection {
        main_product,
        byproduct,
        dropped: rest.collect(),
    })
}

impl RecipeDefinition {
    /// Apply the product selection rule and validate the result.
    pub fn into_recipe(self) -> Result<Recipe, CatalogError> {
        if self.professions.is_empty() {
            return Err(CatalogError::NoProfession(self.name));
        }
        let selection = select_products(&self.name, self.products)?;
        if !selection.dropped.is_empty() {
            warn!(
                recipe = %self.name,
                dropped = selection.dropped.len(),
                "recipe declares more than two products; extra outputs ignored"
            );
        }
        Ok(Recipe {
            name: self.name,
            ingredients: self.ingredients,
            main_product: selection.main_product,
            byproduct: selection.byproduct,
            professions: self.professions,
            table: self.table,
            calories: self.calories,
            price: Decimal::ZERO,
            margin: None,
            batch_size: None,
            fixed_cost: None,
        })
    }
}

/// Ordered, read-only list of recipes available to a profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    recipes: Vec<Recipe>,
}

impl Catalog {
    /// Build a catalog from already selected recipes, rejecting duplicate
    /// names and station parts that would not survive a station key.
    pub fn new(recipes: Vec<Recipe>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for recipe in &recipes {
            if !seen.insert(recipe.name.as_str()) {
                return Err(CatalogError::DuplicateRecipe(recipe.name.clone()));
            }
            let station_parts = std::iter::once(&recipe.table)
                .chain(recipe.professions.iter().map(|p| &p.name));
            for name in station_parts {
                if name.contains('|') {
                    return Err(CatalogError::ReservedCharacter {
                        recipe: recipe.name.clone(),
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(Self { recipes })
    }

    /// Build a catalog from raw definitions.
    pub fn from_definitions(definitions: Vec<RecipeDefinition>) -> Result<Self, CatalogError> {
        let recipes = definitions
            .into_iter()
            .map(RecipeDefinition::into_recipe)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(recipes)
    }

    /// Parse a catalog document: a JSON array of recipe definitions.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<RecipeDefinition> = serde_json::from_str(text)?;
        let catalog = Self::from_definitions(definitions)?;
        info!(recipes = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Recipe definition by name.
    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    /// First recipe whose main product is `item`.
    pub fn producer_of(&self, item: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.main_product.name == item)
    }

    /// Whether some recipe has `item` as its main product.
    pub fn can_produce(&self, item: &str) -> bool {
        self.producer_of(item).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, quantity: i64, is_constant: bool) -> Product {
        Product {
            name: name.to_string(),
            quantity: Decimal::new(quantity, 0),
            is_constant,
            display_name: None,
        }
    }

    #[test]
    fn single_product_is_main() {
        let sel = select_products("r", vec![product("Bar", 1, false)]).unwrap();
        assert_eq!(sel.main_product.name, "Bar");
        assert!(sel.byproduct.is_none());
    }

    #[test]
    fn scaling_output_is_byproduct() {
        let sel = select_products(
            "r",
            vec![product("Slag", 6, false), product("Bar", 2, true)],
        )
        .unwrap();
        assert_eq!(sel.main_product.name, "Bar");
        assert_eq!(sel.byproduct.unwrap().name, "Slag");
        assert!(sel.dropped.is_empty());
    }

    #[test]
    fn all_constant_picks_largest() {
        let sel = select_products(
            "r",
            vec![
                product("Pulp", 1, true),
                product("Lumber", 4, true),
                product("Bark", 2, true),
            ],
        )
        .unwrap();
        assert_eq!(sel.main_product.name, "Lumber");
        assert_eq!(sel.byproduct.unwrap().name, "Bark");
        assert_eq!(sel.dropped.len(), 1);
    }

    #[test]
    fn ties_keep_declaration_order() {
        let sel = select_products("r", vec![product("A", 1, true), product("B", 1, true)]).unwrap();
        assert_eq!(sel.main_product.name, "A");
        assert_eq!(sel.byproduct.unwrap().name, "B");
    }

    #[test]
    fn empty_and_zero_quantity_are_rejected() {
        assert!(matches!(
            select_products("r", vec![]),
            Err(CatalogError::NoProducts(_))
        ));
        assert!(matches!(
            select_products("r", vec![product("A", 0, true)]),
            Err(CatalogError::NonPositiveQuantity(_))
        ));
    }

    #[test]
    fn parses_catalog_document() {
        let json = r#"[
          {
            "name": "Smelt Iron",
            "table": "Bloomery",
            "calorie": 120,
            "xp": 1,
            "ingredients": [{"item": "IronOre", "tag": null, "quantity": 10, "isConstant": false}],
            "products": [
              {"item": "IronBar", "quantity": 5, "isConstant": true},
              {"item": "Slag", "quantity": 2, "isConstant": false}
            ],
            "profession": [{"skill": "Smelting", "level": 1}]
          }
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        let recipe = catalog.get("Smelt Iron").unwrap();
        assert_eq!(recipe.main_product.name, "IronBar");
        assert_eq!(recipe.byproduct.as_ref().unwrap().name, "Slag");
        assert_eq!(recipe.calories, Some(Decimal::new(120, 0)));
        assert!(catalog.can_produce("IronBar"));
        assert!(!catalog.can_produce("Slag"));
        assert_eq!(catalog.producer_of("IronBar").unwrap().name, "Smelt Iron");
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(Catalog::from_json("{"), Err(CatalogError::Parse(_))));
        let no_profession = r#"[{"name":"r","table":"t","products":[{"item":"A","quantity":1}]}]"#;
        assert!(matches!(
            Catalog::from_json(no_profession),
            Err(CatalogError::NoProfession(_))
        ));
        let dup = r#"[
          {"name":"r","table":"t","products":[{"item":"A","quantity":1}],"profession":[{"skill":"s"}]},
          {"name":"r","table":"t","products":[{"item":"B","quantity":1}],"profession":[{"skill":"s"}]}
        ]"#;
        assert!(matches!(
            Catalog::from_json(dup),
            Err(CatalogError::DuplicateRecipe(_))
        ));
    }

    #[test]
    fn station_parts_cannot_contain_the_key_separator() {
        let table = r#"[{"name":"r","table":"Work|bench","products":[{"item":"A","quantity":1}],"profession":[{"skill":"s"}]}]"#;
        assert!(matches!(
            Catalog::from_json(table),
            Err(CatalogError::ReservedCharacter { name, .. }) if name == "Work|bench"
        ));
        let skill = r#"[{"name":"r","table":"t","products":[{"item":"A","quantity":1}],"profession":[{"skill":"s"},{"skill":"a|b"}]}]"#;
        assert!(matches!(
            Catalog::from_json(skill),
            Err(CatalogError::ReservedCharacter { name, .. }) if name == "a|b"
        ));
    }
}
