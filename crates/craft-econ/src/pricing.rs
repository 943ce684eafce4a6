//! Pricing formula: the unit price of a recipe's main product from the
//! current prices of everything it touches.

use craft_core::{Recipe, SkillLevel, UpgradeLevel};
use rust_decimal::Decimal;

use crate::error::EngineError;

/// Ingredient multiplier per station upgrade level, as `(mantissa, scale)`.
const UPGRADE_EFFECT: [(i64, u32); 6] = [(1, 0), (9, 1), (75, 2), (6, 1), (55, 2), (5, 1)];

/// Calorie multiplier per profession level, as `(mantissa, scale)`.
const SKILL_CALORIE_EFFECT: [(i64, u32); 8] = [
    (1, 0),
    (5, 1),
    (45, 2),
    (4, 1),
    (35, 2),
    (3, 1),
    (25, 2),
    (2, 1),
];

/// Ingredient discount of a lavish workspace.
const LAVISH_FACTOR: (i64, u32) = (95, 2);

/// Non-constant ingredient multiplier of a station at `level`.
pub fn upgrade_multiplier(level: UpgradeLevel) -> Decimal {
    let (num, scale) = UPGRADE_EFFECT[usize::from(level.get())];
    Decimal::new(num, scale)
}

/// Calorie multiplier of a profession at `level`.
pub fn calorie_multiplier(level: SkillLevel) -> Decimal {
    let (num, scale) = SKILL_CALORIE_EFFECT[usize::from(level.get())];
    Decimal::new(num, scale)
}

/// `max(1 + margin, 1)`: a margin never pushes a price below break-even.
fn margin_factor(margin: Decimal) -> Option<Decimal> {
    Decimal::ONE.checked_add(margin).map(|factor| factor.max(Decimal::ONE))
}

/// Everything outside the recipe itself that the price depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProductionConditions {
    /// Upgrade of the recipe's station.
    pub upgrade_level: UpgradeLevel,
    /// Level of the station's profession.
    pub skill_level: SkillLevel,
    /// Whether the profession has a lavish workspace.
    pub lavish_workspace: bool,
    /// Global cost of one thousand calories.
    pub calorie_cost: Decimal,
    /// Global default margin.
    pub global_margin: Decimal,
}

/// Itemised cost of one craft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostBreakdown {
    pub ingredients: Decimal,
    pub calories: Decimal,
    pub fixed: Decimal,
    pub byproduct_credit: Decimal,
    /// `ingredients + calories + fixed - byproduct_credit`
    pub total: Decimal,
    /// Margin factor applied, at least 1.
    pub margin_factor: Decimal,
    /// `total * margin_factor / main product quantity`
    pub unit_price: Decimal,
}

/// Quantity of a non-constant ingredient actually consumed, `None` on
/// overflow.
fn effective_quantity(
    quantity: Decimal,
    conditions: &ProductionConditions,
    batch_size: Option<u32>,
) -> Option<Decimal> {
    let mut scaled = quantity.checked_mul(upgrade_multiplier(conditions.upgrade_level))?;
    if conditions.lavish_workspace {
        scaled = scaled.checked_mul(Decimal::new(LAVISH_FACTOR.0, LAVISH_FACTOR.1))?;
    }
    match batch_size {
        Some(size) if size > 0 => {
            let size = Decimal::from(size);
            scaled.checked_mul(size)?.ceil().checked_div(size)
        }
        _ => Some(scaled),
    }
}

/// Price one craft of `recipe`.
///
/// `ingredient_prices` lines up with `recipe.ingredients`; `byproduct_price`
/// is the current price of the recipe's byproduct, if it declares one.
pub fn price_recipe(
    recipe: &Recipe,
    ingredient_prices: &[Decimal],
    byproduct_price: Option<Decimal>,
    conditions: &ProductionConditions,
) -> Result<CostBreakdown, EngineError> {
    let main_quantity = recipe.main_product.quantity;
    if main_quantity <= Decimal::ZERO {
        return Err(EngineError::NonPositiveQuantity(recipe.name.clone()));
    }

    let overflow = || EngineError::Overflow(recipe.name.clone());

    let mut ingredients = Decimal::ZERO;
    for (ingredient, price) in recipe.ingredients.iter().zip(ingredient_prices) {
        let quantity = if ingredient.is_constant {
            Some(ingredient.quantity)
        } else {
            effective_quantity(ingredient.quantity, conditions, recipe.batch_size)
        };
        ingredients = quantity
            .and_then(|q| q.checked_mul(*price))
            .and_then(|line| ingredients.checked_add(line))
            .ok_or_else(overflow)?;
    }

    let calories = conditions
        .calorie_cost
        .checked_mul(calorie_multiplier(conditions.skill_level))
        .and_then(|c| c.checked_mul(recipe.calories.unwrap_or(Decimal::ZERO)))
        .and_then(|c| c.checked_div(Decimal::ONE_THOUSAND))
        .ok_or_else(overflow)?;

    let fixed = recipe.fixed_cost.unwrap_or(Decimal::ZERO);

    let byproduct_credit = match (&recipe.byproduct, byproduct_price) {
        (Some(byproduct), Some(price)) => price.checked_mul(byproduct.quantity).ok_or_else(overflow)?,
        _ => Decimal::ZERO,
    };

    let total = ingredients
        .checked_add(calories)
        .and_then(|t| t.checked_add(fixed))
        .and_then(|t| t.checked_sub(byproduct_credit))
        .ok_or_else(overflow)?;
    let factor =
        margin_factor(recipe.margin.unwrap_or(conditions.global_margin)).ok_or_else(overflow)?;
    let unit_price = total
        .checked_mul(factor)
        .and_then(|t| t.checked_div(main_quantity))
        .ok_or_else(overflow)?;

    Ok(CostBreakdown {
        ingredients,
        calories,
        fixed,
        byproduct_credit,
        total,
        margin_factor: factor,
        unit_price,
    })
}
