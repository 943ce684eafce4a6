//! Errors raised by the pricing engine and graph editor.

use craft_core::{LookupError, ValidationError};
use thiserror::Error;

/// Failure of an engine operation.
///
/// A deferred price computation is not an error; see
/// [`PriceOutcome`](crate::PriceOutcome).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The graph's cross references are inconsistent.
    #[error(transparent)]
    Lookup(#[from] LookupError),
    /// A supplied value is out of range.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The catalog has no recipe by this name.
    #[error("recipe {0} is not in the catalog")]
    UnknownRecipe(String),
    /// The main product quantity must be strictly positive to price per unit.
    #[error("recipe {0} has a non-positive main product quantity")]
    NonPositiveQuantity(String),
    /// A price left the representable decimal range.
    #[error("price of recipe {0} overflowed")]
    Overflow(String),
}
