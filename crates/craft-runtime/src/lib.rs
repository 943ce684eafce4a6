#![deny(warnings)]

//! Profile runtime: owns profiles, turns intents into engine calls and keeps
//! every profile consistent when an intent fails.

mod book;
mod config;
mod error;
mod intent;
mod profile;

pub use book::ProfileBook;
pub use config::EngineConfig;
pub use error::{ConfigError, IntentError};
pub use intent::Intent;
pub use profile::{PriceLine, PriceReport, Profile, ProfileId};

pub use craft_econ::{Outcome, PassSummary, RecipeSettings};
