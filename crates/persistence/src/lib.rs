#![deny(warnings)]

//! Persistence layer: profile documents and the tagged map/set encoding they
//! are written in.

mod profile;
mod tagged;

pub use profile::{export_profile, import_profile, ItemDocument, ProfileDocument, StationDocument};
pub use tagged::{TaggedMap, TaggedSet};

use thiserror::Error;

/// Failure to read or write a profile document.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Not valid JSON, a wrong `_type` tag, or a field of the wrong shape.
    #[error("malformed profile document: {0}")]
    Json(#[from] serde_json::Error),
    /// Well formed, but a recipe points at something the document lacks.
    #[error("recipe {recipe} is inconsistent: {what}")]
    Inconsistent { recipe: String, what: String },
}
