use craft_core::{CatalogError, ValidationError};
use craft_econ::EngineError;
use persistence::SnapshotError;
use thiserror::Error;

use crate::profile::ProfileId;

/// Why an intent was rejected. The profile is unchanged whenever this is
/// returned.
#[derive(Debug, Error)]
pub enum IntentError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("catalog rejected: {0}")]
    Catalog(#[from] CatalogError),
    #[error("profile import rejected: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("no profile with id {0}")]
    UnknownProfile(ProfileId),
}

/// Failure to load an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
