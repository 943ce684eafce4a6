//! Engine settings loaded from YAML.

use craft_core::validate_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Defaults applied to newly created profiles.
///
/// ```yaml
/// profile_name: Workshop
/// margin: 0.15
/// calorie_cost: 4
/// id_seed: 7
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the profile created at startup.
    pub profile_name: String,
    /// Global margin of new profiles.
    pub margin: Decimal,
    /// Cost of one thousand calories for new profiles.
    pub calorie_cost: Decimal,
    /// Seed for reproducible profile ids.
    pub id_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile_name: "default".to_string(),
            margin: Decimal::ZERO,
            calorie_cost: Decimal::ZERO,
            id_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        validate_money("calorie cost", config.calorie_cost)?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = EngineConfig::from_yaml_str("margin: 0.25\n").unwrap();
        assert_eq!(config.profile_name, "default");
        assert_eq!(config.margin, Decimal::new(25, 2));
        assert_eq!(config.calorie_cost, Decimal::ZERO);
        assert_eq!(config.id_seed, None);
    }

    #[test]
    fn full_document() {
        let yaml = "profile_name: Workshop\nmargin: 0.15\ncalorie_cost: 4\nid_seed: 7\n";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.profile_name, "Workshop");
        assert_eq!(config.calorie_cost, Decimal::new(4, 0));
        assert_eq!(config.id_seed, Some(7));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_yaml_str("calorie_cost: -1\n"),
            Err(ConfigError::Validation(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("margin: [1, 2]\n"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
