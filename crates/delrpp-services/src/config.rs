//! Render configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings for [`crate::ClipRenderer`], usually read from a TOML file:
///
/// ```toml
/// seed = 1234
/// always_expand = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Seed for probabilistic conditions; random when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Unroll clips over their instance length even when no condition
    /// depends on the iteration
    #[serde(default)]
    pub always_expand: bool,
}

impl RenderConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        assert_eq!(RenderConfig::from_toml_str("").unwrap(), RenderConfig::default());
    }

    #[test]
    fn test_parse() {
        let config = RenderConfig::from_toml_str("seed = 99\nalways_expand = true\n").unwrap();
        assert_eq!(config.seed, Some(99));
        assert!(config.always_expand);
    }

    #[test]
    fn test_round_trip() {
        let config = RenderConfig::seeded(7);
        let s = config.to_toml_string().unwrap();
        assert_eq!(RenderConfig::from_toml_str(&s).unwrap(), config);
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(RenderConfig::from_toml_str("seed = \"abc\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = RenderConfig::load(Path::new("/nonexistent/delrpp.toml")).unwrap_err();
        assert!(matches!(err, crate::error::ServiceError::Io(_)));
    }
}
