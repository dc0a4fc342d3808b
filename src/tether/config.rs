use crate::diagnostics::Diagnostics;
use crate::error::{Result, TetherError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "tether.json";

/// Application wiring for tether, stored in `tether.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TetherConfig {
    /// Named resource base URLs (e.g. `"users" -> "http://localhost:3000/users"`)
    #[serde(default)]
    pub resources: BTreeMap<String, String>,

    /// Overrides for diagnostic messages; missing entries keep the defaults
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl TetherConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: TetherConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn resource_url(&self, name: &str) -> Result<&str> {
        self.resources
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| TetherError::Config(format!("Unknown resource: {}", name)))
    }

    /// Register a resource (normalizes away a trailing slash)
    pub fn set_resource(&mut self, name: &str, url: &str) {
        self.resources.insert(
            name.to_string(),
            url.trim_end_matches('/').to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = TetherConfig::default();
        assert!(config.resources.is_empty());
        assert_eq!(config.diagnostics, Diagnostics::default());
    }

    #[test]
    fn test_set_resource_trims_slash() {
        let mut config = TetherConfig::default();
        config.set_resource("users", "http://localhost:3000/users/");
        assert_eq!(
            config.resource_url("users").unwrap(),
            "http://localhost:3000/users"
        );
    }

    #[test]
    fn test_unknown_resource() {
        let config = TetherConfig::default();
        let err = config.resource_url("users").unwrap_err();
        assert!(matches!(err, TetherError::Config(_)));
        assert_eq!(err.to_string(), "Config error: Unknown resource: users");
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempdir().unwrap();
        let config = TetherConfig::load(dir.path()).unwrap();
        assert_eq!(config, TetherConfig::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("app");

        let mut config = TetherConfig::default();
        config.set_resource("users", "http://localhost:3000/users");
        config.diagnostics.fetch_failed = "Could not load".to_string();
        config.save(&nested).unwrap();

        let loaded = TetherConfig::load(&nested).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "diagnostics": { "save_failed": "Nope" } }"#,
        )
        .unwrap();

        let config = TetherConfig::load(dir.path()).unwrap();
        assert!(config.resources.is_empty());
        assert_eq!(config.diagnostics.save_failed, "Nope");
        assert_eq!(
            config.diagnostics.fetch_failed,
            Diagnostics::default().fetch_failed
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").unwrap();
        assert!(matches!(
            TetherConfig::load(dir.path()),
            Err(TetherError::Serialization(_))
        ));
    }
}
