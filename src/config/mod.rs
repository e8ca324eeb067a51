//! Configuration loading and management

mod io;
mod settings;
mod token;

pub use settings::{ServerSettings, TrackerSettings};
pub use token::{API_TOKEN_PREFIX, generate_api_token};

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{NewDefinition, NewVault};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Storage and reset settings
    #[serde(default)]
    pub tracker: TrackerSettings,

    /// Custom mission/quest catalog. Replaces the built-in one when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog: Vec<NewDefinition>,

    /// Custom staking vaults. Replace the built-in ones when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vaults: Vec<NewVault>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration for a working directory.
    /// Looks for: .slerfhub/config.toml, then ~/.slerfhub/config.toml, then defaults.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let local_path = dir.join(".slerfhub/config.toml");
        if local_path.exists() {
            return Self::from_file(&local_path);
        }

        let global_path = Self::global_config_path();
        if global_path.exists() {
            return Self::from_file(&global_path);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DefinitionKind, Requirement};
    use crate::tracker::ResetPolicy;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 9877);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert!(config.server.auth_token.is_empty());
        assert_eq!(config.tracker.reset_policy, ResetPolicy::DisplayOnly);
        assert!(config.tracker.seed_default_catalog);
        assert!(config.catalog.is_empty());
        assert!(config.vaults.is_empty());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 4000

            [tracker]
            reset_policy = "rollover"

            [[catalog]]
            kind = "quest"
            title = "Refer 3 Friends"
            reward = 250
            requirement = { type = "referral", count = 3 }

            [[vaults]]
            name = "Degen Vault"
            apr = 120
            min_stake = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.tracker.reset_policy, ResetPolicy::Rollover);
        assert_eq!(config.catalog.len(), 1);
        assert_eq!(config.catalog[0].kind, DefinitionKind::Quest);
        assert_eq!(config.catalog[0].requirement, Requirement::Referral { count: 3 });
        assert!(config.catalog[0].active);
        assert_eq!(config.vaults.len(), 1);
        assert_eq!(config.vaults[0].apr, 120);
        assert!(config.vaults[0].description.is_empty());
    }

    #[test]
    fn test_from_dir_prefers_local_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".slerfhub")).unwrap();
        std::fs::write(
            dir.path().join(".slerfhub/config.toml"),
            "[server]\nport = 1234\n",
        )
        .unwrap();

        let config = Config::from_dir(dir.path()).unwrap();
        assert_eq!(config.server.port, 1234);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
