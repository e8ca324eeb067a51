//! Settings sections of `config.toml`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tracker::ResetPolicy;

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind (keep it on loopback unless fronted by a proxy)
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port for the rewards API
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret expected in the `X-SlerfHub-Token` header.
    /// Empty disables the check.
    #[serde(default)]
    pub auth_token: String,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9877
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            auth_token: String::new(),
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Tracker storage and reset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// SQLite database path (default: ~/.slerfhub/rewards.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Whether reset boundaries only drive the countdown or start new periods
    #[serde(default)]
    pub reset_policy: ResetPolicy,

    /// Seed the built-in catalog into an empty database
    #[serde(default = "default_seed")]
    pub seed_default_catalog: bool,
}

fn default_seed() -> bool {
    true
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            database: None,
            reset_policy: ResetPolicy::default(),
            seed_default_catalog: default_seed(),
        }
    }
}
