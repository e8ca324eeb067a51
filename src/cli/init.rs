//! Init command implementation

use anyhow::{Result, bail};
use std::path::PathBuf;

use slerfhub::config::{Config, generate_api_token};

/// Default configuration content for slerfhub init
pub const DEFAULT_CONFIG: &str = r#"# SlerfHub Rewards Configuration
# ==============================
#
# Daily missions and weekly quests, tracked per wallet. Rewards are credited
# to an off-chain balance exactly once per completed record.

# ============================================================================
# SERVER - Local JSON API
# ============================================================================
#
# The front-end sends the connected wallet in `X-Wallet-Address`.
# Optional shared secret sent as `X-SlerfHub-Token`; leave empty to disable auth.

[server]
bind = "127.0.0.1"
port = 9877
auth_token = ""

# ============================================================================
# TRACKER - Storage and resets
# ============================================================================
#
# Available options:
#   database              - SQLite file (default: ~/.slerfhub/rewards.db)
#   reset_policy          - "display_only": resets only drive the countdown,
#                           progress is kept forever (default)
#                           "rollover": each day (missions) / week (quests,
#                           starting Sunday) gets fresh records
#   seed_default_catalog  - Seed the built-in missions/quests into an empty db

[tracker]
reset_policy = "display_only"
seed_default_catalog = true

# ============================================================================
# CATALOG - Custom missions and quests (replaces the built-in catalog)
# ============================================================================
#
# Only applied to an empty database. Requirement types:
#   stake { amount }, referral { count }, game { wins }, mint { count },
#   count { count }, visit { count }, social { platform, action }
#
# [[catalog]]
# kind = "quest"
# title = "Refer 3 Friends"
# description = "Invite friends to join SlerfHub using your referral link"
# reward = 250
# icon = "ri-team-line"
# requirement = { type = "referral", count = 3 }

# ============================================================================
# VAULTS - Custom staking vaults (replace the built-in three)
# ============================================================================
#
# Only applied when the database has no vaults. `apr` is a yearly rate in
# whole percent; rewards accrue linearly and round down.
#
# [[vaults]]
# name = "Degen Vault"
# description = "High risk, high reward"
# apr = 120
# min_stake = 5000
# icon = "ri-fire-line"
"#;

/// Render the starter config, optionally with a fresh API token
pub fn render_config(with_token: bool) -> Result<String> {
    if !with_token {
        return Ok(DEFAULT_CONFIG.to_string());
    }
    let token = generate_api_token()?;
    Ok(DEFAULT_CONFIG.replacen(
        "auth_token = \"\"",
        &format!("auth_token = \"{token}\""),
        1,
    ))
}

/// Write the starter config file
pub fn init_command(config_path: Option<PathBuf>, force: bool, with_token: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    Config::write_raw(&config_path, &render_config(with_token)?)?;
    println!("Created: {}", config_path.display());
    if with_token {
        println!("API token written to [server] auth_token");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slerfhub::config::API_TOKEN_PREFIX;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses_to_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = Config::default();
        assert_eq!(config.server.port, defaults.server.port);
        assert_eq!(config.server.bind, defaults.server.bind);
        assert_eq!(config.tracker.reset_policy, defaults.tracker.reset_policy);
        assert!(config.catalog.is_empty());
        assert!(config.vaults.is_empty());
    }

    #[test]
    fn test_render_config_with_token() {
        let config: Config = toml::from_str(&render_config(true).unwrap()).unwrap();
        assert!(config.server.auth_token.starts_with(API_TOKEN_PREFIX));
        assert_eq!(config.server.auth_token.len(), API_TOKEN_PREFIX.len() + 48);

        let plain: Config = toml::from_str(&render_config(false).unwrap()).unwrap();
        assert!(plain.server.auth_token.is_empty());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        init_command(Some(path.clone()), false, false).unwrap();
        assert!(path.exists());
        assert!(init_command(Some(path.clone()), false, false).is_err());
        init_command(Some(path), true, false).unwrap();
    }
}
