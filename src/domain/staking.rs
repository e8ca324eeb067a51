//! Staking vaults and open stakes

use serde::{Deserialize, Serialize};

/// Vault ID (database row id)
pub type VaultId = i64;

/// Stake ID (database row id)
pub type StakeId = i64;

const DAY_MS: u128 = 24 * 60 * 60 * 1000;

/// A staking pool with a fixed yearly rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub id: VaultId,
    pub name: String,
    pub description: String,
    /// Yearly rate in whole percent
    pub apr: u32,
    pub min_stake: u64,
    pub icon: String,
}

/// Vault as declared in config or the built-in list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVault {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub apr: u32,
    pub min_stake: u64,
    #[serde(default)]
    pub icon: String,
}

/// Tokens locked in a vault by one wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub id: StakeId,
    pub wallet_address: String,
    pub vault_id: VaultId,
    pub amount: u64,
    /// Rewards paid out so far
    pub rewards: u64,
    pub staked_at: i64,
    /// Start of the current accrual window
    pub last_claimed: i64,
}

impl Stake {
    /// Rewards accrued since `last_claimed` at `apr` percent a year.
    ///
    /// Accrual is linear over 365-day years and rounds down to whole tokens.
    pub fn pending_rewards(&self, apr: u32, now_ms: i64) -> u64 {
        let elapsed = u128::try_from(now_ms.saturating_sub(self.last_claimed)).unwrap_or(0);
        let accrued = u128::from(self.amount) * u128::from(apr) * elapsed / (100 * 365 * DAY_MS);
        u64::try_from(accrued).unwrap_or(u64::MAX)
    }
}
