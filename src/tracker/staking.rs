//! Staking vaults
//!
//! Users lock part of their balance in a vault and accrue rewards at the
//! vault's APR. Balance moves (debit on stake, credit on claim or unstake)
//! happen inside one store transaction each, like reward claims.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{Result, TrackerError};
use super::store::ProgressStore;
use crate::domain::{NewVault, Stake, StakeId, Vault};

/// Result of claiming staking rewards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePayout {
    pub stake: Stake,
    /// Rewards credited by this claim
    pub rewards: u64,
    /// User balance after the credit
    pub balance: u64,
}

/// Result of closing a stake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unstaked {
    pub stake_id: StakeId,
    /// Principal returned to the balance
    pub amount: u64,
    /// Pending rewards paid out on close
    pub rewards: u64,
    pub balance: u64,
}

/// The stock vaults
pub fn default_vaults() -> Vec<NewVault> {
    vec![
        NewVault {
            name: "Basic Vault".into(),
            description: "Flexible staking with no lock period".into(),
            apr: 18,
            min_stake: 100,
            icon: "ri-safe-line".into(),
        },
        NewVault {
            name: "Enhanced Vault".into(),
            description: "Higher yield for committed holders".into(),
            apr: 25,
            min_stake: 500,
            icon: "ri-safe-2-line".into(),
        },
        NewVault {
            name: "Premium Vault".into(),
            description: "Top yield for whales".into(),
            apr: 40,
            min_stake: 1000,
            icon: "ri-vip-crown-line".into(),
        },
    ]
}

/// Insert `vaults` if no vault exists yet. Returns how many were inserted.
pub fn seed(store: &dyn ProgressStore, vaults: &[NewVault]) -> Result<usize> {
    if !store.vaults()?.is_empty() {
        return Ok(0);
    }
    for vault in vaults {
        store.insert_vault(vault)?;
    }
    info!("[slerfhub:staking] Seeded {} vaults", vaults.len());
    Ok(vaults.len())
}

/// Reject non-positive stake amounts
pub fn validate_amount(amount: i64) -> Result<u64> {
    match u64::try_from(amount) {
        Ok(amount) if amount > 0 => Ok(amount),
        _ => Err(TrackerError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        ))),
    }
}

/// Check that `amount` may go into `vault` from a balance of `balance`.
///
/// The minimum is checked before the balance.
pub fn check_stakeable(vault: &Vault, amount: u64, balance: u64) -> Result<()> {
    if amount < vault.min_stake {
        return Err(TrackerError::BelowMinimumStake(vault.min_stake));
    }
    if balance < amount {
        return Err(TrackerError::InsufficientBalance {
            needed: amount,
            available: balance,
        });
    }
    Ok(())
}

/// A foreign stake reports `NotStakeOwner`
pub fn check_stake_owner(stake: &Stake, wallet: &str) -> Result<()> {
    if stake.wallet_address != wallet {
        return Err(TrackerError::NotStakeOwner(stake.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(min_stake: u64) -> Vault {
        Vault {
            id: 1,
            name: "Basic Vault".into(),
            description: String::new(),
            apr: 18,
            min_stake,
            icon: String::new(),
        }
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(250).unwrap(), 250);
        assert!(matches!(validate_amount(0), Err(TrackerError::InvalidAmount(_))));
        assert!(matches!(validate_amount(-5), Err(TrackerError::InvalidAmount(_))));
    }

    #[test]
    fn test_minimum_checked_before_balance() {
        assert!(matches!(
            check_stakeable(&vault(100), 50, 0),
            Err(TrackerError::BelowMinimumStake(100))
        ));
        assert!(matches!(
            check_stakeable(&vault(100), 150, 120),
            Err(TrackerError::InsufficientBalance {
                needed: 150,
                available: 120
            })
        ));
        assert!(check_stakeable(&vault(100), 100, 100).is_ok());
    }

    #[test]
    fn test_default_vault_rates() {
        let vaults = default_vaults();
        let rates: Vec<_> = vaults.iter().map(|v| (v.apr, v.min_stake)).collect();
        assert_eq!(rates, vec![(18, 100), (25, 500), (40, 1000)]);
    }
}
