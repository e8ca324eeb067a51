//! Users (identified by wallet address) and their tiers

use serde::{Deserialize, Serialize};

/// Holder tier, derived from token balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Diamond,
}

/// Balance thresholds for each tier (must be sorted ascending)
static TIERS: &[(u64, Tier)] = &[
    (0, Tier::Bronze),
    (10_000, Tier::Silver),
    (50_000, Tier::Gold),
    (250_000, Tier::Diamond),
];

impl Tier {
    /// Highest tier whose threshold the balance reaches
    pub fn for_balance(balance: u64) -> Self {
        TIERS
            .iter()
            .rev()
            .find(|(min, _)| balance >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::Bronze)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Diamond => "diamond",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "diamond" => Some(Self::Diamond),
            _ => None,
        }
    }
}

/// A hub user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub wallet_address: String,
    pub balance: u64,
    pub total_earned: u64,
    pub referral_code: String,
    pub tier: Tier,
    pub created_at: i64,
}

/// Aggregates shown on the user dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub balance: u64,
    pub total_earned: u64,
    /// Tokens currently locked in vaults
    pub staked: u64,
    pub missions_completed: u64,
    pub quests_completed: u64,
    pub rewards_claimed: u64,
    pub trivia_correct: u64,
    pub trivia_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_for_balance() {
        assert_eq!(Tier::for_balance(0), Tier::Bronze);
        assert_eq!(Tier::for_balance(9_999), Tier::Bronze);
        assert_eq!(Tier::for_balance(10_000), Tier::Silver);
        assert_eq!(Tier::for_balance(50_000), Tier::Gold);
        assert_eq!(Tier::for_balance(2_500_000), Tier::Diamond);
    }
}
