//! Mission and quest catalog entries

use serde::{Deserialize, Serialize};

/// Catalog entry ID (database row id)
pub type DefinitionId = i64;

/// Which catalog a definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    /// Daily mission (resets at local midnight under the rollover policy)
    Mission,
    /// Weekly quest (resets on Sunday under the rollover policy)
    Quest,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mission => "mission",
            Self::Quest => "quest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mission" => Some(Self::Mission),
            "quest" => Some(Self::Quest),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mission => "Daily Mission",
            Self::Quest => "Weekly Quest",
        }
    }
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a user has to do to complete a definition
///
/// Serialized with an internal `type` tag, e.g. `{"type":"stake","amount":1000}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Requirement {
    /// Stake an amount of tokens
    Stake { amount: u64 },
    /// Refer N friends
    Referral { count: u32 },
    /// Win N mini-games
    Game { wins: u32 },
    /// Mint N booster NFTs
    Mint { count: u32 },
    /// Generic counter
    Count { count: u32 },
    /// Visit the hub N times
    Visit { count: u32 },
    /// One-off social action (post, join, ...)
    Social { platform: String, action: String },
}

impl Requirement {
    /// Progress needed to complete this requirement (never 0)
    pub fn progress_max(&self) -> u64 {
        let raw = match self {
            Self::Stake { amount } => *amount,
            Self::Referral { count }
            | Self::Mint { count }
            | Self::Count { count }
            | Self::Visit { count } => u64::from(*count),
            Self::Game { wins } => u64::from(*wins),
            Self::Social { .. } => 1,
        };
        raw.max(1)
    }

    /// Short tag name as stored in the `type` field
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Stake { .. } => "stake",
            Self::Referral { .. } => "referral",
            Self::Game { .. } => "game",
            Self::Mint { .. } => "mint",
            Self::Count { .. } => "count",
            Self::Visit { .. } => "visit",
            Self::Social { .. } => "social",
        }
    }
}

/// Immutable catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub id: DefinitionId,
    pub kind: DefinitionKind,
    pub title: String,
    pub description: String,
    /// Reward in whole token units
    pub reward: u64,
    pub icon: String,
    pub requirement: Requirement,
    pub active: bool,
    /// Expiry as Unix ms (weekly quests only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Definition {
    pub fn progress_max(&self) -> u64 {
        self.requirement.progress_max()
    }
}

/// Catalog entry before it has been assigned an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDefinition {
    pub kind: DefinitionKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub reward: u64,
    #[serde(default)]
    pub icon: String,
    pub requirement: Requirement,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

fn default_active() -> bool {
    true
}
