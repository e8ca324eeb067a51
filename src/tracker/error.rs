//! Tracker error taxonomy

use crate::domain::{DefinitionId, RecordId, StakeId, VaultId};

/// Everything the tracker can refuse or fail with
///
/// All variants are recoverable at the caller. `Storage` and `Internal`
/// must not be shown verbatim to end users.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("No wallet connected")]
    NotConnected,

    #[error("Invalid wallet address: {0}")]
    InvalidWallet(String),

    #[error("Progress record {0} not found")]
    RecordNotFound(RecordId),

    #[error("Definition {0} not found")]
    DefinitionNotFound(DefinitionId),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Progress record {0} belongs to another wallet")]
    NotOwner(RecordId),

    #[error("Progress record {0} is not completed yet")]
    NotCompleted(RecordId),

    #[error("Reward for progress record {0} was already claimed")]
    AlreadyClaimed(RecordId),

    #[error("Invalid increment: {0}")]
    InvalidIncrement(String),

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Balance overflow: {0}")]
    BalanceOverflow(String),

    #[error("Vault {0} not found")]
    VaultNotFound(VaultId),

    #[error("Stake {0} not found")]
    StakeNotFound(StakeId),

    #[error("Stake {0} belongs to another wallet")]
    NotStakeOwner(StakeId),

    #[error("Invalid stake amount: {0}")]
    InvalidAmount(String),

    #[error("Minimum stake is {0}")]
    BelowMinimumStake(u64),

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("No rewards to claim for stake {0}")]
    NothingToClaim(StakeId),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::InvalidWallet(_) => "invalid_wallet",
            Self::RecordNotFound(_) => "record_not_found",
            Self::DefinitionNotFound(_) => "definition_not_found",
            Self::UserNotFound(_) => "user_not_found",
            Self::NotOwner(_) => "not_owner",
            Self::NotCompleted(_) => "not_completed",
            Self::AlreadyClaimed(_) => "already_claimed",
            Self::InvalidIncrement(_) => "invalid_increment",
            Self::InvalidDefinition(_) => "invalid_definition",
            Self::BalanceOverflow(_) => "balance_overflow",
            Self::VaultNotFound(_) => "vault_not_found",
            Self::StakeNotFound(_) => "stake_not_found",
            Self::NotStakeOwner(_) => "not_owner",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::BelowMinimumStake(_) => "below_minimum_stake",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::NothingToClaim(_) => "nothing_to_claim",
            Self::Storage(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the message may be shown to the user as-is
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
