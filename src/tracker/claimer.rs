//! Reward claiming
//!
//! The precondition checks live here; the atomic flag flip + balance credit
//! is done by the store inside one transaction (see `SqliteStore::claim`).

use serde::{Deserialize, Serialize};

use super::error::{Result, TrackerError};
use crate::domain::ProgressRecord;

/// Result of a successful claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub record: ProgressRecord,
    /// Reward credited by this claim
    pub reward: u64,
    /// User balance after the credit
    pub balance: u64,
}

/// Check that `wallet` may claim `record` right now.
///
/// Checked in order: ownership, `AlreadyClaimed`, `NotCompleted`.
/// A foreign record reports `NotOwner` whatever its state.
pub fn check_claimable(record: &ProgressRecord, wallet: &str) -> Result<()> {
    if record.wallet_address != wallet {
        return Err(TrackerError::NotOwner(record.id));
    }
    if record.claimed {
        return Err(TrackerError::AlreadyClaimed(record.id));
    }
    if !record.completed {
        return Err(TrackerError::NotCompleted(record.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DefinitionKind;

    fn record(completed: bool, claimed: bool) -> ProgressRecord {
        ProgressRecord {
            id: 7,
            wallet_address: "0xaa".into(),
            definition_id: 1,
            kind: DefinitionKind::Mission,
            period: "all".into(),
            progress: if completed { 1 } else { 0 },
            progress_max: 1,
            completed,
            claimed,
            last_updated: 0,
        }
    }

    #[test]
    fn test_claimable_when_completed() {
        assert!(check_claimable(&record(true, false), "0xaa").is_ok());
    }

    #[test]
    fn test_not_completed() {
        assert!(matches!(
            check_claimable(&record(false, false), "0xaa"),
            Err(TrackerError::NotCompleted(7))
        ));
    }

    #[test]
    fn test_already_claimed() {
        assert!(matches!(
            check_claimable(&record(true, true), "0xaa"),
            Err(TrackerError::AlreadyClaimed(7))
        ));
    }

    #[test]
    fn test_other_wallet() {
        assert!(matches!(
            check_claimable(&record(true, false), "0xbb"),
            Err(TrackerError::NotOwner(7))
        ));
    }
}
