//! Per-user progress records

use serde::{Deserialize, Serialize};

use super::definition::{DefinitionId, DefinitionKind};

/// Progress record ID (database row id)
pub type RecordId = i64;

/// Lifecycle state of a progress record
///
/// Transitions only move forward:
/// `NotStarted -> InProgress -> Completed -> Claimed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    NotStarted,
    InProgress,
    Completed,
    Claimed,
}

impl std::fmt::Display for ProgressState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Claimed => "claimed",
        };
        f.write_str(s)
    }
}

/// One user's progress on one definition for one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: RecordId,
    pub wallet_address: String,
    pub definition_id: DefinitionId,
    pub kind: DefinitionKind,
    /// Reset period this record belongs to (see `tracker::reset::period_key`)
    pub period: String,
    pub progress: u64,
    pub progress_max: u64,
    pub completed: bool,
    pub claimed: bool,
    /// Unix ms
    pub last_updated: i64,
}

impl ProgressRecord {
    pub fn state(&self) -> ProgressState {
        if self.claimed {
            ProgressState::Claimed
        } else if self.completed {
            ProgressState::Completed
        } else if self.progress > 0 {
            ProgressState::InProgress
        } else {
            ProgressState::NotStarted
        }
    }

    /// Completion ratio in 0.0..=1.0
    pub fn ratio(&self) -> f32 {
        if self.progress_max == 0 {
            return 1.0;
        }
        (self.progress as f32 / self.progress_max as f32).min(1.0)
    }
}

/// Record to be inserted (progress starts at 0)
#[derive(Debug, Clone)]
pub struct NewProgressRecord {
    pub wallet_address: String,
    pub definition_id: DefinitionId,
    pub kind: DefinitionKind,
    pub period: String,
    pub progress_max: u64,
}
