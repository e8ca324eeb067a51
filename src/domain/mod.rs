//! Core domain types for SlerfHub

mod definition;
mod progress;
mod staking;
mod user;

pub use definition::{Definition, DefinitionId, DefinitionKind, NewDefinition, Requirement};
pub use progress::{NewProgressRecord, ProgressRecord, ProgressState, RecordId};
pub use staking::{NewVault, Stake, StakeId, Vault, VaultId};
pub use user::{Tier, User, UserStats};
