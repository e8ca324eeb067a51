//! Mission/quest progress tracking for SlerfHub
//!
//! Tracks per-user progress on daily missions and weekly quests in a SQLite
//! database (`~/.slerfhub/rewards.db`) and pays out rewards exactly once.
//!
//! # Architecture
//!
//! ```text
//!   HTTP server / CLI
//!          │  (resolved wallet address)
//!          ▼
//!      Tracker ──► evaluator (threshold math)
//!          │   ──► claimer   (claim preconditions)
//!          │   ──► staking   (vault preconditions)
//!          │   ──► reset     (periods, countdowns)
//!          ▼
//!   dyn ProgressStore ──► SqliteStore ──► rewards.db
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let tracker = Tracker::from_config(&config)?;
//!
//! let quests = tracker.progress(&wallet, DefinitionKind::Quest)?;
//! let record = tracker.increment(&wallet, quests[0].record.id, 1)?;
//! let receipt = tracker.claim(&wallet, record.id)?;
//! ```

pub mod catalog;
mod claimer;
mod db;
mod error;
mod evaluator;
mod referral;
pub mod reset;
pub mod staking;
mod store;

pub use claimer::{ClaimReceipt, check_claimable};
pub use db::TrackerDb;
pub use error::{Result, TrackerError};
pub use evaluator::{Evaluation, evaluate, validate_increment};
pub use referral::is_well_formed as is_referral_code;
pub use reset::{Clock, ResetCountdown, ResetPolicy};
pub use staking::{StakePayout, Unstaked};
pub use store::{ProgressStore, SqliteStore};

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{
    Definition, DefinitionId, DefinitionKind, NewDefinition, NewProgressRecord, NewVault,
    ProgressRecord, RecordId, Stake, StakeId, User, UserStats, Vault, VaultId,
};
use crate::wallet::WalletAddress;

/// A progress record together with the definition it tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProgress {
    #[serde(flatten)]
    pub record: ProgressRecord,
    pub definition: Definition,
}

/// An open stake with its vault and the rewards accrued so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedStake {
    #[serde(flatten)]
    pub stake: Stake,
    pub vault: Vault,
    pub pending_rewards: u64,
}

/// Entry point for all progress and reward operations
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct Tracker {
    store: Arc<dyn ProgressStore>,
    policy: ResetPolicy,
    clock: Clock,
}

impl Tracker {
    /// Create a tracker over an existing store
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self {
            store,
            policy: ResetPolicy::default(),
            clock: Clock::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResetPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Open the configured database, seed the catalog and apply the reset policy
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let db = match &config.tracker.database {
            Some(path) => TrackerDb::open(path)?,
            None => TrackerDb::open_default()?,
        };
        let tracker = Self::new(Arc::new(SqliteStore::new(db)))
            .with_policy(config.tracker.reset_policy);

        if !config.catalog.is_empty() {
            tracker
                .seed_catalog(&config.catalog)
                .context("Failed to seed catalog from config")?;
        } else if config.tracker.seed_default_catalog {
            let defaults = catalog::default_catalog(tracker.clock.now_ms());
            tracker
                .seed_catalog(&defaults)
                .context("Failed to seed default catalog")?;
        }

        if !config.vaults.is_empty() {
            tracker
                .seed_vaults(&config.vaults)
                .context("Failed to seed vaults from config")?;
        } else if config.tracker.seed_default_catalog {
            tracker
                .seed_vaults(&staking::default_vaults())
                .context("Failed to seed default vaults")?;
        }

        Ok(tracker)
    }

    /// In-memory tracker with the default catalog
    pub fn in_memory() -> anyhow::Result<Self> {
        let tracker = Self::new(Arc::new(SqliteStore::new(TrackerDb::open_in_memory()?)));
        tracker.seed_catalog(&catalog::default_catalog(tracker.clock.now_ms()))?;
        tracker.seed_vaults(&staking::default_vaults())?;
        Ok(tracker)
    }

    pub fn policy(&self) -> ResetPolicy {
        self.policy
    }

    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    // ========================================
    // CATALOG
    // ========================================

    /// Seed definitions if the catalog is empty
    pub fn seed_catalog(&self, definitions: &[NewDefinition]) -> Result<usize> {
        catalog::seed(self.store.as_ref(), definitions)
    }

    /// All definitions of one kind (active and inactive)
    pub fn definitions(&self, kind: DefinitionKind) -> Result<Vec<Definition>> {
        self.store.definitions(Some(kind))
    }

    /// One definition, which must be of `kind`
    pub fn definition(&self, kind: DefinitionKind, id: DefinitionId) -> Result<Definition> {
        self.store
            .definition(id)?
            .filter(|d| d.kind == kind)
            .ok_or(TrackerError::DefinitionNotFound(id))
    }

    // ========================================
    // USERS
    // ========================================

    /// Profile of the connected user (created on first sight)
    pub fn user(&self, wallet: &WalletAddress) -> Result<User> {
        self.store.ensure_user(wallet.as_str(), self.clock.now_ms())
    }

    pub fn user_by_referral(&self, code: &str) -> Result<User> {
        let code = code.trim().to_ascii_uppercase();
        if !referral::is_well_formed(&code) {
            return Err(TrackerError::UserNotFound(code));
        }
        self.store
            .user_by_referral(&code)?
            .ok_or(TrackerError::UserNotFound(code))
    }

    pub fn stats(&self, wallet: &WalletAddress) -> Result<UserStats> {
        self.user(wallet)?;
        self.store.stats(wallet.as_str())
    }

    /// Count one trivia answer and return the updated stats
    pub fn record_trivia(&self, wallet: &WalletAddress, correct: bool) -> Result<UserStats> {
        self.user(wallet)?;
        self.store.record_trivia(wallet.as_str(), correct)?;
        self.store.stats(wallet.as_str())
    }

    // ========================================
    // PROGRESS
    // ========================================

    /// Current-period progress for one catalog kind.
    ///
    /// If the user has no records for this kind in the current period, one
    /// record per active definition is created first.
    pub fn progress(
        &self,
        wallet: &WalletAddress,
        kind: DefinitionKind,
    ) -> Result<Vec<TrackedProgress>> {
        let now_ms = self.clock.now_ms();
        self.store.ensure_user(wallet.as_str(), now_ms)?;

        let period = reset::period_key(kind, self.policy, self.clock.now());
        let mut records = self.store.records(wallet.as_str(), kind, &period)?;

        if records.is_empty() {
            let definitions = self.store.definitions(Some(kind))?;
            for definition in definitions.iter().filter(|d| d.active) {
                self.store
                    .create_record(&self.new_record(wallet, definition, &period), now_ms)?;
            }
            records = self.store.records(wallet.as_str(), kind, &period)?;
            info!(
                "[slerfhub:tracker] Initialized {} {} records for {} (period {})",
                records.len(),
                kind,
                wallet,
                period
            );
        }

        records
            .into_iter()
            .map(|record| {
                let definition = self
                    .store
                    .definition(record.definition_id)?
                    .ok_or(TrackerError::DefinitionNotFound(record.definition_id))?;
                Ok(TrackedProgress { record, definition })
            })
            .collect()
    }

    /// Start tracking one definition for the user (idempotent)
    pub fn init_progress(
        &self,
        wallet: &WalletAddress,
        kind: DefinitionKind,
        definition_id: DefinitionId,
    ) -> Result<ProgressRecord> {
        let now_ms = self.clock.now_ms();
        let definition = self.definition(kind, definition_id)?;
        self.store.ensure_user(wallet.as_str(), now_ms)?;

        let period = reset::period_key(kind, self.policy, self.clock.now());
        let (record, created) = self
            .store
            .create_record(&self.new_record(wallet, &definition, &period), now_ms)?;
        if created {
            debug!(
                "[slerfhub:tracker] Tracking {} #{} for {} (record #{})",
                kind, definition_id, wallet, record.id
            );
        }
        Ok(record)
    }

    fn new_record(
        &self,
        wallet: &WalletAddress,
        definition: &Definition,
        period: &str,
    ) -> NewProgressRecord {
        NewProgressRecord {
            wallet_address: wallet.as_str().to_string(),
            definition_id: definition.id,
            kind: definition.kind,
            period: period.to_string(),
            progress_max: definition.progress_max(),
        }
    }

    fn owned_record(&self, wallet: &WalletAddress, id: RecordId) -> Result<ProgressRecord> {
        let record = self
            .store
            .record(id)?
            .ok_or(TrackerError::RecordNotFound(id))?;
        if record.wallet_address != wallet.as_str() {
            return Err(TrackerError::NotOwner(id));
        }
        Ok(record)
    }

    /// Add `delta` to a record's progress (clamped at its max)
    pub fn increment(
        &self,
        wallet: &WalletAddress,
        id: RecordId,
        delta: i64,
    ) -> Result<ProgressRecord> {
        let delta = validate_increment(delta)?;
        let record = self.owned_record(wallet, id)?;

        let evaluation = evaluate(record.progress, record.progress_max, delta);
        if evaluation.progress == record.progress {
            return Ok(record);
        }

        let updated = self
            .store
            .save_progress(id, evaluation.progress, self.clock.now_ms())?;
        if evaluation.just_completed && updated.completed {
            info!(
                "[slerfhub:tracker] {} completed {} #{} (record #{})",
                wallet, updated.kind, updated.definition_id, id
            );
        }
        Ok(updated)
    }

    /// Claim the reward of a completed record, exactly once
    pub fn claim(&self, wallet: &WalletAddress, id: RecordId) -> Result<ClaimReceipt> {
        let receipt = self.store.claim(id, wallet.as_str(), self.clock.now_ms())?;
        info!(
            "[slerfhub:tracker] {} claimed {} for record #{} (balance {})",
            wallet, receipt.reward, id, receipt.balance
        );
        Ok(receipt)
    }

    /// Countdown to the next daily and weekly boundary
    pub fn countdown(&self) -> ResetCountdown {
        ResetCountdown::at(self.clock.now())
    }

    // ========================================
    // STAKING
    // ========================================

    /// Seed vaults if none exist
    pub fn seed_vaults(&self, vaults: &[NewVault]) -> Result<usize> {
        staking::seed(self.store.as_ref(), vaults)
    }

    pub fn vaults(&self) -> Result<Vec<Vault>> {
        self.store.vaults()
    }

    pub fn vault(&self, id: VaultId) -> Result<Vault> {
        self.store.vault(id)?.ok_or(TrackerError::VaultNotFound(id))
    }

    /// Open stakes of the user, with rewards accrued up to now
    pub fn stakes(&self, wallet: &WalletAddress) -> Result<Vec<TrackedStake>> {
        self.user(wallet)?;
        let now_ms = self.clock.now_ms();
        self.store
            .stakes(wallet.as_str())?
            .into_iter()
            .map(|stake| self.track_stake(stake, now_ms))
            .collect()
    }

    fn track_stake(&self, stake: Stake, now_ms: i64) -> Result<TrackedStake> {
        let vault = self.vault(stake.vault_id)?;
        let pending_rewards = stake.pending_rewards(vault.apr, now_ms);
        Ok(TrackedStake {
            stake,
            vault,
            pending_rewards,
        })
    }

    /// Lock `amount` of the user's balance in a vault
    pub fn stake(
        &self,
        wallet: &WalletAddress,
        vault_id: VaultId,
        amount: i64,
    ) -> Result<TrackedStake> {
        let amount = staking::validate_amount(amount)?;
        let now_ms = self.clock.now_ms();
        self.store.ensure_user(wallet.as_str(), now_ms)?;

        let stake = self
            .store
            .open_stake(wallet.as_str(), vault_id, amount, now_ms)?;
        info!(
            "[slerfhub:tracker] {} staked {} in vault #{} (stake #{})",
            wallet, amount, vault_id, stake.id
        );
        self.track_stake(stake, now_ms)
    }

    /// Pay out the rewards a stake has accrued since its last claim
    pub fn claim_stake(&self, wallet: &WalletAddress, id: StakeId) -> Result<StakePayout> {
        let payout = self
            .store
            .claim_stake_rewards(id, wallet.as_str(), self.clock.now_ms())?;
        info!(
            "[slerfhub:tracker] {} claimed {} staking rewards from stake #{} (balance {})",
            wallet, payout.rewards, id, payout.balance
        );
        Ok(payout)
    }

    /// Close a stake, returning principal plus pending rewards
    pub fn unstake(&self, wallet: &WalletAddress, id: StakeId) -> Result<Unstaked> {
        let unstaked = self
            .store
            .close_stake(id, wallet.as_str(), self.clock.now_ms())?;
        info!(
            "[slerfhub:tracker] {} unstaked {} (+{} rewards) from stake #{}",
            wallet, unstaked.amount, unstaked.rewards, id
        );
        Ok(unstaked)
    }
}
