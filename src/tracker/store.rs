//! Progress store: repository interface and its SQLite implementation

use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params};

use super::claimer::{ClaimReceipt, check_claimable};
use super::db::TrackerDb;
use super::error::{Result, TrackerError};
use super::referral;
use super::staking::{StakePayout, Unstaked, check_stake_owner, check_stakeable};
use crate::domain::{
    Definition, DefinitionId, DefinitionKind, NewDefinition, NewProgressRecord, NewVault,
    ProgressRecord, RecordId, Requirement, Stake, StakeId, Tier, User, UserStats, Vault, VaultId,
};

/// Persistence interface injected into the [`Tracker`](super::Tracker)
///
/// Implementations must make [`ProgressStore::claim`] exactly-once per record:
/// the claimed flag flip and the balance credit happen together or not at all.
pub trait ProgressStore: Send + Sync {
    // Catalog
    fn definitions(&self, kind: Option<DefinitionKind>) -> Result<Vec<Definition>>;
    fn definition(&self, id: DefinitionId) -> Result<Option<Definition>>;
    fn insert_definition(&self, definition: &NewDefinition) -> Result<Definition>;

    // Users
    /// Return the user, creating it (with a fresh referral code) if unseen
    fn ensure_user(&self, wallet: &str, now_ms: i64) -> Result<User>;
    fn user(&self, wallet: &str) -> Result<Option<User>>;
    fn user_by_referral(&self, code: &str) -> Result<Option<User>>;
    fn record_trivia(&self, wallet: &str, correct: bool) -> Result<()>;
    fn stats(&self, wallet: &str) -> Result<UserStats>;

    // Progress
    fn records(
        &self,
        wallet: &str,
        kind: DefinitionKind,
        period: &str,
    ) -> Result<Vec<ProgressRecord>>;
    fn record(&self, id: RecordId) -> Result<Option<ProgressRecord>>;
    /// Insert a record unless one exists for (wallet, definition, period).
    /// Returns the stored record and whether it was newly created.
    fn create_record(&self, new: &NewProgressRecord, now_ms: i64)
        -> Result<(ProgressRecord, bool)>;
    /// Store a new progress value. The stored value never decreases and
    /// `completed` is recomputed from it.
    fn save_progress(&self, id: RecordId, progress: u64, now_ms: i64) -> Result<ProgressRecord>;
    /// Atomically flip `claimed` and credit the reward
    fn claim(&self, id: RecordId, wallet: &str, now_ms: i64) -> Result<ClaimReceipt>;

    // Staking
    fn vaults(&self) -> Result<Vec<Vault>>;
    fn vault(&self, id: VaultId) -> Result<Option<Vault>>;
    fn insert_vault(&self, vault: &NewVault) -> Result<Vault>;
    fn stakes(&self, wallet: &str) -> Result<Vec<Stake>>;
    /// Debit `amount` from the balance and lock it in the vault
    fn open_stake(&self, wallet: &str, vault_id: VaultId, amount: u64, now_ms: i64)
        -> Result<Stake>;
    /// Credit pending rewards and restart accrual at `now_ms`
    fn claim_stake_rewards(&self, id: StakeId, wallet: &str, now_ms: i64) -> Result<StakePayout>;
    /// Credit principal plus pending rewards and delete the stake
    fn close_stake(&self, id: StakeId, wallet: &str, now_ms: i64) -> Result<Unstaked>;
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteStore {
    db: TrackerDb,
}

impl SqliteStore {
    pub fn new(db: TrackerDb) -> Self {
        Self { db }
    }
}

/// Largest amount an INTEGER column holds
const SQL_INT_MAX: u64 = i64::MAX as u64;

fn to_sql_int(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| TrackerError::Internal(format!("{value} does not fit an INTEGER column")))
}

/// `current + credit`, refused when the users table could not hold it
fn checked_credit(current: u64, credit: u64, what: &str) -> Result<u64> {
    current
        .checked_add(credit)
        .filter(|sum| *sum <= SQL_INT_MAX)
        .ok_or_else(|| {
            TrackerError::BalanceOverflow(format!(
                "{what} {current} + {credit} exceeds {SQL_INT_MAX}"
            ))
        })
}

/// Store balance and total earned, refreshing the tier from the balance
fn write_balance(conn: &Connection, wallet: &str, balance: u64, total_earned: u64) -> Result<()> {
    conn.execute(
        "UPDATE users SET balance = ?1, total_earned = ?2, tier = ?3 WHERE wallet_address = ?4",
        params![
            to_sql_int(balance)?,
            to_sql_int(total_earned)?,
            Tier::for_balance(balance).as_str(),
            wallet,
        ],
    )?;
    Ok(())
}

fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn parse_kind(idx: usize, raw: &str) -> rusqlite::Result<DefinitionKind> {
    DefinitionKind::from_str(raw)
        .ok_or_else(|| conversion_error(idx, format!("unknown kind {raw}")))
}

const DEFINITION_COLUMNS: &str =
    "id, kind, title, description, reward, icon, requirement, active, expires_at";

fn definition_from_row(row: &Row<'_>) -> rusqlite::Result<Definition> {
    let kind: String = row.get(1)?;
    let requirement: String = row.get(6)?;
    let requirement: Requirement = serde_json::from_str(&requirement)
        .map_err(|e| conversion_error(6, format!("bad requirement: {e}")))?;
    Ok(Definition {
        id: row.get(0)?,
        kind: parse_kind(1, &kind)?,
        title: row.get(2)?,
        description: row.get(3)?,
        reward: from_sql_int(row.get(4)?),
        icon: row.get(5)?,
        requirement,
        active: row.get(7)?,
        expires_at: row.get(8)?,
    })
}

const USER_COLUMNS: &str = "wallet_address, balance, total_earned, referral_code, tier, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let tier: String = row.get(4)?;
    let tier =
        Tier::from_str(&tier).ok_or_else(|| conversion_error(4, format!("unknown tier {tier}")))?;
    Ok(User {
        wallet_address: row.get(0)?,
        balance: from_sql_int(row.get(1)?),
        total_earned: from_sql_int(row.get(2)?),
        referral_code: row.get(3)?,
        tier,
        created_at: row.get(5)?,
    })
}

const RECORD_COLUMNS: &str = "id, wallet_address, definition_id, kind, period, progress, \
                              progress_max, completed, claimed, last_updated";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ProgressRecord> {
    let kind: String = row.get(3)?;
    Ok(ProgressRecord {
        id: row.get(0)?,
        wallet_address: row.get(1)?,
        definition_id: row.get(2)?,
        kind: parse_kind(3, &kind)?,
        period: row.get(4)?,
        progress: from_sql_int(row.get(5)?),
        progress_max: from_sql_int(row.get(6)?),
        completed: row.get(7)?,
        claimed: row.get(8)?,
        last_updated: row.get(9)?,
    })
}

const VAULT_COLUMNS: &str = "id, name, description, apr, min_stake, icon";

fn vault_from_row(row: &Row<'_>) -> rusqlite::Result<Vault> {
    Ok(Vault {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        apr: row.get(3)?,
        min_stake: from_sql_int(row.get(4)?),
        icon: row.get(5)?,
    })
}

const STAKE_COLUMNS: &str =
    "id, wallet_address, vault_id, amount, rewards, staked_at, last_claimed";

fn stake_from_row(row: &Row<'_>) -> rusqlite::Result<Stake> {
    Ok(Stake {
        id: row.get(0)?,
        wallet_address: row.get(1)?,
        vault_id: row.get(2)?,
        amount: from_sql_int(row.get(3)?),
        rewards: from_sql_int(row.get(4)?),
        staked_at: row.get(5)?,
        last_claimed: row.get(6)?,
    })
}

fn query_definition(conn: &Connection, id: DefinitionId) -> Result<Option<Definition>> {
    let sql = format!("SELECT {DEFINITION_COLUMNS} FROM definitions WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], definition_from_row).optional()?)
}

fn query_user(conn: &Connection, wallet: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE wallet_address = ?1");
    Ok(conn.query_row(&sql, [wallet], user_from_row).optional()?)
}

fn query_record(conn: &Connection, id: RecordId) -> Result<Option<ProgressRecord>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM progress WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], record_from_row).optional()?)
}

fn query_vault(conn: &Connection, id: VaultId) -> Result<Option<Vault>> {
    let sql = format!("SELECT {VAULT_COLUMNS} FROM vaults WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], vault_from_row).optional()?)
}

fn query_stake(conn: &Connection, id: StakeId) -> Result<Option<Stake>> {
    let sql = format!("SELECT {STAKE_COLUMNS} FROM stakes WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], stake_from_row).optional()?)
}

/// Stake owned by `wallet` together with the vault it sits in
fn owned_stake(conn: &Connection, id: StakeId, wallet: &str) -> Result<(Stake, Vault)> {
    let stake = query_stake(conn, id)?.ok_or(TrackerError::StakeNotFound(id))?;
    check_stake_owner(&stake, wallet)?;
    let vault = query_vault(conn, stake.vault_id)?
        .ok_or(TrackerError::VaultNotFound(stake.vault_id))?;
    Ok((stake, vault))
}

fn count(conn: &Connection, sql: &str, wallet: &str) -> Result<u64> {
    let n: i64 = conn.query_row(sql, [wallet], |r| r.get(0))?;
    Ok(from_sql_int(n))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

impl ProgressStore for SqliteStore {
    fn definitions(&self, kind: Option<DefinitionKind>) -> Result<Vec<Definition>> {
        let conn = self.db.conn()?;
        let definitions = match kind {
            Some(kind) => {
                let sql = format!(
                    "SELECT {DEFINITION_COLUMNS} FROM definitions WHERE kind = ?1 ORDER BY id"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([kind.as_str()], definition_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!("SELECT {DEFINITION_COLUMNS} FROM definitions ORDER BY id");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], definition_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(definitions)
    }

    fn definition(&self, id: DefinitionId) -> Result<Option<Definition>> {
        let conn = self.db.conn()?;
        query_definition(&conn, id)
    }

    fn insert_definition(&self, definition: &NewDefinition) -> Result<Definition> {
        if definition.reward > SQL_INT_MAX {
            return Err(TrackerError::InvalidDefinition(format!(
                "{}: reward {} exceeds {SQL_INT_MAX}",
                definition.title, definition.reward
            )));
        }
        if definition.requirement.progress_max() > SQL_INT_MAX {
            return Err(TrackerError::InvalidDefinition(format!(
                "{}: requirement target exceeds {SQL_INT_MAX}",
                definition.title
            )));
        }
        let requirement = serde_json::to_string(&definition.requirement)
            .map_err(|e| TrackerError::Internal(format!("serialize requirement: {e}")))?;
        let conn = self.db.conn()?;
        conn.execute(
            r#"
            INSERT INTO definitions (kind, title, description, reward, icon, requirement, active, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                definition.kind.as_str(),
                definition.title,
                definition.description,
                to_sql_int(definition.reward)?,
                definition.icon,
                requirement,
                definition.active,
                definition.expires_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        query_definition(&conn, id)?.ok_or(TrackerError::DefinitionNotFound(id))
    }

    fn ensure_user(&self, wallet: &str, now_ms: i64) -> Result<User> {
        // Retry on the (unlikely) referral code collision
        for _ in 0..5 {
            let conn = self.db.conn()?;
            if let Some(user) = query_user(&conn, wallet)? {
                return Ok(user);
            }
            let code = referral::generate_code()?;
            match conn.execute(
                "INSERT INTO users (wallet_address, referral_code, created_at) VALUES (?1, ?2, ?3)",
                params![wallet, code, now_ms],
            ) {
                Ok(_) => {
                    tracing::debug!("[slerfhub:store] New user {} (referral {})", wallet, code);
                }
                Err(e) if is_constraint_violation(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let conn = self.db.conn()?;
        query_user(&conn, wallet)?.ok_or_else(|| {
            TrackerError::Internal(format!("could not create user {wallet}"))
        })
    }

    fn user(&self, wallet: &str) -> Result<Option<User>> {
        let conn = self.db.conn()?;
        query_user(&conn, wallet)
    }

    fn user_by_referral(&self, code: &str) -> Result<Option<User>> {
        let conn = self.db.conn()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE referral_code = ?1");
        Ok(conn.query_row(&sql, [code], user_from_row).optional()?)
    }

    fn record_trivia(&self, wallet: &str, correct: bool) -> Result<()> {
        let conn = self.db.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE users SET trivia_total = trivia_total + 1,
                             trivia_correct = trivia_correct + ?1
            WHERE wallet_address = ?2
            "#,
            params![i64::from(correct), wallet],
        )?;
        if changed == 0 {
            return Err(TrackerError::UserNotFound(wallet.to_string()));
        }
        Ok(())
    }

    fn stats(&self, wallet: &str) -> Result<UserStats> {
        let conn = self.db.conn()?;
        let base = conn
            .query_row(
                "SELECT balance, total_earned, trivia_correct, trivia_total FROM users WHERE wallet_address = ?1",
                [wallet],
                |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, i64>(1)?,
                        r.get::<_, i64>(2)?,
                        r.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| TrackerError::UserNotFound(wallet.to_string()))?;

        let mut stmt = conn.prepare("SELECT amount FROM stakes WHERE wallet_address = ?1")?;
        let staked = stmt
            .query_map([wallet], |r| r.get::<_, i64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
            .into_iter()
            .fold(0u64, |sum, amount| sum.saturating_add(from_sql_int(amount)));

        Ok(UserStats {
            balance: from_sql_int(base.0),
            total_earned: from_sql_int(base.1),
            staked,
            missions_completed: count(
                &conn,
                "SELECT COUNT(*) FROM progress WHERE wallet_address = ?1 AND kind = 'mission' AND completed = 1",
                wallet,
            )?,
            quests_completed: count(
                &conn,
                "SELECT COUNT(*) FROM progress WHERE wallet_address = ?1 AND kind = 'quest' AND completed = 1",
                wallet,
            )?,
            rewards_claimed: count(
                &conn,
                "SELECT COUNT(*) FROM claims WHERE wallet_address = ?1",
                wallet,
            )?,
            trivia_correct: from_sql_int(base.2),
            trivia_total: from_sql_int(base.3),
        })
    }

    fn records(
        &self,
        wallet: &str,
        kind: DefinitionKind,
        period: &str,
    ) -> Result<Vec<ProgressRecord>> {
        let conn = self.db.conn()?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM progress \
             WHERE wallet_address = ?1 AND kind = ?2 AND period = ?3 ORDER BY definition_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![wallet, kind.as_str(), period], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn record(&self, id: RecordId) -> Result<Option<ProgressRecord>> {
        let conn = self.db.conn()?;
        query_record(&conn, id)
    }

    fn create_record(
        &self,
        new: &NewProgressRecord,
        now_ms: i64,
    ) -> Result<(ProgressRecord, bool)> {
        let conn = self.db.conn()?;
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO progress
                (wallet_address, definition_id, kind, period, progress, progress_max, completed, claimed, last_updated)
            VALUES (?1, ?2, ?3, ?4, 0, ?5, 0, 0, ?6)
            "#,
            params![
                new.wallet_address,
                new.definition_id,
                new.kind.as_str(),
                new.period,
                to_sql_int(new.progress_max.max(1))?,
                now_ms,
            ],
        )?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM progress \
             WHERE wallet_address = ?1 AND definition_id = ?2 AND period = ?3"
        );
        let record = conn
            .query_row(
                &sql,
                params![new.wallet_address, new.definition_id, new.period],
                record_from_row,
            )
            .optional()?
            .ok_or_else(|| {
                TrackerError::Internal(format!(
                    "progress for definition {} vanished after insert",
                    new.definition_id
                ))
            })?;
        Ok((record, inserted > 0))
    }

    fn save_progress(&self, id: RecordId, progress: u64, now_ms: i64) -> Result<ProgressRecord> {
        let conn = self.db.conn()?;
        // SET expressions see the old row, so both use the same clamped value
        let changed = conn.execute(
            r#"
            UPDATE progress SET
                progress = MAX(progress, MIN(?1, progress_max)),
                completed = (MAX(progress, MIN(?1, progress_max)) >= progress_max),
                last_updated = ?2
            WHERE id = ?3
            "#,
            // MIN against progress_max makes the clamp exact
            params![i64::try_from(progress).unwrap_or(i64::MAX), now_ms, id],
        )?;
        if changed == 0 {
            return Err(TrackerError::RecordNotFound(id));
        }
        query_record(&conn, id)?.ok_or(TrackerError::RecordNotFound(id))
    }

    fn claim(&self, id: RecordId, wallet: &str, now_ms: i64) -> Result<ClaimReceipt> {
        let mut conn = self.db.conn()?;
        // IMMEDIATE takes the write lock up front so another process
        // cannot interleave between the check and the flip
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let record = query_record(&tx, id)?.ok_or(TrackerError::RecordNotFound(id))?;
        check_claimable(&record, wallet)?;
        let definition = query_definition(&tx, record.definition_id)?
            .ok_or(TrackerError::DefinitionNotFound(record.definition_id))?;

        let flipped = tx.execute(
            "UPDATE progress SET claimed = 1, last_updated = ?2 WHERE id = ?1 AND completed = 1 AND claimed = 0",
            params![id, now_ms],
        )?;
        if flipped == 0 {
            return Err(TrackerError::AlreadyClaimed(id));
        }

        match tx.execute(
            "INSERT INTO claims (progress_id, wallet_address, reward, claimed_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, wallet, to_sql_int(definition.reward)?, now_ms],
        ) {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => return Err(TrackerError::AlreadyClaimed(id)),
            Err(e) => return Err(e.into()),
        }

        // An error below drops `tx`, which rolls the flip and the ledger row back
        let user = query_user(&tx, wallet)?
            .ok_or_else(|| TrackerError::UserNotFound(wallet.to_string()))?;
        let balance = checked_credit(user.balance, definition.reward, "balance")?;
        let total_earned = checked_credit(user.total_earned, definition.reward, "total earned")?;
        write_balance(&tx, wallet, balance, total_earned)?;

        let record = query_record(&tx, id)?.ok_or(TrackerError::RecordNotFound(id))?;
        tx.commit()?;

        Ok(ClaimReceipt {
            record,
            reward: definition.reward,
            balance,
        })
    }

    fn vaults(&self) -> Result<Vec<Vault>> {
        let conn = self.db.conn()?;
        let sql = format!("SELECT {VAULT_COLUMNS} FROM vaults ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let vaults = stmt
            .query_map([], vault_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vaults)
    }

    fn vault(&self, id: VaultId) -> Result<Option<Vault>> {
        let conn = self.db.conn()?;
        query_vault(&conn, id)
    }

    fn insert_vault(&self, vault: &NewVault) -> Result<Vault> {
        if vault.min_stake > SQL_INT_MAX {
            return Err(TrackerError::InvalidDefinition(format!(
                "{}: minimum stake {} exceeds {SQL_INT_MAX}",
                vault.name, vault.min_stake
            )));
        }
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO vaults (name, description, apr, min_stake, icon) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                vault.name,
                vault.description,
                vault.apr,
                to_sql_int(vault.min_stake)?,
                vault.icon,
            ],
        )?;
        let id = conn.last_insert_rowid();
        query_vault(&conn, id)?.ok_or(TrackerError::VaultNotFound(id))
    }

    fn stakes(&self, wallet: &str) -> Result<Vec<Stake>> {
        let conn = self.db.conn()?;
        let sql =
            format!("SELECT {STAKE_COLUMNS} FROM stakes WHERE wallet_address = ?1 ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let stakes = stmt
            .query_map([wallet], stake_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stakes)
    }

    fn open_stake(
        &self,
        wallet: &str,
        vault_id: VaultId,
        amount: u64,
        now_ms: i64,
    ) -> Result<Stake> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let vault = query_vault(&tx, vault_id)?.ok_or(TrackerError::VaultNotFound(vault_id))?;
        let user = query_user(&tx, wallet)?
            .ok_or_else(|| TrackerError::UserNotFound(wallet.to_string()))?;
        check_stakeable(&vault, amount, user.balance)?;

        write_balance(&tx, wallet, user.balance - amount, user.total_earned)?;
        tx.execute(
            r#"
            INSERT INTO stakes (wallet_address, vault_id, amount, rewards, staked_at, last_claimed)
            VALUES (?1, ?2, ?3, 0, ?4, ?4)
            "#,
            params![wallet, vault_id, to_sql_int(amount)?, now_ms],
        )?;
        let id = tx.last_insert_rowid();
        let stake = query_stake(&tx, id)?.ok_or(TrackerError::StakeNotFound(id))?;
        tx.commit()?;
        Ok(stake)
    }

    fn claim_stake_rewards(&self, id: StakeId, wallet: &str, now_ms: i64) -> Result<StakePayout> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (stake, vault) = owned_stake(&tx, id, wallet)?;
        let rewards = stake.pending_rewards(vault.apr, now_ms);
        if rewards == 0 {
            return Err(TrackerError::NothingToClaim(id));
        }

        let user = query_user(&tx, wallet)?
            .ok_or_else(|| TrackerError::UserNotFound(wallet.to_string()))?;
        let balance = checked_credit(user.balance, rewards, "balance")?;
        let total_earned = checked_credit(user.total_earned, rewards, "total earned")?;
        let paid = checked_credit(stake.rewards, rewards, "stake rewards")?;
        write_balance(&tx, wallet, balance, total_earned)?;
        tx.execute(
            "UPDATE stakes SET rewards = ?1, last_claimed = ?2 WHERE id = ?3",
            params![to_sql_int(paid)?, now_ms, id],
        )?;

        let stake = query_stake(&tx, id)?.ok_or(TrackerError::StakeNotFound(id))?;
        tx.commit()?;
        Ok(StakePayout {
            stake,
            rewards,
            balance,
        })
    }

    fn close_stake(&self, id: StakeId, wallet: &str, now_ms: i64) -> Result<Unstaked> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let (stake, vault) = owned_stake(&tx, id, wallet)?;
        let rewards = stake.pending_rewards(vault.apr, now_ms);

        let user = query_user(&tx, wallet)?
            .ok_or_else(|| TrackerError::UserNotFound(wallet.to_string()))?;
        let balance = checked_credit(user.balance, stake.amount, "balance")?;
        let balance = checked_credit(balance, rewards, "balance")?;
        let total_earned = checked_credit(user.total_earned, rewards, "total earned")?;
        write_balance(&tx, wallet, balance, total_earned)?;
        tx.execute("DELETE FROM stakes WHERE id = ?1", [id])?;
        tx.commit()?;

        Ok(Unstaked {
            stake_id: id,
            amount: stake.amount,
            rewards,
            balance,
        })
    }
}
