//! SQLite database connection and schema management for the rewards tracker
//!
//! Manages the `~/.slerfhub/rewards.db` database. The schema is created on open.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::error::TrackerError;
use crate::config::Config;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Shared database handle
#[derive(Clone)]
pub struct TrackerDb {
    conn: Arc<Mutex<Connection>>,
}

impl TrackerDb {
    /// Open or create the database at the default location (~/.slerfhub/rewards.db)
    pub fn open_default() -> Result<Self> {
        let db_path = Config::global_config_dir().join("rewards.db");
        Self::open(&db_path)
    }

    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create db dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open rewards db: {}", path.display()))?;

        // WAL so a second process (e.g. `slerfhub status`) can read while the server writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize rewards schema")?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Lock the connection
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, TrackerError> {
        self.conn
            .lock()
            .map_err(|_| TrackerError::Internal("rewards db lock poisoned".to_string()))
    }
}

/// SQL schema for the rewards database
const SCHEMA_SQL: &str = r#"
-- Users, keyed by wallet address
CREATE TABLE IF NOT EXISTS users (
    wallet_address TEXT PRIMARY KEY,
    balance INTEGER NOT NULL DEFAULT 0,
    total_earned INTEGER NOT NULL DEFAULT 0,
    referral_code TEXT NOT NULL UNIQUE,
    tier TEXT NOT NULL DEFAULT 'bronze',
    trivia_correct INTEGER NOT NULL DEFAULT 0,
    trivia_total INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

-- Mission / quest catalog
CREATE TABLE IF NOT EXISTS definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL CHECK (kind IN ('mission', 'quest')),
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    reward INTEGER NOT NULL CHECK (reward >= 0),
    icon TEXT NOT NULL DEFAULT '',
    requirement TEXT NOT NULL,          -- JSON, tagged by "type"
    active INTEGER NOT NULL DEFAULT 1,
    expires_at INTEGER
);
CREATE INDEX IF NOT EXISTS idx_definitions_kind ON definitions(kind);

-- Per-user progress, one row per (wallet, definition, period)
CREATE TABLE IF NOT EXISTS progress (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    wallet_address TEXT NOT NULL REFERENCES users(wallet_address),
    definition_id INTEGER NOT NULL REFERENCES definitions(id),
    kind TEXT NOT NULL,
    period TEXT NOT NULL,
    progress INTEGER NOT NULL DEFAULT 0 CHECK (progress <= progress_max),
    progress_max INTEGER NOT NULL CHECK (progress_max >= 1),
    completed INTEGER NOT NULL DEFAULT 0,
    claimed INTEGER NOT NULL DEFAULT 0 CHECK (claimed = 0 OR completed = 1),
    last_updated INTEGER NOT NULL,
    UNIQUE (wallet_address, definition_id, period)
);
CREATE INDEX IF NOT EXISTS idx_progress_wallet ON progress(wallet_address, kind, period);

-- Claim ledger: at most one claim per progress record
CREATE TABLE IF NOT EXISTS claims (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    progress_id INTEGER NOT NULL UNIQUE REFERENCES progress(id),
    wallet_address TEXT NOT NULL,
    reward INTEGER NOT NULL,
    claimed_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_claims_wallet ON claims(wallet_address);

-- Staking vaults
CREATE TABLE IF NOT EXISTS vaults (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    apr INTEGER NOT NULL CHECK (apr >= 0),
    min_stake INTEGER NOT NULL CHECK (min_stake >= 0),
    icon TEXT NOT NULL DEFAULT ''
);

-- Open stakes; a stake row is deleted when unstaked
CREATE TABLE IF NOT EXISTS stakes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    wallet_address TEXT NOT NULL REFERENCES users(wallet_address),
    vault_id INTEGER NOT NULL REFERENCES vaults(id),
    amount INTEGER NOT NULL CHECK (amount > 0),
    rewards INTEGER NOT NULL DEFAULT 0,
    staked_at INTEGER NOT NULL,
    last_claimed INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_stakes_wallet ON stakes(wallet_address);

-- Schema version
CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
"#;
