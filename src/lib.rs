//! SlerfHub - rewards tracker for missions and quests
//!
//! Tracks per-wallet progress on daily missions and weekly quests, decides
//! completion against each definition's threshold, and pays out the reward
//! exactly once per completed record.
//!
//! ## Surfaces
//!
//! 1. **Library**: [`tracker::Tracker`] over a pluggable
//!    [`tracker::ProgressStore`] (SQLite by default).
//!
//! 2. **HTTP API**: [`server::HttpServer`], a small JSON service on
//!    localhost. The connected wallet is presented in `X-Wallet-Address`.
//!
//! Balances are off-chain bookkeeping; nothing here signs or submits
//! transactions.

pub mod config;
pub mod domain;
pub mod server;
pub mod tracker;
pub mod wallet;

pub use domain::*;
