//! Wallet identity resolution
//!
//! The tracker never talks to a wallet. It only receives a resolved
//! [`WalletAddress`] from a [`WalletProvider`]. The HTTP server uses
//! [`HeaderWalletProvider`] (address presented by the front-end after
//! the wallet UI connected). `slerfhub status --wallet` wraps its argument
//! in a [`StaticWalletProvider`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tracker::TrackerError;

static EVM_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"));

// Base58 alphabet (no 0, O, I, l)
static SOLANA_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").expect("static regex"));

/// Chain family an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Evm,
    Solana,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evm => "evm",
            Self::Solana => "solana",
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated wallet address, used as the user identity key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress {
    address: String,
    chain: Chain,
}

impl WalletAddress {
    /// Validate and normalize an address.
    ///
    /// EVM addresses are lowercased so checksum casing maps to one user.
    /// Solana addresses are case-sensitive and kept as-is.
    pub fn parse(raw: &str) -> Result<Self, TrackerError> {
        let trimmed = raw.trim();
        if EVM_ADDRESS.is_match(trimmed) {
            return Ok(Self {
                address: trimmed.to_ascii_lowercase(),
                chain: Chain::Evm,
            });
        }
        if SOLANA_ADDRESS.is_match(trimmed) {
            return Ok(Self {
                address: trimmed.to_string(),
                chain: Chain::Solana,
            });
        }
        Err(TrackerError::InvalidWallet(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.address)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.address
    }
}

/// Resolves the connected user's identity
pub trait WalletProvider: Send + Sync {
    /// Resolve the connected wallet from what the caller presented
    /// (e.g. a request header). `None` means nothing was presented.
    fn resolve(&self, presented: Option<&str>) -> Result<WalletAddress, TrackerError>;
}

/// Takes the address the client presents (e.g. `X-Wallet-Address`)
#[derive(Debug, Clone, Default)]
pub struct HeaderWalletProvider;

impl WalletProvider for HeaderWalletProvider {
    fn resolve(&self, presented: Option<&str>) -> Result<WalletAddress, TrackerError> {
        match presented.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => WalletAddress::parse(raw),
            None => Err(TrackerError::NotConnected),
        }
    }
}

/// Always resolves to one configured address (CLI usage)
#[derive(Debug, Clone)]
pub struct StaticWalletProvider {
    address: WalletAddress,
}

impl StaticWalletProvider {
    pub fn new(address: WalletAddress) -> Self {
        Self { address }
    }
}

impl WalletProvider for StaticWalletProvider {
    fn resolve(&self, _presented: Option<&str>) -> Result<WalletAddress, TrackerError> {
        Ok(self.address.clone())
    }
}
