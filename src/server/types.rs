//! Shared state and request/response bodies for the rewards API

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{Tier, User, VaultId};
use crate::tracker::Tracker;
use crate::wallet::WalletProvider;

/// State shared by every request
#[derive(Clone)]
pub struct ApiState {
    pub tracker: Tracker,
    pub wallets: Arc<dyn WalletProvider>,
    /// Expected `X-SlerfHub-Token` value; `None` or empty disables the check
    pub auth_token: Option<String>,
}

impl ApiState {
    pub fn new(tracker: Tracker, wallets: Arc<dyn WalletProvider>) -> Self {
        Self {
            tracker,
            wallets,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = (!token.trim().is_empty()).then_some(token);
        self
    }
}

/// PUT /api/user/progress/{id}
///
/// `increment` stays untyped so a non-numeric value maps to
/// `invalid_increment` instead of a generic JSON error.
#[derive(Debug, Clone, Deserialize)]
pub struct IncrementRequest {
    #[serde(default)]
    pub increment: serde_json::Value,
}

/// POST /api/user/stakes
///
/// `amount` is signed so a negative value maps to `invalid_amount`.
#[derive(Debug, Clone, Deserialize)]
pub struct StakeRequest {
    pub vault_id: VaultId,
    pub amount: i64,
}

/// POST /api/user/trivia
#[derive(Debug, Clone, Deserialize)]
pub struct TriviaRequest {
    pub correct: bool,
}

/// Public view of a user returned by the referral lookup
#[derive(Debug, Clone, Serialize)]
pub struct ReferralLookup {
    pub wallet_address: String,
    pub referral_code: String,
    pub tier: Tier,
}

impl From<User> for ReferralLookup {
    fn from(user: User) -> Self {
        Self {
            wallet_address: user.wallet_address,
            referral_code: user.referral_code,
            tier: user.tier,
        }
    }
}
