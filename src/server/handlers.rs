//! HTTP request handlers for the rewards API

use tiny_http::Request;
use tracing::{debug, warn};

use super::types::{ApiState, IncrementRequest, ReferralLookup, StakeRequest, TriviaRequest};
use super::{parse_id_from_path, respond_error, respond_json, wallet_header};
use crate::domain::DefinitionKind;
use crate::tracker::TrackerError;
use crate::wallet::WalletAddress;

/// Resolve the connected wallet or answer 401/400 and return `None`
fn connected_wallet(state: &ApiState, request: Request) -> Option<(WalletAddress, Request)> {
    let presented = wallet_header(&request);
    match state.wallets.resolve(presented.as_deref()) {
        Ok(wallet) => Some((wallet, request)),
        Err(err) => {
            respond_error(request, &err);
            None
        }
    }
}

/// GET /api/missions, GET /api/quests
pub fn handle_definitions_list(state: &ApiState, kind: DefinitionKind, request: Request) {
    match state.tracker.definitions(kind) {
        Ok(definitions) => respond_json(request, 200, serde_json::json!(definitions)),
        Err(err) => respond_error(request, &err),
    }
}

/// GET /api/missions/{id}, GET /api/quests/{id}
pub fn handle_definition_get(state: &ApiState, kind: DefinitionKind, path: &str, request: Request) {
    let id = match parse_id_from_path(path, None) {
        Ok(id) => id,
        Err(err) => {
            respond_json(request, 400, serde_json::json!({ "error": err }));
            return;
        }
    };
    match state.tracker.definition(kind, id) {
        Ok(definition) => respond_json(request, 200, serde_json::json!(definition)),
        Err(err) => respond_error(request, &err),
    }
}

/// GET /api/user
pub fn handle_user_get(state: &ApiState, request: Request) {
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    match state.tracker.user(&wallet) {
        Ok(user) => respond_json(request, 200, serde_json::json!(user)),
        Err(err) => respond_error(request, &err),
    }
}

/// GET /api/user/stats
pub fn handle_user_stats(state: &ApiState, request: Request) {
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    match state.tracker.stats(&wallet) {
        Ok(stats) => respond_json(request, 200, serde_json::json!(stats)),
        Err(err) => respond_error(request, &err),
    }
}

/// GET /api/user/missions, GET /api/user/quests
pub fn handle_user_progress_list(state: &ApiState, kind: DefinitionKind, request: Request) {
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    match state.tracker.progress(&wallet, kind) {
        Ok(progress) => respond_json(request, 200, serde_json::json!(progress)),
        Err(err) => respond_error(request, &err),
    }
}

/// POST /api/user/missions/{id}/progress, POST /api/user/quests/{id}/progress
pub fn handle_user_progress_init(
    state: &ApiState,
    kind: DefinitionKind,
    path: &str,
    request: Request,
) {
    let definition_id = match parse_id_from_path(path, Some("progress")) {
        Ok(id) => id,
        Err(err) => {
            respond_json(request, 400, serde_json::json!({ "error": err }));
            return;
        }
    };
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    match state.tracker.init_progress(&wallet, kind, definition_id) {
        Ok(record) => respond_json(request, 201, serde_json::json!(record)),
        Err(err) => respond_error(request, &err),
    }
}

/// PUT /api/user/progress/{record_id}
pub fn handle_progress_update(state: &ApiState, path: &str, body: &str, request: Request) {
    let record_id = match parse_id_from_path(path, None) {
        Ok(id) => id,
        Err(err) => {
            respond_json(request, 400, serde_json::json!({ "error": err }));
            return;
        }
    };
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };

    let delta = match parse_increment(body) {
        Ok(delta) => delta,
        Err(err) => {
            debug!("[slerfhub:http] Rejected increment body: {}", err);
            respond_error(request, &err);
            return;
        }
    };

    match state.tracker.increment(&wallet, record_id, delta) {
        Ok(record) => respond_json(request, 200, serde_json::json!(record)),
        Err(err) => respond_error(request, &err),
    }
}

fn parse_increment(body: &str) -> Result<i64, TrackerError> {
    let parsed: IncrementRequest = serde_json::from_str(body)
        .map_err(|e| TrackerError::InvalidIncrement(format!("bad body: {e}")))?;
    match &parsed.increment {
        serde_json::Value::Null => Err(TrackerError::InvalidIncrement(
            "missing increment".to_string(),
        )),
        value => value
            .as_i64()
            .ok_or_else(|| TrackerError::InvalidIncrement(format!("not an integer: {value}"))),
    }
}

/// POST /api/user/progress/{record_id}/claim
pub fn handle_progress_claim(state: &ApiState, path: &str, request: Request) {
    let record_id = match parse_id_from_path(path, Some("claim")) {
        Ok(id) => id,
        Err(err) => {
            respond_json(request, 400, serde_json::json!({ "error": err }));
            return;
        }
    };
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    match state.tracker.claim(&wallet, record_id) {
        Ok(receipt) => respond_json(request, 200, serde_json::json!(receipt)),
        Err(err) => {
            if matches!(err, TrackerError::AlreadyClaimed(_)) {
                warn!(
                    "[slerfhub:http] Duplicate claim for record #{} by {}",
                    record_id, wallet
                );
            }
            respond_error(request, &err)
        }
    }
}

/// GET /api/vaults
pub fn handle_vaults_list(state: &ApiState, request: Request) {
    match state.tracker.vaults() {
        Ok(vaults) => respond_json(request, 200, serde_json::json!(vaults)),
        Err(err) => respond_error(request, &err),
    }
}

/// GET /api/vaults/{id}
pub fn handle_vault_get(state: &ApiState, path: &str, request: Request) {
    let id = match parse_id_from_path(path, None) {
        Ok(id) => id,
        Err(err) => {
            respond_json(request, 400, serde_json::json!({ "error": err }));
            return;
        }
    };
    match state.tracker.vault(id) {
        Ok(vault) => respond_json(request, 200, serde_json::json!(vault)),
        Err(err) => respond_error(request, &err),
    }
}

/// GET /api/user/stakes
pub fn handle_user_stakes(state: &ApiState, request: Request) {
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    match state.tracker.stakes(&wallet) {
        Ok(stakes) => respond_json(request, 200, serde_json::json!(stakes)),
        Err(err) => respond_error(request, &err),
    }
}

/// POST /api/user/stakes
pub fn handle_stake_open(state: &ApiState, body: &str, request: Request) {
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    let stake = match serde_json::from_str::<StakeRequest>(body) {
        Ok(stake) => stake,
        Err(e) => {
            respond_json(
                request,
                400,
                serde_json::json!({ "error": "bad_request", "message": e.to_string() }),
            );
            return;
        }
    };
    match state.tracker.stake(&wallet, stake.vault_id, stake.amount) {
        Ok(stake) => respond_json(request, 201, serde_json::json!(stake)),
        Err(err) => respond_error(request, &err),
    }
}

/// POST /api/user/stakes/{stake_id}/claim
pub fn handle_stake_claim(state: &ApiState, path: &str, request: Request) {
    let stake_id = match parse_id_from_path(path, Some("claim")) {
        Ok(id) => id,
        Err(err) => {
            respond_json(request, 400, serde_json::json!({ "error": err }));
            return;
        }
    };
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    match state.tracker.claim_stake(&wallet, stake_id) {
        Ok(payout) => respond_json(request, 200, serde_json::json!(payout)),
        Err(err) => respond_error(request, &err),
    }
}

/// POST /api/user/stakes/{stake_id}/unstake
pub fn handle_unstake(state: &ApiState, path: &str, request: Request) {
    let stake_id = match parse_id_from_path(path, Some("unstake")) {
        Ok(id) => id,
        Err(err) => {
            respond_json(request, 400, serde_json::json!({ "error": err }));
            return;
        }
    };
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    match state.tracker.unstake(&wallet, stake_id) {
        Ok(unstaked) => respond_json(request, 200, serde_json::json!(unstaked)),
        Err(err) => respond_error(request, &err),
    }
}

/// POST /api/user/trivia
pub fn handle_trivia(state: &ApiState, body: &str, request: Request) {
    let Some((wallet, request)) = connected_wallet(state, request) else {
        return;
    };
    let answer = match serde_json::from_str::<TriviaRequest>(body) {
        Ok(answer) => answer,
        Err(e) => {
            respond_json(
                request,
                400,
                serde_json::json!({ "error": "bad_request", "message": e.to_string() }),
            );
            return;
        }
    };
    match state.tracker.record_trivia(&wallet, answer.correct) {
        Ok(stats) => respond_json(request, 200, serde_json::json!(stats)),
        Err(err) => respond_error(request, &err),
    }
}

/// GET /api/users/referral/{code}
pub fn handle_referral_lookup(state: &ApiState, path: &str, request: Request) {
    let code = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    match state.tracker.user_by_referral(code) {
        Ok(user) => respond_json(request, 200, serde_json::json!(ReferralLookup::from(user))),
        Err(err) => respond_error(request, &err),
    }
}

/// GET /api/reset
pub fn handle_reset_countdown(state: &ApiState, request: Request) {
    respond_json(request, 200, serde_json::json!(state.tracker.countdown()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_increment() {
        assert_eq!(parse_increment(r#"{"increment": 2}"#).unwrap(), 2);
        assert_eq!(parse_increment(r#"{"increment": -1}"#).unwrap(), -1);
        for bad in [
            r#"{"increment": "two"}"#,
            r#"{"increment": 1.5}"#,
            r#"{}"#,
            "not json",
        ] {
            assert!(
                matches!(parse_increment(bad), Err(TrackerError::InvalidIncrement(_))),
                "{bad}"
            );
        }
    }
}
