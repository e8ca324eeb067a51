//! HTTP server for the rewards API
//!
//! Listens on localhost:9877 (configurable) and serves JSON:
//! - Catalog: GET /api/missions, /api/quests (+ /{id})
//! - Vaults: GET /api/vaults (+ /{id})
//! - Connected user: /api/user/* (identity from `X-Wallet-Address`)
//! - Public: GET /api/users/referral/{code}, GET /api/reset, GET /api/ping

mod handlers;
mod types;

pub use types::{ApiState, IncrementRequest, ReferralLookup, StakeRequest, TriviaRequest};

use std::io::Read;
use std::thread;

use anyhow::{Result, anyhow};
use tiny_http::{Response, Server};
use tracing::{error, info};

use crate::domain::DefinitionKind;
use crate::tracker::TrackerError;

pub const AUTH_HEADER: &str = "X-SlerfHub-Token";
pub const WALLET_HEADER: &str = "X-Wallet-Address";
const MAX_BODY_BYTES: usize = 64 * 1024; // 64 KiB

/// Bound rewards API server
pub struct HttpServer {
    server: Server,
    state: ApiState,
}

impl HttpServer {
    /// Bind to `addr` (e.g. "127.0.0.1:9877"; port 0 picks a free port)
    pub fn bind(addr: &str, state: ApiState) -> Result<Self> {
        let server =
            Server::http(addr).map_err(|e| anyhow!("Failed to start server on {}: {}", addr, e))?;
        info!(
            "[slerfhub:http] Server listening on http://{} (auth: {})",
            addr,
            if state.auth_token.is_some() { "enabled" } else { "disabled" }
        );
        Ok(Self {
            server,
            state,
        })
    }

    /// Port actually bound
    pub fn local_port(&self) -> Option<u16> {
        self.server.server_addr().to_ip().map(|addr| addr.port())
    }

    /// Serve requests on the current thread until the server is dropped
    pub fn run(self) {
        for request in self.server.incoming_requests() {
            dispatch(&self.state, request);
        }
    }

    /// Serve requests on a background thread
    pub fn spawn(self) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run())
    }
}

/// Route one request
fn dispatch(state: &ApiState, mut request: tiny_http::Request) {
    let method = request.method().to_string();
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or(url.as_str());
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    if !is_authorized(&request, state.auth_token.as_deref()) {
        respond_json(request, 401, serde_json::json!({ "error": "unauthorized" }));
        return;
    }

    match (method.as_str(), path) {
        ("GET", "/api/ping") => {
            respond_json(
                request,
                200,
                serde_json::json!({
                    "status": "ok",
                    "version": env!("CARGO_PKG_VERSION"),
                }),
            );
        }

        // Catalog
        ("GET", "/api/missions") => {
            handlers::handle_definitions_list(state, DefinitionKind::Mission, request);
        }
        ("GET", "/api/quests") => {
            handlers::handle_definitions_list(state, DefinitionKind::Quest, request);
        }
        ("GET", p) if p.starts_with("/api/missions/") => {
            handlers::handle_definition_get(state, DefinitionKind::Mission, p, request);
        }
        ("GET", p) if p.starts_with("/api/quests/") => {
            handlers::handle_definition_get(state, DefinitionKind::Quest, p, request);
        }

        // Connected user
        ("GET", "/api/user") => handlers::handle_user_get(state, request),
        ("GET", "/api/user/stats") => handlers::handle_user_stats(state, request),
        ("GET", "/api/user/missions") => {
            handlers::handle_user_progress_list(state, DefinitionKind::Mission, request);
        }
        ("GET", "/api/user/quests") => {
            handlers::handle_user_progress_list(state, DefinitionKind::Quest, request);
        }
        ("POST", p) if p.starts_with("/api/user/missions/") && p.ends_with("/progress") => {
            handlers::handle_user_progress_init(state, DefinitionKind::Mission, p, request);
        }
        ("POST", p) if p.starts_with("/api/user/quests/") && p.ends_with("/progress") => {
            handlers::handle_user_progress_init(state, DefinitionKind::Quest, p, request);
        }
        ("PUT", p) if p.starts_with("/api/user/progress/") => {
            let body = match read_request_body(&mut request) {
                Ok(body) => body,
                Err(response) => {
                    let _ = request.respond(response);
                    return;
                }
            };
            handlers::handle_progress_update(state, p, &body, request);
        }
        ("POST", p) if p.starts_with("/api/user/progress/") && p.ends_with("/claim") => {
            handlers::handle_progress_claim(state, p, request);
        }
        // Staking
        ("GET", "/api/vaults") => handlers::handle_vaults_list(state, request),
        ("GET", p) if p.starts_with("/api/vaults/") => {
            handlers::handle_vault_get(state, p, request);
        }
        ("GET", "/api/user/stakes") => handlers::handle_user_stakes(state, request),
        ("POST", "/api/user/stakes") => {
            let body = match read_request_body(&mut request) {
                Ok(body) => body,
                Err(response) => {
                    let _ = request.respond(response);
                    return;
                }
            };
            handlers::handle_stake_open(state, &body, request);
        }
        ("POST", p) if p.starts_with("/api/user/stakes/") && p.ends_with("/claim") => {
            handlers::handle_stake_claim(state, p, request);
        }
        ("POST", p) if p.starts_with("/api/user/stakes/") && p.ends_with("/unstake") => {
            handlers::handle_unstake(state, p, request);
        }

        ("POST", "/api/user/trivia") => {
            let body = match read_request_body(&mut request) {
                Ok(body) => body,
                Err(response) => {
                    let _ = request.respond(response);
                    return;
                }
            };
            handlers::handle_trivia(state, &body, request);
        }

        // Public
        ("GET", p) if p.starts_with("/api/users/referral/") => {
            handlers::handle_referral_lookup(state, p, request);
        }
        ("GET", "/api/reset") => handlers::handle_reset_countdown(state, request),

        _ => {
            respond_json(request, 404, serde_json::json!({ "error": "not_found" }));
        }
    }
}

fn is_authorized(request: &tiny_http::Request, expected: Option<&str>) -> bool {
    let Some(expected) = expected.filter(|t| !t.trim().is_empty()) else {
        return true;
    };

    header_value(request, AUTH_HEADER)
        .map(|value| value == expected)
        .unwrap_or(false)
}

fn header_value(request: &tiny_http::Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

pub(crate) fn wallet_header(request: &tiny_http::Request) -> Option<String> {
    header_value(request, WALLET_HEADER)
}

fn json_content_type() -> tiny_http::Header {
    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header")
}

fn read_request_body(
    request: &mut tiny_http::Request,
) -> Result<String, Response<std::io::Cursor<Vec<u8>>>> {
    let mut body = String::new();
    let mut reader = request.as_reader().take((MAX_BODY_BYTES + 1) as u64);
    if let Err(e) = reader.read_to_string(&mut body) {
        error!("[slerfhub:http] Failed to read body: {}", e);
        let response = Response::from_string("{\"error\":\"bad_request\"}")
            .with_status_code(400)
            .with_header(json_content_type());
        return Err(response);
    }

    if body.len() > MAX_BODY_BYTES {
        let response = Response::from_string("{\"error\":\"payload_too_large\"}")
            .with_status_code(413)
            .with_header(json_content_type());
        return Err(response);
    }

    Ok(body)
}

pub(crate) fn respond_json(
    request: tiny_http::Request,
    status_code: u16,
    value: serde_json::Value,
) {
    let body =
        serde_json::to_string(&value).unwrap_or_else(|_| "{\"error\":\"serialize\"}".to_string());
    let response = Response::from_string(body)
        .with_status_code(status_code)
        .with_header(json_content_type());
    let _ = request.respond(response);
}

/// HTTP status for a tracker error
pub fn status_for(err: &TrackerError) -> u16 {
    match err {
        TrackerError::InvalidWallet(_)
        | TrackerError::InvalidIncrement(_)
        | TrackerError::InvalidDefinition(_)
        | TrackerError::InvalidAmount(_)
        | TrackerError::BelowMinimumStake(_) => 400,
        TrackerError::NotConnected => 401,
        TrackerError::NotOwner(_) | TrackerError::NotStakeOwner(_) => 403,
        TrackerError::RecordNotFound(_)
        | TrackerError::DefinitionNotFound(_)
        | TrackerError::UserNotFound(_)
        | TrackerError::VaultNotFound(_)
        | TrackerError::StakeNotFound(_) => 404,
        TrackerError::NotCompleted(_)
        | TrackerError::AlreadyClaimed(_)
        | TrackerError::BalanceOverflow(_)
        | TrackerError::InsufficientBalance { .. }
        | TrackerError::NothingToClaim(_) => 409,
        TrackerError::Storage(_) | TrackerError::Internal(_) => 500,
    }
}

/// Answer with the error's status and code; internals are logged, not sent
pub(crate) fn respond_error(request: tiny_http::Request, err: &TrackerError) {
    let status = status_for(err);
    let body = if err.is_user_facing() {
        serde_json::json!({ "error": err.code(), "message": err.to_string() })
    } else {
        error!("[slerfhub:http] {} {}: {}", request.method(), request.url(), err);
        serde_json::json!({ "error": err.code() })
    };
    respond_json(request, status, body);
}

/// Numeric id in the last path segment, before `/{suffix}` if given
pub(crate) fn parse_id_from_path(path: &str, suffix: Option<&str>) -> Result<i64, &'static str> {
    let trimmed = path.trim_end_matches('/');
    let trimmed = match suffix {
        Some(suffix) => trimmed
            .strip_suffix(&format!("/{suffix}"))
            .ok_or("bad_path")?,
        None => trimmed,
    };

    let id_str = trimmed.rsplit('/').next().ok_or("bad_path")?;
    id_str.parse::<i64>().map_err(|_| "bad_id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_from_path() {
        assert_eq!(parse_id_from_path("/api/user/progress/42", None), Ok(42));
        assert_eq!(
            parse_id_from_path("/api/user/progress/42/claim", Some("claim")),
            Ok(42)
        );
        assert_eq!(
            parse_id_from_path("/api/user/quests/7/progress", Some("progress")),
            Ok(7)
        );
        assert_eq!(
            parse_id_from_path("/api/user/stakes/3/unstake", Some("unstake")),
            Ok(3)
        );
        assert_eq!(parse_id_from_path("/api/quests/abc", None), Err("bad_id"));
        assert_eq!(
            parse_id_from_path("/api/user/progress/42", Some("claim")),
            Err("bad_path")
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&TrackerError::NotConnected), 401);
        assert_eq!(status_for(&TrackerError::NotOwner(1)), 403);
        assert_eq!(status_for(&TrackerError::RecordNotFound(1)), 404);
        assert_eq!(status_for(&TrackerError::NotCompleted(1)), 409);
        assert_eq!(status_for(&TrackerError::AlreadyClaimed(1)), 409);
        assert_eq!(status_for(&TrackerError::InvalidIncrement("x".into())), 400);
        assert_eq!(status_for(&TrackerError::BelowMinimumStake(100)), 400);
        assert_eq!(status_for(&TrackerError::NotStakeOwner(1)), 403);
        assert_eq!(status_for(&TrackerError::StakeNotFound(1)), 404);
        assert_eq!(
            status_for(&TrackerError::InsufficientBalance {
                needed: 2,
                available: 1
            }),
            409
        );
        assert_eq!(status_for(&TrackerError::BalanceOverflow("x".into())), 409);
        assert_eq!(status_for(&TrackerError::Internal("x".into())), 500);
    }
}
