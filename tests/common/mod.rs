//! Shared test utilities for HTTP API tests

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use slerfhub::config::Config;
use slerfhub::server::{ApiState, HttpServer, WALLET_HEADER};
use slerfhub::tracker::Tracker;
use slerfhub::wallet::HeaderWalletProvider;

pub const ALICE: &str = "0x00000000000000000000000000000000000a11ce";
pub const BOB: &str = "0x0000000000000000000000000000000000000b0b";

/// A rewards API on a random port, backed by a temp database
pub struct TestServer {
    pub base_url: String,
    pub tracker: Tracker,
    _dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Start a server with the built-in catalog
pub fn start_server() -> TestServer {
    start_server_with(Config::default())
}

/// Start a server from `config` (database path and port are overridden)
pub fn start_server_with(mut config: Config) -> TestServer {
    let dir = TempDir::new().expect("Failed to create temp dir");
    config.tracker.database = Some(dir.path().join("rewards.db"));

    let tracker = Tracker::from_config(&config).expect("Failed to open tracker");
    let state = ApiState::new(tracker.clone(), Arc::new(HeaderWalletProvider))
        .with_auth_token(config.server.auth_token.clone());
    let server = HttpServer::bind("127.0.0.1:0", state).expect("Failed to bind");
    let port = server.local_port().expect("No port bound");
    server.spawn();

    TestServer {
        base_url: format!("http://127.0.0.1:{}", port),
        tracker,
        _dir: dir,
    }
}

/// Status code and JSON body, for both success and error responses
pub fn into_parts(result: Result<ureq::Response, ureq::Error>) -> (u16, Value) {
    match result {
        Ok(response) => {
            let status = response.status();
            (status, response.into_json().unwrap_or(Value::Null))
        }
        Err(ureq::Error::Status(status, response)) => {
            (status, response.into_json().unwrap_or(Value::Null))
        }
        Err(e) => panic!("transport error: {e}"),
    }
}

pub fn get(server: &TestServer, path: &str, wallet: Option<&str>) -> (u16, Value) {
    let mut request = ureq::get(&server.url(path));
    if let Some(wallet) = wallet {
        request = request.set(WALLET_HEADER, wallet);
    }
    into_parts(request.call())
}

pub fn post(server: &TestServer, path: &str, wallet: Option<&str>, body: Value) -> (u16, Value) {
    let mut request = ureq::post(&server.url(path));
    if let Some(wallet) = wallet {
        request = request.set(WALLET_HEADER, wallet);
    }
    into_parts(request.send_json(body))
}

pub fn put(server: &TestServer, path: &str, wallet: Option<&str>, body: Value) -> (u16, Value) {
    let mut request = ureq::put(&server.url(path));
    if let Some(wallet) = wallet {
        request = request.set(WALLET_HEADER, wallet);
    }
    into_parts(request.send_json(body))
}

/// Id of the user's record for the quest titled `title`
pub fn quest_record_id(server: &TestServer, wallet: &str, title: &str) -> i64 {
    let (status, quests) = get(server, "/api/user/quests", Some(wallet));
    assert_eq!(status, 200);
    quests
        .as_array()
        .expect("quest list")
        .iter()
        .find(|q| q["definition"]["title"] == title)
        .and_then(|q| q["id"].as_i64())
        .unwrap_or_else(|| panic!("no quest record titled {title}"))
}
