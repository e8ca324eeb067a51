//! End-to-end tests for the rewards HTTP API

mod common;

use serde_json::json;

use common::{ALICE, BOB, get, post, put, quest_record_id, start_server, start_server_with};
use slerfhub::config::Config;
use slerfhub::domain::{DefinitionKind, NewDefinition, Requirement};

#[test]
fn test_ping_and_catalog() {
    let server = start_server();

    let (status, body) = get(&server, "/api/ping", None);
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    let (status, missions) = get(&server, "/api/missions", None);
    assert_eq!(status, 200);
    assert_eq!(missions.as_array().unwrap().len(), 3);

    let (status, quests) = get(&server, "/api/quests", None);
    assert_eq!(status, 200);
    let quests = quests.as_array().unwrap();
    assert_eq!(quests.len(), 4);
    assert_eq!(quests[1]["requirement"], json!({ "type": "referral", "count": 3 }));

    let id = quests[0]["id"].as_i64().unwrap();
    let (status, quest) = get(&server, &format!("/api/quests/{id}"), None);
    assert_eq!(status, 200);
    assert_eq!(quest["title"], "Stake 1000 $SLERF");

    // a quest id is not a mission
    let (status, body) = get(&server, &format!("/api/missions/{id}"), None);
    assert_eq!(status, 404);
    assert_eq!(body["error"], "definition_not_found");
}

#[test]
fn test_user_endpoints_require_wallet() {
    let server = start_server();

    let (status, body) = get(&server, "/api/user/quests", None);
    assert_eq!(status, 401);
    assert_eq!(body["error"], "not_connected");

    let (status, body) = get(&server, "/api/user", Some("not-a-wallet"));
    assert_eq!(status, 400);
    assert_eq!(body["error"], "invalid_wallet");

    let (status, body) = put(&server, "/api/user/progress/1", None, json!({ "increment": 1 }));
    assert_eq!(status, 401);
    assert_eq!(body["error"], "not_connected");
}

#[test]
fn test_referral_quest_flow() {
    let server = start_server();
    let id = quest_record_id(&server, ALICE, "Refer 3 Friends");
    let progress = format!("/api/user/progress/{id}");
    let claim = format!("/api/user/progress/{id}/claim");

    let (status, record) = put(&server, &progress, Some(ALICE), json!({ "increment": 1 }));
    assert_eq!(status, 200);
    assert_eq!(record["progress"], 1);
    assert_eq!(record["completed"], false);

    // claiming early is refused and changes nothing
    let (status, body) = post(&server, &claim, Some(ALICE), json!({}));
    assert_eq!(status, 409);
    assert_eq!(body["error"], "not_completed");

    put(&server, &progress, Some(ALICE), json!({ "increment": 1 }));
    let (_, record) = put(&server, &progress, Some(ALICE), json!({ "increment": 1 }));
    assert_eq!(record["progress"], 3);
    assert_eq!(record["completed"], true);
    assert_eq!(record["claimed"], false);

    let (status, receipt) = post(&server, &claim, Some(ALICE), json!({}));
    assert_eq!(status, 200);
    assert_eq!(receipt["reward"], 250);
    assert_eq!(receipt["balance"], 250);
    assert_eq!(receipt["record"]["claimed"], true);

    let (status, body) = post(&server, &claim, Some(ALICE), json!({}));
    assert_eq!(status, 409);
    assert_eq!(body["error"], "already_claimed");

    let (_, user) = get(&server, "/api/user", Some(ALICE));
    assert_eq!(user["balance"], 250);
    assert_eq!(user["total_earned"], 250);

    let (_, stats) = get(&server, "/api/user/stats", Some(ALICE));
    assert_eq!(stats["quests_completed"], 1);
    assert_eq!(stats["rewards_claimed"], 1);
}

#[test]
fn test_increment_validation() {
    let server = start_server();
    let id = quest_record_id(&server, ALICE, "Win 5 Mini-Games");
    let path = format!("/api/user/progress/{id}");

    for body in [json!({ "increment": -1 }), json!({ "increment": "one" }), json!({})] {
        let (status, resp) = put(&server, &path, Some(ALICE), body.clone());
        assert_eq!(status, 400, "{body}");
        assert_eq!(resp["error"], "invalid_increment");
    }

    let (status, record) = put(&server, &path, Some(ALICE), json!({ "increment": 50 }));
    assert_eq!(status, 200);
    assert_eq!(record["progress"], 5);
    assert_eq!(record["completed"], true);

    let (status, body) = put(&server, "/api/user/progress/99999", Some(ALICE), json!({ "increment": 1 }));
    assert_eq!(status, 404);
    assert_eq!(body["error"], "record_not_found");
}

#[test]
fn test_claim_unknown_record() {
    let server = start_server();
    let (status, body) = post(&server, "/api/user/progress/99999/claim", Some(ALICE), json!({}));
    assert_eq!(status, 404);
    assert_eq!(body["error"], "record_not_found");

    let (_, user) = get(&server, "/api/user", Some(ALICE));
    assert_eq!(user["balance"], 0);
}

#[test]
fn test_records_are_private() {
    let server = start_server();
    let id = quest_record_id(&server, ALICE, "Mint a Slerf Booster NFT");

    let (status, body) = put(
        &server,
        &format!("/api/user/progress/{id}"),
        Some(BOB),
        json!({ "increment": 1 }),
    );
    assert_eq!(status, 403);
    assert_eq!(body["error"], "not_owner");

    put(&server, &format!("/api/user/progress/{id}"), Some(ALICE), json!({ "increment": 1 }));
    let (status, _) = post(&server, &format!("/api/user/progress/{id}/claim"), Some(BOB), json!({}));
    assert_eq!(status, 403);
}

#[test]
fn test_lazy_init_is_stable() {
    let server = start_server();
    let (_, first) = get(&server, "/api/user/missions", Some(ALICE));
    let (_, second) = get(&server, "/api/user/missions", Some(ALICE));
    assert_eq!(first.as_array().unwrap().len(), 3);
    assert_eq!(first, second);
    assert_eq!(first[0]["progress"], 0);
    assert_eq!(first[0]["progress_max"], 1);
}

#[test]
fn test_explicit_init_returns_created() {
    let server = start_server();
    let (_, quests) = get(&server, "/api/quests", None);
    let quest_id = quests[0]["id"].as_i64().unwrap();

    let path = format!("/api/user/quests/{quest_id}/progress");
    let (status, a) = post(&server, &path, Some(BOB), json!({}));
    assert_eq!(status, 201);
    let (_, b) = post(&server, &path, Some(BOB), json!({}));
    assert_eq!(a["id"], b["id"]);
    assert_eq!(a["progress_max"], 1000);

    let (status, _) = post(&server, "/api/user/quests/424242/progress", Some(BOB), json!({}));
    assert_eq!(status, 404);
}

#[test]
fn test_trivia_referral_and_reset() {
    let server = start_server();

    let (status, stats) = post(&server, "/api/user/trivia", Some(ALICE), json!({ "correct": true }));
    assert_eq!(status, 200);
    assert_eq!(stats["trivia_correct"], 1);
    assert_eq!(stats["trivia_total"], 1);

    let (status, _) = post(&server, "/api/user/trivia", Some(ALICE), json!({ "correct": "yes" }));
    assert_eq!(status, 400);

    let (_, user) = get(&server, "/api/user", Some(ALICE));
    let code = user["referral_code"].as_str().unwrap();
    let (status, found) = get(&server, &format!("/api/users/referral/{code}"), None);
    assert_eq!(status, 200);
    assert_eq!(found["wallet_address"], ALICE);
    assert!(found.get("balance").is_none());

    let (status, _) = get(&server, "/api/users/referral/ZZZZZZZZ", None);
    assert_eq!(status, 404);

    let (status, reset) = get(&server, "/api/reset", None);
    assert_eq!(status, 200);
    assert!(reset["daily"].as_str().unwrap().contains(':'));
    assert!(reset["weekly"].as_str().unwrap().ends_with('h'));
    assert!(reset["daily_seconds"].as_i64().unwrap() > 0);
}

#[test]
fn test_auth_token_and_unknown_route() {
    let mut config = Config::default();
    config.server.auth_token = "s3cret".into();
    let server = start_server_with(config);

    let (status, body) = get(&server, "/api/ping", None);
    assert_eq!(status, 401);
    assert_eq!(body["error"], "unauthorized");

    let response = ureq::get(&server.url("/api/ping"))
        .set("X-SlerfHub-Token", "s3cret")
        .call()
        .unwrap();
    assert_eq!(response.status(), 200);

    let (status, _) = common::into_parts(
        ureq::get(&server.url("/api/nope"))
            .set("X-SlerfHub-Token", "s3cret")
            .call(),
    );
    assert_eq!(status, 404);
}

#[test]
fn test_header_names_are_case_insensitive() {
    let mut config = Config::default();
    config.server.auth_token = "s3cret".into();
    let server = start_server_with(config);

    let (status, user) = common::into_parts(
        ureq::get(&server.url("/api/user"))
            .set("x-slerfhub-token", "s3cret")
            .set("x-wallet-address", ALICE)
            .call(),
    );
    assert_eq!(status, 200);
    assert_eq!(user["wallet_address"], ALICE);

    let (status, _) = common::into_parts(
        ureq::get(&server.url("/api/user"))
            .set("X-SLERFHUB-TOKEN", "wrong")
            .set("X-Wallet-Address", ALICE)
            .call(),
    );
    assert_eq!(status, 401);
}

/// Complete one quest for `wallet` and claim its reward
fn earn(server: &common::TestServer, wallet: &str, title: &str, increment: u64) {
    let id = quest_record_id(server, wallet, title);
    let (status, _) = put(
        server,
        &format!("/api/user/progress/{id}"),
        Some(wallet),
        json!({ "increment": increment }),
    );
    assert_eq!(status, 200);
    let (status, _) = post(server, &format!("/api/user/progress/{id}/claim"), Some(wallet), json!({}));
    assert_eq!(status, 200);
}

#[test]
fn test_staking_flow() {
    let server = start_server();
    earn(&server, ALICE, "Mint a Slerf Booster NFT", 1);
    earn(&server, ALICE, "Win 5 Mini-Games", 5);

    let (status, vaults) = get(&server, "/api/vaults", None);
    assert_eq!(status, 200);
    assert_eq!(vaults.as_array().unwrap().len(), 3);
    assert_eq!(vaults[0]["name"], "Basic Vault");
    assert_eq!(vaults[0]["apr"], 18);
    let basic = vaults[0]["id"].as_i64().unwrap();

    let (status, vault) = get(&server, &format!("/api/vaults/{basic}"), None);
    assert_eq!(status, 200);
    assert_eq!(vault["min_stake"], 100);
    let (status, body) = get(&server, "/api/vaults/999", None);
    assert_eq!(status, 404);
    assert_eq!(body["error"], "vault_not_found");

    for (body, expected_status, code) in [
        (json!({ "vault_id": basic, "amount": 50 }), 400, "below_minimum_stake"),
        (json!({ "vault_id": basic, "amount": -5 }), 400, "invalid_amount"),
        (json!({ "vault_id": basic, "amount": 1000 }), 409, "insufficient_balance"),
        (json!({ "vault_id": 999, "amount": 100 }), 404, "vault_not_found"),
        (json!({ "amount": 100 }), 400, "bad_request"),
    ] {
        let (status, resp) = post(&server, "/api/user/stakes", Some(ALICE), body.clone());
        assert_eq!(status, expected_status, "{body}");
        assert_eq!(resp["error"], code, "{body}");
    }

    let (status, stake) = post(
        &server,
        "/api/user/stakes",
        Some(ALICE),
        json!({ "vault_id": basic, "amount": 500 }),
    );
    assert_eq!(status, 201);
    assert_eq!(stake["amount"], 500);
    assert_eq!(stake["vault"]["name"], "Basic Vault");
    assert_eq!(stake["pending_rewards"], 0);
    let stake_id = stake["id"].as_i64().unwrap();

    let (_, user) = get(&server, "/api/user", Some(ALICE));
    assert_eq!(user["balance"], 250);
    let (_, stats) = get(&server, "/api/user/stats", Some(ALICE));
    assert_eq!(stats["staked"], 500);
    let (_, stakes) = get(&server, "/api/user/stakes", Some(ALICE));
    assert_eq!(stakes.as_array().unwrap().len(), 1);

    let unstake = format!("/api/user/stakes/{stake_id}/unstake");
    let (status, body) = post(&server, &unstake, Some(BOB), json!({}));
    assert_eq!(status, 403);
    assert_eq!(body["error"], "not_owner");

    let (status, body) = post(
        &server,
        &format!("/api/user/stakes/{stake_id}/claim"),
        Some(ALICE),
        json!({}),
    );
    assert_eq!(status, 409);
    assert_eq!(body["error"], "nothing_to_claim");

    let (status, closed) = post(&server, &unstake, Some(ALICE), json!({}));
    assert_eq!(status, 200);
    assert_eq!(closed["amount"], 500);
    assert_eq!(closed["balance"], 750);

    let (status, body) = post(&server, &unstake, Some(ALICE), json!({}));
    assert_eq!(status, 404);
    assert_eq!(body["error"], "stake_not_found");
}

#[test]
fn test_custom_catalog_from_config() {
    let mut config = Config::default();
    config.catalog.push(NewDefinition {
        kind: DefinitionKind::Mission,
        title: "Answer trivia".into(),
        description: String::new(),
        reward: 10,
        icon: String::new(),
        requirement: Requirement::Count { count: 2 },
        active: true,
        expires_at: None,
    });
    let server = start_server_with(config);

    let (_, missions) = get(&server, "/api/missions", None);
    assert_eq!(missions.as_array().unwrap().len(), 1);
    let (_, quests) = get(&server, "/api/quests", None);
    assert!(quests.as_array().unwrap().is_empty());
}
