mod common;

use axum::http::{header, HeaderValue, StatusCode};
use chrono::Duration;
use common::*;
use ledger::{
    db::{CreateAccountParams, MemoryStore, Store},
    AppState, LedgerConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;

// ============= Health & Users =============

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_register_hides_password_hash() {
    let server = create_test_server();

    let body = register(&server, "alice").await;

    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body.get("hashed_password").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_user() {
    let server = create_test_server();
    register(&server, "alice").await;

    let response = server
        .post("/users")
        .json(&json!({
            "username": "alice",
            "password": TEST_PASSWORD,
            "full_name": "Alice Again",
            "email": "other@example.com",
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_invalid_fields() {
    let server = create_test_server();

    let cases = [
        json!({"username": "bad name", "password": "secret123", "full_name": "X", "email": "x@example.com"}),
        json!({"username": "bob", "password": "123", "full_name": "Bob", "email": "bob@example.com"}),
        json!({"username": "bob", "password": "secret123", "full_name": "Bob", "email": "not-an-email"}),
    ];

    for case in cases {
        server
            .post("/users")
            .json(&case)
            .await
            .assert_status_bad_request();
    }
}

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let server = create_test_server();
    register(&server, "alice").await;

    let response = server
        .post("/users/login")
        .json(&json!({"username": "alice", "password": TEST_PASSWORD}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let token = body["access_token"].as_str().unwrap();
    assert!(token.starts_with("v2.local."));
    assert!(body["access_token_expires_at"].is_string());
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn test_login_unknown_user() {
    let server = create_test_server();

    let response = server
        .post("/users/login")
        .json(&json!({"username": "ghost", "password": TEST_PASSWORD}))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = create_test_server();
    register(&server, "alice").await;

    let response = server
        .post("/users/login")
        .json(&json!({"username": "alice", "password": "wrong-password"}))
        .await;

    response.assert_status_unauthorized();
}

// ============= Authorization Gate =============

#[tokio::test]
async fn test_protected_routes_require_credentials() {
    let server = create_test_server();

    server.get("/accounts/1").await.assert_status_unauthorized();
    server
        .get("/accounts")
        .add_query_param("page_id", 1)
        .add_query_param("page_size", 5)
        .await
        .assert_status_unauthorized();
    server
        .post("/accounts")
        .json(&json!({"currency": "USD"}))
        .await
        .assert_status_unauthorized();
    server
        .post("/transfers")
        .json(&json!({"from_account_id": 1, "to_account_id": 2, "amount": 1, "currency": "USD"}))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_malformed_headers_rejected() {
    let server = create_test_server();
    let token = sign_up(&server, "alice").await;

    let headers = [
        "Basic abc".to_string(),
        format!("bearer {token}"),
        "Bearer".to_string(),
        format!("Bearer {token} extra"),
        "Bearer v2.local.not-a-real-token".to_string(),
    ];

    for value in headers {
        let response = server
            .get("/accounts/1")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&value).unwrap(),
            )
            .await;

        response.assert_status_unauthorized();
        let body: Value = response.json();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_rejected_requests_never_reach_the_store() {
    let store = Arc::new(MemoryStore::new());
    let server = server_for(create_test_state(store.clone()));

    server
        .post("/users")
        .json(&json!({
            "username": "alice",
            "password": TEST_PASSWORD,
            "full_name": "Alice",
            "email": "alice@example.com",
        }))
        .await
        .assert_status_ok();

    server
        .post("/accounts")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer forged"))
        .json(&json!({"currency": "USD"}))
        .await
        .assert_status_unauthorized();

    assert!(store.get_account(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let clock = Arc::new(ManualClock::default());
    let store = Arc::new(MemoryStore::new());
    let server = server_for(create_test_state_with_clock(store, clock.clone()));
    let token = sign_up(&server, "alice").await;

    clock.advance(Duration::minutes(16));

    let response = server
        .post("/accounts")
        .authorization_bearer(&token)
        .json(&json!({"currency": "USD"}))
        .await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["error"], "token has expired");
}

#[tokio::test]
async fn test_token_from_other_key_rejected() {
    let server = create_test_server();
    register(&server, "alice").await;

    let other = ledger::LocalTokenMaker::new(b"a-completely-different-32b-key!!").unwrap();
    let (token, _) = ledger::TokenMaker::create_token(&other, "alice", Duration::minutes(5)).unwrap();

    server
        .get("/accounts/1")
        .authorization_bearer(token)
        .await
        .assert_status_unauthorized();
}

// ============= Accounts =============

#[tokio::test]
async fn test_create_and_get_account() {
    let server = create_test_server();
    let token = sign_up(&server, "alice").await;

    let account = open_account(&server, &token, "USD").await;
    assert_eq!(account["owner"], "alice");
    assert_eq!(account["balance"], 0);
    assert_eq!(account["currency"], "USD");

    let id = account["id"].as_i64().unwrap();
    let response = server
        .get(&format!("/accounts/{id}"))
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let fetched: Value = response.json();
    assert_eq!(fetched, account);
}

#[tokio::test]
async fn test_create_account_unsupported_currency() {
    let server = create_test_server();
    let token = sign_up(&server, "alice").await;

    server
        .post("/accounts")
        .authorization_bearer(&token)
        .json(&json!({"currency": "XYZ"}))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_duplicate_currency_account_conflicts() {
    let server = create_test_server();
    let token = sign_up(&server, "alice").await;
    open_account(&server, &token, "USD").await;

    server
        .post("/accounts")
        .authorization_bearer(&token)
        .json(&json!({"currency": "USD"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_account_errors() {
    let server = create_test_server();
    let token = sign_up(&server, "alice").await;

    server
        .get("/accounts/0")
        .authorization_bearer(&token)
        .await
        .assert_status_bad_request();

    server
        .get("/accounts/42")
        .authorization_bearer(&token)
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_get_someone_elses_account() {
    let server = create_test_server();
    let alice = sign_up(&server, "alice").await;
    let bob = sign_up(&server, "bob").await;
    let account = open_account(&server, &alice, "USD").await;

    let response = server
        .get(&format!("/accounts/{}", account["id"]))
        .authorization_bearer(&bob)
        .await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "account doesn't belong to the authenticated user"
    );
}

#[tokio::test]
async fn test_list_accounts_only_returns_callers() {
    let server = create_test_server();
    let alice = sign_up(&server, "alice").await;
    let bob = sign_up(&server, "bob").await;

    for currency in ["USD", "EUR", "CAD"] {
        open_account(&server, &alice, currency).await;
    }
    open_account(&server, &bob, "USD").await;

    let response = server
        .get("/accounts")
        .authorization_bearer(&alice)
        .add_query_param("page_id", 1)
        .add_query_param("page_size", 5)
        .await;

    response.assert_status_ok();
    let accounts: Vec<Value> = response.json();
    assert_eq!(accounts.len(), 3);
    assert!(accounts.iter().all(|a| a["owner"] == "alice"));
}

#[tokio::test]
async fn test_list_accounts_bad_page() {
    let server = create_test_server();
    let token = sign_up(&server, "alice").await;

    server
        .get("/accounts")
        .authorization_bearer(&token)
        .add_query_param("page_id", 0)
        .add_query_param("page_size", 5)
        .await
        .assert_status_bad_request();

    server
        .get("/accounts")
        .authorization_bearer(&token)
        .add_query_param("page_id", 1)
        .add_query_param("page_size", 50)
        .await
        .assert_status_bad_request();

    server
        .get("/accounts")
        .authorization_bearer(&token)
        .add_query_param("page_id", i64::MAX)
        .add_query_param("page_size", 10)
        .await
        .assert_status_bad_request();
}

// ============= Transfers =============

async fn funded_account(store: &MemoryStore, owner: &str, currency: &str, balance: i64) -> i64 {
    store
        .create_account(CreateAccountParams {
            owner: owner.to_string(),
            balance,
            currency: currency.to_string(),
        })
        .await
        .expect("should create account")
        .id
}

#[tokio::test]
async fn test_transfer_moves_money() {
    let store = Arc::new(MemoryStore::new());
    let server = server_for(create_test_state(store.clone()));
    let alice = sign_up(&server, "alice").await;
    register(&server, "bob").await;

    let from = funded_account(&store, "alice", "USD", 100).await;
    let to = funded_account(&store, "bob", "USD", 10).await;

    let response = server
        .post("/transfers")
        .authorization_bearer(&alice)
        .json(&json!({
            "from_account_id": from,
            "to_account_id": to,
            "amount": 25,
            "currency": "USD",
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["transfer"]["amount"], 25);
    assert_eq!(body["from_account"]["balance"], 75);
    assert_eq!(body["to_account"]["balance"], 35);
    assert_eq!(body["from_entry"]["amount"], -25);
    assert_eq!(body["to_entry"]["amount"], 25);
}

#[tokio::test]
async fn test_transfer_from_someone_elses_account() {
    let store = Arc::new(MemoryStore::new());
    let server = server_for(create_test_state(store.clone()));
    register(&server, "alice").await;
    let bob = sign_up(&server, "bob").await;

    let from = funded_account(&store, "alice", "USD", 100).await;
    let to = funded_account(&store, "bob", "USD", 0).await;

    let response = server
        .post("/transfers")
        .authorization_bearer(&bob)
        .json(&json!({
            "from_account_id": from,
            "to_account_id": to,
            "amount": 25,
            "currency": "USD",
        }))
        .await;

    response.assert_status_unauthorized();
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "from account doesn't belong to the authenticated user"
    );
    assert_eq!(store.get_account(from).await.unwrap().unwrap().balance, 100);
}

#[tokio::test]
async fn test_transfer_validation() {
    let store = Arc::new(MemoryStore::new());
    let server = server_for(create_test_state(store.clone()));
    let alice = sign_up(&server, "alice").await;
    register(&server, "bob").await;

    let usd = funded_account(&store, "alice", "USD", 100).await;
    let eur = funded_account(&store, "bob", "EUR", 100).await;

    let bad_requests = [
        json!({"from_account_id": usd, "to_account_id": eur, "amount": 10, "currency": "USD"}),
        json!({"from_account_id": usd, "to_account_id": usd, "amount": 10, "currency": "USD"}),
        json!({"from_account_id": usd, "to_account_id": eur, "amount": 0, "currency": "USD"}),
        json!({"from_account_id": usd, "to_account_id": eur, "amount": 10, "currency": "XYZ"}),
    ];

    for request in bad_requests {
        server
            .post("/transfers")
            .authorization_bearer(&alice)
            .json(&request)
            .await
            .assert_status_bad_request();
    }

    server
        .post("/transfers")
        .authorization_bearer(&alice)
        .json(&json!({"from_account_id": usd, "to_account_id": 999, "amount": 10, "currency": "USD"}))
        .await
        .assert_status_not_found();

    assert_eq!(store.get_account(usd).await.unwrap().unwrap().balance, 100);
    assert_eq!(store.entry_count(usd), 0);
}

// ============= State =============

#[tokio::test]
async fn test_state_requires_token_key() {
    let mut config = LedgerConfig::default();
    config.auth.token_symmetric_key_env = "LEDGER_API_TEST_KEY_UNSET".to_string();

    let result = AppState::new(config, Arc::new(MemoryStore::new()));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_state_from_config() {
    std::env::set_var("LEDGER_API_TEST_KEY", "12345678901234567890123456789012");
    let mut config = LedgerConfig::default();
    config.auth.token_symmetric_key_env = "LEDGER_API_TEST_KEY".to_string();

    let state = AppState::from_config(config)
        .await
        .expect("state should build from default config");
    let server = server_for(state);

    let token = sign_up(&server, "alice").await;
    open_account(&server, &token, "CAD").await;
}
