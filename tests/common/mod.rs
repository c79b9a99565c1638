//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use ledger::{
    api::routes::create_router,
    auth::{Clock, LocalTokenMaker},
    db::{MemoryStore, Store},
    AppState, LedgerConfig, ValidationConfig,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_KEY: &[u8; 32] = b"integration-test-key-32-bytes!!!";
pub const TEST_PASSWORD: &str = "secret123";

/// Clock that stands still until a test moves it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// State over the given store with a fixed key and default config.
pub fn create_test_state(store: Arc<dyn Store>) -> AppState {
    let maker = LocalTokenMaker::new(TEST_KEY).expect("test key should be accepted");
    build_state(store, maker)
}

/// Same as [`create_test_state`], but tokens are stamped by `clock`.
pub fn create_test_state_with_clock(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> AppState {
    let maker = LocalTokenMaker::with_clock(TEST_KEY, clock).expect("test key should be accepted");
    build_state(store, maker)
}

fn build_state(store: Arc<dyn Store>, maker: LocalTokenMaker) -> AppState {
    let config = LedgerConfig::default();
    let validation = ValidationConfig::from_section(&config.validation);

    AppState {
        config: Arc::new(config),
        store,
        token_maker: Arc::new(maker),
        validation: Arc::new(validation),
    }
}

pub fn create_test_server() -> TestServer {
    server_for(create_test_state(Arc::new(MemoryStore::new())))
}

pub fn server_for(state: AppState) -> TestServer {
    TestServer::new(create_router(state)).expect("Failed to create test server")
}

pub async fn register(server: &TestServer, username: &str) -> Value {
    let response = server
        .post("/users")
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
            "full_name": format!("{username} Tester"),
            "email": format!("{username}@example.com"),
        }))
        .await;

    response.assert_status_ok();
    response.json()
}

/// Logs in and returns the access token.
pub async fn login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/users/login")
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    body["access_token"]
        .as_str()
        .expect("login should return an access token")
        .to_string()
}

/// Registers and logs in, returning the access token.
pub async fn sign_up(server: &TestServer, username: &str) -> String {
    register(server, username).await;
    login(server, username).await
}

pub async fn open_account(server: &TestServer, token: &str, currency: &str) -> Value {
    let response = server
        .post("/accounts")
        .authorization_bearer(token)
        .json(&json!({ "currency": currency }))
        .await;

    response.assert_status_ok();
    response.json()
}
