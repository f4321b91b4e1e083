#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

use crate::{AppState, LogInResponse, TokenConfig, build_router};

pub(crate) const TEST_ACCESS_SECRET: &str = "test-access-secret";
pub(crate) const TEST_REFRESH_SECRET: &str = "test-refresh-secret";
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

pub(crate) fn get_test_token_config() -> TokenConfig {
    TokenConfig::new(TEST_ACCESS_SECRET, TEST_REFRESH_SECRET)
}

/// An app state backed by an in-memory database, with its upload directory.
///
/// The directory is deleted when the returned [TempDir] is dropped.
pub(crate) fn get_test_state(token_config: &TokenConfig) -> (AppState, TempDir) {
    let upload_dir = tempfile::tempdir().expect("Could not create upload directory");
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    let state = AppState::new(connection, token_config, "Etc/UTC", upload_dir.path())
        .expect("Could not create app state")
        .with_password_cost(4);

    (state, upload_dir)
}

pub(crate) struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub _upload_dir: TempDir,
}

pub(crate) fn get_test_app() -> TestApp {
    get_test_app_with_config(&get_test_token_config())
}

pub(crate) fn get_test_app_with_config(token_config: &TokenConfig) -> TestApp {
    let (state, upload_dir) = get_test_state(token_config);
    let server =
        TestServer::new(build_router(state.clone())).expect("Could not create test server.");

    TestApp {
        server,
        state,
        _upload_dir: upload_dir,
    }
}

/// Register `email` with [TEST_PASSWORD] and log in, returning the tokens.
pub(crate) async fn register_and_log_in(server: &TestServer, email: &str) -> LogInResponse {
    server
        .post(crate::endpoints::REGISTER)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post(crate::endpoints::LOG_IN)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    response.json::<LogInResponse>()
}
