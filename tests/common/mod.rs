//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use zodiac_admin::auth::{
    AuthManager, AuthSettings, PasswordHasher, Secret, StaticCredential, TokenCodec,
};
use zodiac_admin::config::ServerConfig;
use zodiac_admin::database::{Database, SqliteDatabase};
use zodiac_admin::server::{AppState, Server};

/// Session secret shared by the test servers
pub const TEST_SECRET: &str = "integration-test-secret";

/// Static owner credential
pub const OWNER_EMAIL: &str = "owner@example.com";
pub const OWNER_PASSWORD: &str = "hunter2";

/// Iteration count low enough to keep hashing fast in tests
pub const TEST_ITERATIONS: u32 = 1_000;

/// Create an in-memory database for testing
pub async fn create_test_database() -> Arc<SqliteDatabase> {
    Arc::new(
        SqliteDatabase::new(":memory:")
            .await
            .expect("Failed to create test database"),
    )
}

/// Codec signing with [`TEST_SECRET`]
pub fn test_codec() -> TokenCodec {
    TokenCodec::new(Secret::new(TEST_SECRET).expect("Secret is not empty"))
}

/// Settings with a secret and the static owner pair
pub fn test_settings() -> AuthSettings {
    AuthSettings {
        codec: Some(test_codec()),
        fallback: StaticCredential::new(OWNER_EMAIL, OWNER_PASSWORD),
        hasher: PasswordHasher::with_iterations(TEST_ITERATIONS),
        ..Default::default()
    }
}

/// Create a test authentication manager with the given settings
pub fn create_test_auth_manager<D: Database + 'static>(
    db: Arc<D>,
    settings: AuthSettings,
) -> Arc<AuthManager<D>> {
    Arc::new(AuthManager::new(db, settings))
}

/// Create a test application state with fully configured authentication
pub async fn create_test_state() -> AppState<SqliteDatabase> {
    let database = create_test_database().await;
    create_test_state_with(database, test_settings())
}

/// Create a test application state from explicit settings
pub fn create_test_state_with(
    database: Arc<SqliteDatabase>,
    settings: AuthSettings,
) -> AppState<SqliteDatabase> {
    AppState {
        auth_manager: create_test_auth_manager(database, settings),
    }
}

/// Create a test server configuration with a random port
pub fn create_test_server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0, // Let OS assign a free port
    }
}

/// Run a test server in the background and return the address
/// The server will be shut down when the returned shutdown sender is dropped or sent
pub async fn run_test_server(
    state: AppState<SqliteDatabase>,
) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local address");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let server = Server::new(create_test_server_config(), state);
    tokio::spawn(async move {
        server
            .serve(listener, async move {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("Server error");
    });

    (addr, shutdown_tx)
}

/// Log in over HTTP and return the status and body
pub async fn post_login(
    addr: SocketAddr,
    email: &str,
    password: &str,
) -> (reqwest::StatusCode, serde_json::Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{}/login", addr))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login request failed");

    let status = response.status();
    let body = response.json().await.expect("Login body is not JSON");
    (status, body)
}

/// Log in and return the issued token
pub async fn login_token(addr: SocketAddr, email: &str, password: &str) -> String {
    let (status, body) = post_login(addr, email, password).await;
    assert_eq!(status, reqwest::StatusCode::OK, "login failed: {}", body);
    body["token"]
        .as_str()
        .expect("token is a string")
        .to_string()
}
