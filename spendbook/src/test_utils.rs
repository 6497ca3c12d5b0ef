//! Shared helpers for handler tests.

use axum_test::TestServer;
use sqlx::SqlitePool;
use std::time::Duration;

use crate::{
    AppState, build_router,
    auth::tokens::{TokenKind, issue_token, verify_token},
    config::{AuthConfig, Config, CookieConfig, PasswordConfig},
    types::UserId,
};

/// A config with test secrets and cookie attributes a test client accepts
pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        db_url: None,
        client_origin: "http://localhost:5173".to_string(),
        access_token_secret: Some("test-access-secret".to_string()),
        refresh_token_secret: Some("test-refresh-secret".to_string()),
        auth: AuthConfig {
            access_token_expiry: Duration::from_secs(15 * 60),
            refresh_token_expiry: Duration::from_secs(7 * 24 * 60 * 60),
            password: PasswordConfig {
                // Weak parameters keep the hashing tests fast
                argon2_memory_kib: 1024,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..PasswordConfig::default()
            },
            cookies: CookieConfig {
                secure: false,
                same_site: "Lax".to_string(),
            },
        },
    }
}

pub fn create_test_state(pool: SqlitePool) -> AppState {
    AppState {
        db: pool,
        config: create_test_config(),
    }
}

/// Spin up the full router against the given pool
pub async fn create_test_server(pool: SqlitePool) -> TestServer {
    let app = build_router(create_test_state(pool)).unwrap();
    TestServer::new(app).unwrap()
}

/// Register a user through the API and return their id.
///
/// The id is recovered from the access token set at login, since the register
/// endpoint intentionally returns no identifier.
pub async fn register_user(server: &TestServer, email: &str, password: &str) -> UserId {
    server
        .post("/api/auth/register")
        .json(&serde_json::json!({
            "firstName": "Test",
            "lastName": "User",
            "email": email,
            "password": password,
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();

    let cookie = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|c| c.starts_with("access_token="))
        .expect("login sets an access cookie");
    let token = cookie
        .trim_start_matches("access_token=")
        .split(';')
        .next()
        .expect("cookie has a value");

    let claims = verify_token(token, TokenKind::Access, &create_test_config()).unwrap();
    claims.sub
}

/// A Cookie header value carrying a fresh access token for `user_id`
pub fn access_cookie_for(user_id: UserId, config: &Config) -> String {
    let token = issue_token(user_id, TokenKind::Access, config).unwrap();
    format!("access_token={token}")
}
