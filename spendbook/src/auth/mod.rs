//! Authentication and authorization.
//!
//! Cookie-based JWT authentication for browser clients:
//! - Users log in via `/api/auth/login` with email/password
//! - A short-lived access token and a long-lived refresh token are set as
//!   HTTP-only cookies, each signed with its own secret
//! - `/api/auth/refresh-token` mints a new access token from the refresh cookie
//! - Logout clears the access cookie; tokens are not revocable server-side
//!
//! # Modules
//!
//! - [`middleware`]: Extractor for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`tokens`]: JWT creation and verification for both token kinds
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use spendbook::auth::middleware::CurrentUser;
//! use axum::extract::State;
//!
//! async fn protected_handler(
//!     State(state): State<AppState>,
//!     user: CurrentUser,
//! ) -> Result<String, Error> {
//!     Ok(format!("Hello, {}!", user.user_id))
//! }
//! ```

pub mod middleware;
pub mod password;
pub mod tokens;

/// Cookie holding the access token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Cookie holding the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
