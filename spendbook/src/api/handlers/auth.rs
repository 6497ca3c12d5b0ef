//! Authentication endpoints: register, login, logout, refresh.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::AppendHeaders,
};
use std::time::Duration;

use crate::{
    AppState,
    api::models::auth::{LoginRequest, MessageResponse, RefreshResponse, RegisterRequest},
    auth::{
        ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
        middleware::cookie_value,
        password,
        tokens::{TokenError, TokenKind, issue_token, verify_token},
    },
    db::{handlers::users::Users, models::users::UserCreateDBRequest},
    errors::Error,
};

/// Register a new user account.
///
/// No tokens are issued on registration; the client logs in afterwards.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = MessageResponse),
        (status = 400, description = "Invalid input or user already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), Error> {
    if request.first_name.trim().is_empty()
        || request.last_name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(Error::BadRequest {
            message: "All fields are required".to_string(),
        });
    }

    // Validate password length
    let password_config = &state.config.auth.password;
    if request.password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if request.password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Check if user with this email already exists
    if user_repo.get_by_email(&request.email).await?.is_some() {
        return Err(Error::Conflict {
            message: "User already exists".to_string(),
        });
    }

    // Hash the password on a blocking thread to avoid blocking async runtime
    let params = password::Argon2Params {
        memory_kib: password_config.argon2_memory_kib,
        iterations: password_config.argon2_iterations,
        parallelism: password_config.argon2_parallelism,
    };
    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let create_request = UserCreateDBRequest {
        name: format!("{} {}", request.first_name, request.last_name),
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
        password_hash,
    };

    // A unique violation here means a concurrent registration won the race;
    // the Database error already maps to 400 "User already exists"
    user_repo.create(&create_request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Login with email and password, setting both auth cookies
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = MessageResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(AppendHeaders<[(HeaderName, String); 2]>, Json<MessageResponse>), Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    // Unknown email and wrong password get the same response
    let user = user_repo
        .get_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid credentials".to_string()),
        })?;

    // Verify password on a blocking thread to avoid blocking async runtime
    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid credentials".to_string()),
        });
    }

    let access_token = issue_token(user.id, TokenKind::Access, &state.config)?;
    let refresh_token = issue_token(user.id, TokenKind::Refresh, &state.config)?;

    let access_cookie = build_auth_cookie(
        ACCESS_TOKEN_COOKIE,
        &access_token,
        state.config.auth.access_token_expiry,
        &state.config,
    );
    let refresh_cookie = build_auth_cookie(
        REFRESH_TOKEN_COOKIE,
        &refresh_token,
        state.config.auth.refresh_token_expiry,
        &state.config,
    );

    Ok((
        AppendHeaders([(header::SET_COOKIE, access_cookie), (header::SET_COOKIE, refresh_cookie)]),
        Json(MessageResponse::new("Login successful")),
    ))
}

/// Logout by clearing the access cookie.
///
/// Best-effort: no authentication is required and the refresh cookie is left
/// in place. Issued tokens stay valid until they expire; there is no
/// server-side revocation.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
) -> Result<(AppendHeaders<[(HeaderName, String); 1]>, Json<MessageResponse>), Error> {
    // The clearing cookie must repeat the original attributes (in particular
    // SameSite), otherwise browsers keep the stored value
    let cookie = clear_auth_cookie(ACCESS_TOKEN_COOKIE, &state.config);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(MessageResponse::new("Logged out successfully")),
    ))
}

/// Mint a new access token from the refresh cookie.
///
/// The refresh token itself is not rotated: the cookie set at login stays
/// valid for its whole lifetime.
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    tag = "authentication",
    responses(
        (status = 200, description = "New access token issued", body = RefreshResponse),
        (status = 401, description = "Refresh cookie missing"),
        (status = 403, description = "Invalid refresh token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(AppendHeaders<[(HeaderName, String); 1]>, Json<RefreshResponse>), Error> {
    let token = cookie_value(&headers, REFRESH_TOKEN_COOKIE).ok_or(Error::Unauthenticated {
        message: Some("Unauthorized".to_string()),
    })?;

    let claims = verify_token(&token, TokenKind::Refresh, &state.config).map_err(|e| match e {
        TokenError::Internal(operation) => Error::Internal { operation },
        TokenError::Expired | TokenError::BadSignature | TokenError::Malformed | TokenError::WrongKind(_) => {
            Error::Forbidden {
                message: Some("Invalid refresh token".to_string()),
            }
        }
    })?;

    let access_token = issue_token(claims.sub, TokenKind::Access, &state.config)?;
    let cookie = build_auth_cookie(
        ACCESS_TOKEN_COOKIE,
        &access_token,
        state.config.auth.access_token_expiry,
        &state.config,
    );

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(RefreshResponse { access_token }),
    ))
}

/// Build an auth cookie with the configured attributes
pub(crate) fn build_auth_cookie(name: &str, value: &str, max_age: Duration, config: &crate::config::Config) -> String {
    let cookies = &config.auth.cookies;

    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        name,
        value,
        cookies.same_site,
        max_age.as_secs()
    );
    if cookies.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build a cookie that clears `name`, keeping the attributes identical
pub(crate) fn clear_auth_cookie(name: &str, config: &crate::config::Config) -> String {
    build_auth_cookie(name, "", Duration::ZERO, config)
}
