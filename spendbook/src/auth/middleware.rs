//! Request extractor for the authenticated user.
//!
//! The status split matters to the frontend: a missing cookie is a 401 (the
//! client redirects to login), an invalid or expired token is a 403 (the
//! client tries the refresh endpoint first).

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::{
    AppState,
    auth::{
        ACCESS_TOKEN_COOKIE,
        tokens::{TokenError, TokenKind, verify_token},
    },
    errors::Error,
    types::UserId,
};

/// The authenticated user, resolved from the `access_token` cookie.
///
/// Handlers taking this extractor reject unauthenticated requests before the
/// handler body runs.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: UserId,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, ACCESS_TOKEN_COOKIE).ok_or(Error::Unauthenticated {
            message: Some("Unauthorized".to_string()),
        })?;

        let claims = verify_token(&token, TokenKind::Access, &state.config).map_err(|e| match e {
            TokenError::Internal(operation) => Error::Internal { operation },
            TokenError::Expired | TokenError::BadSignature | TokenError::Malformed | TokenError::WrongKind(_) => {
                Error::Forbidden {
                    message: Some("Invalid or expired token".to_string()),
                }
            }
        })?;

        Ok(CurrentUser { user_id: claims.sub })
    }
}

/// Extract a single cookie value from the `Cookie` request header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_cookie_value_single() {
        let headers = headers_with_cookie("access_token=abc123");
        assert_eq!(cookie_value(&headers, "access_token").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_value_among_many() {
        let headers = headers_with_cookie("theme=dark; access_token=abc123; refresh_token=xyz");
        assert_eq!(cookie_value(&headers, "access_token").as_deref(), Some("abc123"));
        assert_eq!(cookie_value(&headers, "refresh_token").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_cookie_value_missing() {
        let headers = headers_with_cookie("theme=dark");
        assert!(cookie_value(&headers, "access_token").is_none());

        let empty = HeaderMap::new();
        assert!(cookie_value(&empty, "access_token").is_none());
    }

    #[test]
    fn test_cookie_name_is_not_prefix_matched() {
        let headers = headers_with_cookie("not_access_token=evil");
        assert!(cookie_value(&headers, "access_token").is_none());
    }
}
