//! Authentication middleware for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use pagedesk_shared::types::UserId;
use serde_json::json;
use tracing::error;

use crate::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

/// Extracts the bearer token from an Authorization header value.
///
/// The scheme is matched case-insensitively.
fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Returns the session token of a request, or an empty string.
///
/// A bearer `Authorization` header wins over the `token` cookie.
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> String {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);
    if let Some(token) = bearer {
        return token.to_string();
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().trim().to_string())
        .unwrap_or_default()
}

fn unauthorized(error: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

/// Authentication middleware that validates session tokens.
///
/// This middleware:
/// 1. Extracts the token from the Authorization header or the `token` cookie
/// 2. Verifies the signature and the stored session row
/// 3. Stores the [`AuthUser`] in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_token(request.headers());
    if token.is_empty() {
        return unauthorized("missing_token", "No token provided");
    }

    match state.sessions().verify_token(&token).await {
        Ok(Some(user_id)) => {
            request.extensions_mut().insert(AuthUser { user_id, token });
            next.run(request).await
        }
        Ok(None) => unauthorized("invalid_token", "Invalid or expired token"),
        Err(e) => {
            error!(error = %e, "session lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                })),
            )
                .into_response()
        }
    }
}

/// Extractor for the authenticated user.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id();
///     // ...
/// }
/// ```
#[derive(Clone)]
pub struct AuthUser {
    user_id: UserId,
    token: String,
}

impl std::fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUser")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl AuthUser {
    /// Returns the authenticated user's ID.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the session token the request was authenticated with.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| unauthorized("unauthorized", "Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};
    use rstest::rstest;

    fn headers(pairs: &[(axum::http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[rstest]
    #[case("Bearer abc", Some("abc"))]
    #[case("bearer abc", Some("abc"))]
    #[case("BEARER abc", Some("abc"))]
    #[case("Bearer ", None)]
    #[case("Basic abc", None)]
    #[case("abc", None)]
    fn test_extract_bearer_token(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_bearer_token(header), expected);
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let map = headers(&[
            (AUTHORIZATION, "Bearer from-header"),
            (COOKIE, "token=from-cookie"),
        ]);
        assert_eq!(extract_token(&map), "from-header");
    }

    #[test]
    fn test_falls_back_to_cookie() {
        let map = headers(&[(COOKIE, "theme=dark; token=from-cookie")]);
        assert_eq!(extract_token(&map), "from-cookie");
    }

    #[test]
    fn test_non_bearer_header_falls_back_to_cookie() {
        let map = headers(&[(AUTHORIZATION, "Basic xyz"), (COOKIE, "token=c")]);
        assert_eq!(extract_token(&map), "c");
    }

    #[test]
    fn test_nothing_yields_empty_string() {
        assert_eq!(extract_token(&HeaderMap::new()), "");
    }

    #[test]
    fn test_debug_hides_token() {
        let user = AuthUser {
            user_id: UserId::new(),
            token: "secret.jwt".into(),
        };
        assert!(!format!("{user:?}").contains("secret.jwt"));
    }
}
