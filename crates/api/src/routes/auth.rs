//! Authentication routes: register, login, current user, logout.

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    ApiError, AppState,
    middleware::{AuthUser, SESSION_COOKIE},
};
use pagedesk_core::auth::{hash_password, needs_rehash, verify_password};
use pagedesk_db::UserRepository;
use pagedesk_shared::{
    auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo},
    types::UserId,
};

/// Creates the public auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Creates the auth routes that need a session.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}

/// Renders the `Set-Cookie` value carrying a session token.
///
/// A `max_age_secs` of 0 clears the cookie.
pub(crate) fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build();
    format!("{cookie}; Max-Age={max_age_secs}")
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("invalid_credentials", "Invalid email or password")
}

/// POST /auth/register - Create an agent account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.validate()?;
    let user_repo = UserRepository::new((*state.db).clone());

    let password_hash = hash_password(&payload.password)?;
    let user = user_repo
        .create(&payload.name, &email, &password_hash)
        .await?;

    info!(user_id = %user.id, "new user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "user": UserInfo {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        })),
    ))
}

/// POST /auth/login - Verify credentials, issue a session token and set the cookie.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.validate()?;
    let user_repo = UserRepository::new((*state.db).clone());

    let Some(user) = user_repo.find_by_email(&email).await? else {
        info!("login attempt for unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "failed login attempt");
        return Err(invalid_credentials());
    }

    let user_id = UserId::from_uuid(user.id);
    if needs_rehash(&user.password_hash) {
        match hash_password(&payload.password) {
            Ok(upgraded) => {
                if let Err(e) = user_repo.update_password_hash(user_id, &upgraded).await {
                    warn!(user_id = %user_id, error = %e, "failed to upgrade password hash");
                }
            }
            Err(e) => warn!(user_id = %user_id, error = %e, "failed to rehash password"),
        }
    }

    let sessions = state.sessions();
    let signed = sessions.issue_token(user_id).await?;
    let expires_in = sessions.token_expires_in();
    let cookie = session_cookie(&signed.token, expires_in, state.settings.secure_cookies());

    info!(user_id = %user_id, "user logged in");

    Ok((
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: signed.token,
            user: UserInfo {
                id: user.id,
                name: user.name,
                email: user.email,
            },
            expires_in,
        }),
    ))
}

/// GET /auth/me - The authenticated user.
async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserInfo>, ApiError> {
    let user = UserRepository::new((*state.db).clone())
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("User profile not found"))?;

    Ok(Json(UserInfo {
        id: user.id,
        name: user.name,
        email: user.email,
    }))
}

/// POST /auth/logout - Revoke the current session and clear the cookie.
async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions().revoke_token(auth.token()).await?;
    info!(user_id = %auth.user_id(), "user logged out");

    let cookie = session_cookie("", 0, state.settings.secure_cookies());
    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({ "message": "Logged out" })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def", 604_800, false);

        assert!(cookie.starts_with("token=abc.def"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.ends_with("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_secure_flag_in_production() {
        assert!(session_cookie("abc", 10, true).contains("Secure"));
    }

    #[test]
    fn test_clearing_cookie() {
        let cookie = session_cookie("", 0, false);
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.ends_with("Max-Age=0"));
    }
}
