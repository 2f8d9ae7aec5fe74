//! Facebook Login redirect and callback.
//!
//! The OAuth `state` parameter carries the caller's session token, so the
//! callback can tell which user is connecting a page. Callback failures never
//! surface as error pages: the browser is sent back to `/integration` with an
//! `error` reason.

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{AppState, middleware::extract_token};
use pagedesk_db::{PageRepository, repositories::LinkPageInput};

/// Creates the OAuth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/facebook", get(start))
        .route("/auth/facebook/callback", get(callback))
}

/// `302 Found` to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Query of the redirect route.
#[derive(Debug, Deserialize)]
pub struct StartQuery {
    /// Session token to carry through the dialog.
    pub token: Option<String>,
}

/// GET /auth/facebook - Redirect to the OAuth dialog.
///
/// The token comes from `?token=`, falling back to the request's own session.
async fn start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StartQuery>,
) -> Response {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| extract_token(&headers));
    found(&state.gateway.authorization_url(&token))
}

/// Query of the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code.
    pub code: Option<String>,
    /// The session token sent as `state`.
    pub state: Option<String>,
    /// Set when the user cancelled the dialog.
    pub error: Option<String>,
}

/// Why a callback did not link a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackFailure {
    AccessDenied,
    NoCode,
    InvalidState,
    ExchangeFailed,
    NoPage,
    Internal,
}

impl CallbackFailure {
    const fn reason(self) -> &'static str {
        match self {
            Self::AccessDenied => "access_denied",
            Self::NoCode => "no_code",
            Self::InvalidState => "invalid_state",
            Self::ExchangeFailed => "exchange_failed",
            Self::NoPage => "no_page",
            Self::Internal => "callback_failed",
        }
    }
}

/// GET /auth/facebook/callback - Exchange the code and link the first managed page.
async fn callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    let target = match link_page(&state, query).await {
        Ok(()) => state.settings.url("/integration?success=true"),
        Err(failure) => {
            warn!(reason = failure.reason(), "facebook callback failed");
            state
                .settings
                .url(&format!("/integration?error={}", failure.reason()))
        }
    };
    found(&target)
}

async fn link_page(state: &AppState, query: CallbackQuery) -> Result<(), CallbackFailure> {
    if query.error.is_some() {
        return Err(CallbackFailure::AccessDenied);
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or(CallbackFailure::NoCode)?;

    let user_id = state
        .sessions()
        .verify_token(query.state.as_deref().unwrap_or_default())
        .await
        .map_err(|e| {
            error!(error = %e, "session lookup failed during callback");
            CallbackFailure::Internal
        })?
        .ok_or(CallbackFailure::InvalidState)?;

    let user_token = state.gateway.exchange_code(&code).await.map_err(|e| {
        warn!(user_id = %user_id, error = %e, "oauth code exchange failed");
        CallbackFailure::ExchangeFailed
    })?;

    let pages = state
        .gateway
        .fetch_managed_pages(&user_token.access_token)
        .await
        .map_err(|e| {
            warn!(user_id = %user_id, error = %e, "fetching managed pages failed");
            CallbackFailure::ExchangeFailed
        })?;
    let page = pages.into_iter().next().ok_or(CallbackFailure::NoPage)?;

    let saved = PageRepository::new((*state.db).clone())
        .upsert_for_user(
            user_id,
            LinkPageInput {
                page_id: page.id,
                page_name: page.name,
                access_token: page.access_token,
            },
        )
        .await
        .map_err(|e| {
            error!(user_id = %user_id, error = %e, "saving linked page failed");
            CallbackFailure::Internal
        })?;

    info!(user_id = %user_id, page_id = %saved.page_id, "page connected via oauth");
    Ok(())
}
