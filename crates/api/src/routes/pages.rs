//! Linked page routes.

use axum::{Json, Router, extract::State, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::{ApiError, AppState, middleware::AuthUser};
use pagedesk_db::{PageRepository, repositories::LinkPageInput};

/// Creates the page router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/facebook/page",
        get(get_page).post(save_page).delete(delete_page),
    )
}

/// Body of a manual page link.
#[derive(Debug, Default, Deserialize)]
pub struct SavePageRequest {
    /// External page id.
    #[serde(default)]
    pub page_id: String,
    /// Page name; looked up through the Graph API when blank.
    #[serde(default)]
    pub page_name: String,
    /// Page access token.
    #[serde(default)]
    pub access_token: String,
}

/// GET /facebook/page - The caller's linked page, or `null`.
async fn get_page(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Value>, ApiError> {
    let page = PageRepository::new((*state.db).clone())
        .find_by_user(auth.user_id())
        .await?;

    Ok(Json(json!({ "page": page })))
}

/// POST /facebook/page - Link a page manually, replacing any linked page.
async fn save_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SavePageRequest>,
) -> Result<Json<Value>, ApiError> {
    let page_id = payload.page_id.trim();
    let access_token = payload.access_token.trim();
    if page_id.is_empty() || access_token.is_empty() {
        return Err(ApiError::validation("Missing fields"));
    }

    let page_name = if payload.page_name.trim().is_empty() {
        match state.gateway.fetch_page_info(access_token, page_id).await {
            Ok(info) => info.name,
            Err(e) => {
                warn!(user_id = %auth.user_id(), page_id, error = %e, "page lookup failed");
                return Err(ApiError::validation("Missing fields"));
            }
        }
    } else {
        payload.page_name.trim().to_string()
    };

    let page = PageRepository::new((*state.db).clone())
        .upsert_for_user(
            auth.user_id(),
            LinkPageInput {
                page_id: page_id.to_string(),
                page_name,
                access_token: access_token.to_string(),
            },
        )
        .await?;

    Ok(Json(json!({ "message": "Page connected", "page": page })))
}

/// DELETE /facebook/page - Unlink the caller's page. Conversations are kept.
async fn delete_page(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    PageRepository::new((*state.db).clone())
        .delete_for_user(auth.user_id())
        .await?;

    Ok(Json(
        json!({ "message": "Page integration deleted successfully" }),
    ))
}
