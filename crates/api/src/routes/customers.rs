//! Customer profile lookup through the Graph API.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::{ApiError, AppState, middleware::AuthUser};
use pagedesk_db::PageRepository;
use pagedesk_gateway::{GatewayError, UserProfile};

/// Creates the customer router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/customers/{id}", get(get_customer))
}

/// Customer details shown next to a conversation.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CustomerView {
    /// Page-scoped customer id.
    pub id: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Full display name.
    pub name: Option<String>,
    /// Profile picture URL.
    pub avatar: Option<String>,
}

impl CustomerView {
    fn from_profile(id: &str, profile: UserProfile) -> Self {
        let name = profile.display_name();
        Self {
            id: id.to_string(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            name,
            avatar: profile.profile_pic,
        }
    }
}

/// GET /customers/{id} - Profile of a customer of the caller's page.
async fn get_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(customer_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let page = PageRepository::new((*state.db).clone())
        .find_by_user(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("No page linked"))?;

    let profile = match state
        .gateway
        .fetch_user_profile(&page.access_token, &customer_id)
        .await
    {
        Ok(profile) => profile,
        Err(e @ GatewayError::Upstream { status: 400 | 404, .. }) => {
            debug!(page_id = %page.page_id, error = %e, "customer profile not found");
            return Err(ApiError::not_found("Customer not found"));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(json!({
        "customer": CustomerView::from_profile(&customer_id, profile)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_from_profile() {
        let view = CustomerView::from_profile(
            "psid-1",
            UserProfile {
                id: "psid-1".into(),
                first_name: Some("Amit".into()),
                last_name: Some("RG".into()),
                profile_pic: Some("https://cdn.example/p.jpg".into()),
            },
        );

        assert_eq!(view.name.as_deref(), Some("Amit RG"));
        assert_eq!(view.avatar.as_deref(), Some("https://cdn.example/p.jpg"));
    }
}
