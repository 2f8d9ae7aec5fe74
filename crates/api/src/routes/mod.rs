//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod auth;
pub mod conversations;
pub mod customers;
pub mod health;
pub mod oauth;
pub mod pages;
pub mod webhook;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require a session
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(pages::routes())
        .merge(conversations::routes())
        .merge(customers::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes: health, credentials, OAuth redirects and the webhook
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(oauth::routes())
        .merge(webhook::routes())
        .merge(protected_routes)
}
