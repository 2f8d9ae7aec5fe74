//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for auth, page linking, the webhook and the inbox
//! - Session token issuance and verification
//! - Authentication and CORS middleware
//! - The JSON error envelope

pub mod error;
pub mod middleware;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::{
    Router,
    http::header::{AUTHORIZATION, COOKIE},
};
use pagedesk_gateway::MessagingGateway;
use pagedesk_shared::{
    AppConfig, JwtConfig, JwtService,
    config::{AppSettings, FacebookConfig},
};
use sea_orm::DatabaseConnection;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;

pub use error::ApiError;
pub use session::SessionService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for session tokens.
    pub jwt_service: Arc<JwtService>,
    /// Graph API adapter.
    pub gateway: Arc<dyn MessagingGateway>,
    /// Public application settings (base URL, environment).
    pub settings: Arc<AppSettings>,
    /// Facebook app settings (webhook verify token, app secret).
    pub facebook: Arc<FacebookConfig>,
}

impl AppState {
    /// Builds the state from loaded configuration and constructed collaborators.
    #[must_use]
    pub fn new(
        config: &AppConfig,
        db: DatabaseConnection,
        gateway: Arc<dyn MessagingGateway>,
    ) -> Self {
        let jwt_service = JwtService::new(JwtConfig {
            secret: config.auth.secret.clone(),
            token_expires_days: config.auth.token_ttl_days,
        });

        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            gateway,
            settings: Arc::new(config.app.clone()),
            facebook: Arc::new(config.facebook.clone()),
        }
    }

    /// Session service bound to this state's pool and signer.
    #[must_use]
    pub fn sessions(&self) -> SessionService {
        SessionService::new(Arc::clone(&self.jwt_service), (*self.db).clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(middleware::trace::trace_layer())
        .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION, COOKIE]))
        .layer(middleware::cors::cors_layer())
        .with_state(state)
}
