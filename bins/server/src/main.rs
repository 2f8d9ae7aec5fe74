//! Pagedesk API Server
//!
//! Main entry point for the Pagedesk backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagedesk_api::{AppState, create_router};
use pagedesk_db::{PoolOptions, connect_with};
use pagedesk_gateway::{GraphClient, GraphConfig};
use pagedesk_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagedesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_with(
        &config.database.url,
        PoolOptions {
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
        },
    )
    .await
    .context("failed to connect to database")?;
    info!("Connected to database");

    let graph_config = GraphConfig::from_app_config(&config);
    info!(
        api_version = %graph_config.api_version,
        redirect_uri = %graph_config.redirect_uri,
        "Graph API client configured"
    );
    let gateway = GraphClient::new(graph_config)?;

    if !config.facebook.verify_signatures {
        info!("webhook signature verification is disabled");
    }

    let state = AppState::new(&config, db, Arc::new(gateway));
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
