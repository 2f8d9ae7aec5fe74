//! Messenger webhook: subscription handshake and event delivery.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::AppState;
use pagedesk_core::webhook::{
    SIGNATURE_HEADER, WebhookPayload, normalize, verify_signature, verify_subscription,
};
use pagedesk_db::{ConversationRepository, repositories::IngestOutcome};

/// Creates the webhook router.
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook/facebook", get(verify).post(receive))
}

/// `hub.*` parameters of the subscription handshake.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    /// Expected to be `subscribe`.
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// Must equal the configured verify token.
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    /// Echoed back on success.
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Acknowledgement body of a delivery.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct WebhookAck {
    /// Always `ok`.
    pub status: &'static str,
    /// Messages stored.
    pub processed: usize,
    /// Events with nothing to store, and redeliveries.
    pub skipped: usize,
    /// Messages that could not be stored.
    pub failed: usize,
}

/// GET /webhook/facebook - Answer the subscription handshake.
async fn verify(State(state): State<AppState>, Query(query): Query<SubscriptionQuery>) -> Response {
    match verify_subscription(
        query.mode.as_deref(),
        query.verify_token.as_deref(),
        query.challenge.as_deref(),
        &state.facebook.verify_token,
    ) {
        Some(challenge) => {
            info!("webhook subscription verified");
            challenge.to_string().into_response()
        }
        None => {
            warn!(mode = query.mode.as_deref().unwrap_or(""), "webhook verification rejected");
            let body = json!({ "error": "forbidden", "message": "Forbidden" });
            (StatusCode::FORBIDDEN, Json(body)).into_response()
        }
    }
}

/// POST /webhook/facebook - Thread every customer message of a delivery.
///
/// Failures of individual messages are logged and counted; the delivery is
/// still acknowledged so the platform does not redeliver the whole batch.
async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if state.facebook.verify_signatures {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        if !verify_signature(&state.facebook.app_secret, signature, &body) {
            warn!("webhook signature mismatch");
            return (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "invalid_signature", "message": "Invalid signature" })),
            )
                .into_response();
        }
    }

    let payload = match WebhookPayload::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "unreadable webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "invalid_payload", "message": "Malformed webhook payload" })),
            )
                .into_response();
        }
    };

    if !payload.is_page_subscription() {
        debug!(object = %payload.object, "ignoring non-page webhook");
        return Json(WebhookAck {
            status: "ok",
            ..WebhookAck::default()
        })
        .into_response();
    }

    let batch = normalize(&payload, Utc::now());
    let repo = ConversationRepository::new((*state.db).clone());
    let mut ack = WebhookAck {
        status: "ok",
        skipped: batch.skipped,
        ..WebhookAck::default()
    };

    for event in &batch.events {
        match repo.ingest(event).await {
            Ok(IngestOutcome::Stored { .. }) => ack.processed += 1,
            Ok(IngestOutcome::Duplicate) => ack.skipped += 1,
            Err(e) => {
                error!(
                    page_id = %event.page_id,
                    customer_id = %event.sender_id,
                    error = %e,
                    "failed to store webhook message"
                );
                ack.failed += 1;
            }
        }
    }

    info!(
        processed = ack.processed,
        skipped = ack.skipped,
        failed = ack.failed,
        "webhook delivery handled"
    );
    Json(ack).into_response()
}
