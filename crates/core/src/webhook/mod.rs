//! Messenger webhook handling.
//!
//! This module provides:
//! - Typed webhook payloads and their normalization into [`InboundEvent`]s
//! - `X-Hub-Signature-256` verification
//! - The `hub.*` subscription handshake check

mod payload;
mod signature;

pub use payload::{
    DEFAULT_SENDER_NAME, InboundEvent, MessagingEvent, NormalizedBatch, Participant, PayloadError,
    WebhookEntry, WebhookMessage, WebhookPayload, normalize,
};
pub use signature::{SIGNATURE_HEADER, sign_payload, verify_signature};

/// Checks a `hub.mode=subscribe` handshake and returns the challenge to echo.
///
/// Returns `None` when the mode is not `subscribe`, the verify token does
/// not match `expected_token`, or no challenge was sent.
#[must_use]
pub fn verify_subscription<'a>(
    mode: Option<&str>,
    verify_token: Option<&str>,
    challenge: Option<&'a str>,
    expected_token: &str,
) -> Option<&'a str> {
    if expected_token.is_empty() || mode != Some("subscribe") {
        return None;
    }
    if verify_token != Some(expected_token) {
        return None;
    }
    challenge
}
