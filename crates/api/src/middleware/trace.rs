//! Request tracing with credentials scrubbed from the logged URI.
//!
//! Session tokens, OAuth codes and webhook verify tokens all travel in query
//! strings. The request span records the path and parameter names, with the
//! values of those parameters replaced.

use axum::http::{Request, Uri};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{MakeSpan, TraceLayer},
};
use tracing::Span;

/// Query parameters whose values never reach the logs.
const REDACTED_PARAMS: &[&str] = &["token", "state", "code", "access_token", "hub.verify_token"];

const REDACTED: &str = "[redacted]";

/// Builds the HTTP trace layer used by the router.
#[must_use]
pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RedactedSpan> {
    TraceLayer::new_for_http().make_span_with(RedactedSpan)
}

/// Opens a `request` span per request with a redacted URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedactedSpan;

impl<B> MakeSpan<B> for RedactedSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::debug_span!(
            "request",
            method = %request.method(),
            uri = %redacted_uri(request.uri()),
            version = ?request.version(),
        )
    }
}

/// Path and query of `uri` with sensitive parameter values replaced.
#[must_use]
pub fn redacted_uri(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };

    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if REDACTED_PARAMS.contains(&name) => format!("{name}={REDACTED}"),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", uri.path(), pairs.join("&"))
}
