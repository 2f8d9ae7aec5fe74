//! CORS policy for the API.

use axum::http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Mirrors the caller's origin and allows credentialed requests.
///
/// Preflight `OPTIONS` requests are answered by the layer itself. A request
/// without an `Origin` header gets no `Access-Control-Allow-Origin` at all:
/// a wildcard cannot be sent alongside `Allow-Credentials: true`, and
/// non-browser callers do not read CORS headers.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
