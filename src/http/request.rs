//! Request helpers.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) as early as possible for tracing
//! - Pull the bearer token out of the `Authorization` header

use axum::http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const BEARER: &str = "bearer";

/// Sets `x-request-id` on requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Extract the token from `Bearer <token>`.
///
/// Any other shape (wrong scheme, missing or extra parts) yields `None`.
pub fn token_from_header(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim_start();
    if !scheme.eq_ignore_ascii_case(BEARER) || token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}
