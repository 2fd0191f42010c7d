//! Response envelope.
//!
//! Every failure leaves the service as `{"err": "<message>"}` with an
//! `application/json` content type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const UNAUTHORIZED: &str = "Unauthorized";
pub const FORBIDDEN: &str = "Forbidden";
pub const NOT_FOUND: &str = "Not found";
pub const SERVER_ERROR: &str = "Server error";
pub const REQUEST_TIMEOUT: &str = "Request timeout";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub err: String,
}

impl FailureResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { err: msg.into() }
    }
}

/// Write a failure envelope with the given status.
pub fn failure(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(FailureResponse::new(msg))).into_response()
}
