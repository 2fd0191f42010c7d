//! Error classification at the HTTP boundary.
//!
//! Handlers never format their own failures: they return [`ApiError`] and
//! this module turns it into a status code and a safe body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{Error, ErrorKind};
use crate::http::response::{FailureResponse, FORBIDDEN, NOT_FOUND, SERVER_ERROR};
use crate::observability::metrics;

/// Map an error to its status code and response body.
///
/// Only `InvalidArgument` echoes caller-supplied text; every other branch
/// uses a fixed message.
pub fn classify(err: &Error) -> (StatusCode, FailureResponse) {
    match err.kind() {
        ErrorKind::Forbidden => (StatusCode::FORBIDDEN, FailureResponse::new(FORBIDDEN)),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, FailureResponse::new(NOT_FOUND)),
        ErrorKind::InvalidArgument(reason) => (StatusCode::BAD_REQUEST, FailureResponse::new(reason)),
        ErrorKind::Unclassified => (
            StatusCode::INTERNAL_SERVER_ERROR,
            FailureResponse::new(SERVER_ERROR),
        ),
    }
}

fn kind_label(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Forbidden => "forbidden",
        ErrorKind::NotFound => "not_found",
        ErrorKind::InvalidArgument(_) => "invalid_argument",
        ErrorKind::Unclassified => "unclassified",
    }
}

/// Handler error; converts into a classified JSON response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        if kind == ErrorKind::Unclassified {
            tracing::error!(error = %self.0, detail = ?self.0, "Unhandled error");
        }
        metrics::record_http_error(kind_label(&kind));

        let (status, body) = classify(&self.0);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_map_to_4xx() {
        assert_eq!(classify(&Error::Forbidden), (StatusCode::FORBIDDEN, FailureResponse::new("Forbidden")));
        assert_eq!(classify(&Error::NotFound), (StatusCode::NOT_FOUND, FailureResponse::new("Not found")));
        assert_eq!(
            classify(&Error::invalid_argument("x")),
            (StatusCode::BAD_REQUEST, FailureResponse::new("x"))
        );
    }

    #[test]
    fn internal_detail_never_reaches_the_body() {
        let err = Error::Storage("connection to 10.0.0.3:5432 refused".into());
        let (status, body) = classify(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.err, "Server error");
    }

    #[tokio::test]
    async fn api_error_writes_json_envelope() {
        let response = ApiError(Error::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: FailureResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, FailureResponse::new("Not found"));
    }
}
