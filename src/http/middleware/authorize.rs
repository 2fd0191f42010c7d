//! Authorization gateway.
//!
//! Wraps protected routes. Each request is either authenticated (an
//! [`AuthorizationIdentity`] is put into its extensions and the handler
//! runs) or rejected with 401 before the handler is reached.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{Authenticator, AuthorizationIdentity, Role, TokenValidation};
use crate::error::Error;
use crate::http::error::ApiError;
use crate::http::request::token_from_header;
use crate::http::response::{failure, UNAUTHORIZED};
use crate::observability::metrics;

/// State required by [`authorize`]: who validates, and for which role.
#[derive(Clone)]
pub struct AuthorizeState {
    authenticator: Arc<dyn Authenticator>,
    role: Role,
}

impl AuthorizeState {
    pub fn new(authenticator: Arc<dyn Authenticator>, role: Role) -> Self {
        Self {
            authenticator,
            role,
        }
    }
}

pub async fn authorize(
    State(gate): State<AuthorizeState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let Some(token) = token_from_header(&header) else {
        tracing::debug!("Missing or malformed authorization header");
        return reject("missing_token");
    };

    let outcome = gate.authenticator.is_token_valid(token, gate.role).await;
    match outcome {
        Ok(TokenValidation::Valid { principal }) => {
            tracing::debug!(principal = %principal, role = %gate.role, "Request authorized");
            req.extensions_mut().insert(AuthorizationIdentity {
                header,
                principal,
                role: gate.role,
            });
            next.run(req).await
        }
        Ok(TokenValidation::Invalid) => reject("invalid_token"),
        Err(e) => {
            tracing::warn!(error = %e, "Failed token validation");
            reject("validation_error")
        }
    }
}

fn reject(reason: &'static str) -> Response {
    metrics::record_auth_rejection(reason);
    failure(StatusCode::UNAUTHORIZED, UNAUTHORIZED)
}

/// Handlers behind [`authorize`] take the identity as an extractor.
///
/// A missing identity means the route was wired without the gateway; the
/// request fails with 500 and the handler body never runs.
impl<S> FromRequestParts<S> for AuthorizationIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthorizationIdentity>()
            .cloned()
            .ok_or_else(|| {
                ApiError(Error::Other(
                    "authorization identity missing from request scope".into(),
                ))
            })
    }
}
