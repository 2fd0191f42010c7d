//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <token>
//!     → http::middleware::authorize (extract token)
//!     → Authenticator::is_token_valid (validate token + role)
//!     → AuthorizationIdentity (request extensions)
//!     → protected handler
//! ```
//!
//! # Design Decisions
//! - Role checks are delegated to the authenticator; the gateway only
//!   passes the required role through
//! - Identities live for a single request and are never persisted

pub mod static_tokens;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use static_tokens::StaticTokenAuthenticator;

/// Capability tag granted to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

/// Identity resolved by the authorization gateway for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationIdentity {
    /// Raw `Authorization` header as presented by the caller.
    pub header: String,
    /// Principal the token resolved to.
    pub principal: String,
    /// Role the route required and the token was validated against.
    pub role: Role,
}

/// Outcome of a token check that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValidation {
    Valid { principal: String },
    Invalid,
}

/// Errors raised while validating a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authenticator backend unavailable: {0}")]
    Unavailable(String),
}

/// Validates bearer tokens against a required role.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    /// Check `token` for `role`. Transport or storage failures are errors;
    /// a well-formed "no" is [`TokenValidation::Invalid`].
    async fn is_token_valid(&self, token: &str, role: Role) -> Result<TokenValidation, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_rejects_unknown_names() {
        assert_eq!(serde_json::from_str::<Role>("\"user\"").unwrap(), Role::User);
        assert!(serde_json::from_str::<Role>("\"root\"").is_err());
    }

    #[test]
    fn role_display_matches_serde_name() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, format!("\"{}\"", Role::Admin));
    }
}
