//! Authenticator backed by a static token table from configuration.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::auth::{AuthError, Authenticator, Role, TokenValidation};
use crate::config::TokenConfig;

#[derive(Debug, Clone)]
struct Grant {
    principal: String,
    role: Role,
}

/// Resolves tokens from a fixed table. A token is valid for a role only if
/// it was granted exactly that role.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    grants: HashMap<String, Grant>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(tokens: &[TokenConfig]) -> Self {
        tokens.iter().fold(Self::new(), |auth, t| {
            auth.with_token(&t.token, &t.principal, t.role)
        })
    }

    pub fn with_token(mut self, token: &str, principal: &str, role: Role) -> Self {
        self.grants.insert(
            token.to_string(),
            Grant {
                principal: principal.to_string(),
                role,
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn is_token_valid(&self, token: &str, role: Role) -> Result<TokenValidation, AuthError> {
        match self.grants.get(token) {
            Some(grant) if grant.role == role => Ok(TokenValidation::Valid {
                principal: grant.principal.clone(),
            }),
            _ => Ok(TokenValidation::Invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_with_matching_role_is_valid() {
        let auth = StaticTokenAuthenticator::new().with_token("t1", "alice", Role::Admin);
        let result = auth.is_token_valid("t1", Role::Admin).await.unwrap();
        assert_eq!(result, TokenValidation::Valid { principal: "alice".into() });
    }

    #[tokio::test]
    async fn role_mismatch_and_unknown_token_are_invalid() {
        let auth = StaticTokenAuthenticator::new().with_token("t1", "bob", Role::User);
        assert_eq!(auth.is_token_valid("t1", Role::Admin).await.unwrap(), TokenValidation::Invalid);
        assert_eq!(auth.is_token_valid("nope", Role::User).await.unwrap(), TokenValidation::Invalid);
    }

    #[test]
    fn builds_from_config() {
        let auth = StaticTokenAuthenticator::from_config(&[
            TokenConfig { token: "a".into(), principal: "alice".into(), role: Role::Admin },
            TokenConfig { token: "b".into(), principal: "bob".into(), role: Role::User },
        ]);
        assert_eq!(auth.len(), 2);
    }
}
