//! Configuration validation.
//!
//! Semantic checks only; serde handles the syntax. Returns every
//! violation, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{InterruptConfig, ServiceConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} '{value}' is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("heartbeat path '{0}' must start with '/'")]
    HeartbeatPath(String),

    #[error("auth token for principal '{0}' is empty")]
    EmptyToken(String),

    #[error("auth token for principal '{0}' is declared more than once")]
    DuplicateToken(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if !config.listener.heartbeat_path.starts_with('/') {
        errors.push(ValidationError::HeartbeatPath(config.listener.heartbeat_path.clone()));
    }

    let durations = [
        ("http.request_timeout_secs", config.http.request_timeout_secs),
        ("lifecycle.init_timeout_secs", config.lifecycle.init_timeout_secs),
        ("lifecycle.shutdown_timeout_secs", config.lifecycle.shutdown_timeout_secs),
    ];
    for (field, secs) in durations {
        if secs == 0 {
            errors.push(ValidationError::ZeroDuration { field });
        }
    }
    if let InterruptConfig::Timer { after_secs: 0 } = config.lifecycle.interrupt {
        errors.push(ValidationError::ZeroDuration { field: "lifecycle.interrupt.after_secs" });
    }

    let mut seen = HashSet::new();
    for token in &config.auth.tokens {
        if token.token.is_empty() {
            errors.push(ValidationError::EmptyToken(token.principal.clone()));
        } else if !seen.insert(token.token.as_str()) {
            errors.push(ValidationError::DuplicateToken(token.principal.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::config::schema::TokenConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.lifecycle.init_timeout_secs = 0;
        config.lifecycle.shutdown_timeout_secs = 0;
        config.auth.tokens = vec![
            TokenConfig { token: "x".into(), principal: "a".into(), role: Role::Admin },
            TokenConfig { token: "x".into(), principal: "b".into(), role: Role::User },
            TokenConfig { token: "".into(), principal: "c".into(), role: Role::User },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroDuration { field: "lifecycle.init_timeout_secs" }));
        assert!(errors.contains(&ValidationError::DuplicateToken("b".into())));
        assert!(errors.contains(&ValidationError::EmptyToken("c".into())));
    }

    #[test]
    fn zero_timer_is_rejected() {
        let mut config = ServiceConfig::default();
        config.lifecycle.interrupt = InterruptConfig::Timer { after_secs: 0 };
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::ZeroDuration { field: "lifecycle.interrupt.after_secs" }]
        );
    }
}
