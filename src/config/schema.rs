//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::auth::Role;

/// Root configuration for the image catalog service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, heartbeat).
    pub listener: ListenerConfig,

    /// HTTP surface settings.
    pub http: HttpConfig,

    /// Startup and shutdown bounds.
    pub lifecycle: LifecycleConfig,

    /// Static bearer tokens.
    pub auth: AuthConfig,

    /// Catalog persistence.
    pub catalog: CatalogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path answered with a bare 200 for liveness checks.
    pub heartbeat_path: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            heartbeat_path: "/ping".to_string(),
        }
    }
}

/// HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes (uploads included).
    pub max_body_bytes: usize,

    /// Origins allowed by CORS. Empty disables cross-origin access.
    pub cors_allow_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            max_body_bytes: 30 * 1024 * 1024,
            cors_allow_origins: Vec::new(),
        }
    }
}

/// Which interrupt source ends the process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InterruptConfig {
    /// SIGINT / SIGTERM.
    #[default]
    Signal,
    /// Fixed timer, mostly for demos and smoke tests.
    Timer { after_secs: u64 },
}

/// Lifecycle bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Deadline for application initialization in seconds.
    pub init_timeout_secs: u64,

    /// Deadline for the whole graceful shutdown sequence in seconds.
    pub shutdown_timeout_secs: u64,

    pub interrupt: InterruptConfig,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            init_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            interrupt: InterruptConfig::Signal,
        }
    }
}

/// A bearer token granted to a principal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    pub token: String,
    pub principal: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: Vec<TokenConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON snapshot loaded on init and written on shutdown.
    pub snapshot_path: Option<PathBuf>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable output instead of JSON lines.
    pub pretty: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            pretty: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_falls_back_to_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.lifecycle.init_timeout_secs, 30);
        assert_eq!(config.lifecycle.interrupt, InterruptConfig::Signal);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn parses_full_file() {
        let raw = r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [lifecycle]
            shutdown_timeout_secs = 5
            interrupt = { kind = "timer", after_secs = 10 }

            [[auth.tokens]]
            token = "secret"
            principal = "alice"
            role = "admin"

            [catalog]
            snapshot_path = "/tmp/catalog.json"
        "#;
        let config: ServiceConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.listener.heartbeat_path, "/ping");
        assert_eq!(config.lifecycle.shutdown_timeout_secs, 5);
        assert_eq!(config.lifecycle.init_timeout_secs, 30);
        assert_eq!(config.lifecycle.interrupt, InterruptConfig::Timer { after_secs: 10 });
        assert_eq!(config.auth.tokens[0].role, Role::Admin);
        assert_eq!(
            config.catalog.snapshot_path.as_deref(),
            Some(std::path::Path::new("/tmp/catalog.json"))
        );
    }
}
