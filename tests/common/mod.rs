//! Shared fakes for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use image_catalog::auth::{AuthError, Authenticator, Role, TokenValidation};
use image_catalog::lifecycle::{App, BoxError, Listener, ServerError};

/// Ordered record of lifecycle calls shared by the fakes.
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<&'static str>>>);

impl Events {
    pub fn push(&self, event: &'static str) {
        self.0.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.snapshot().iter().position(|e| *e == event)
    }
}

#[derive(Default)]
pub struct FakeApp {
    pub events: Events,
    pub init_delay: Duration,
    pub fail_init: bool,
    pub shutdown_delay: Duration,
    pub fail_shutdown: bool,
    pub init_calls: AtomicUsize,
    pub shutdown_calls: AtomicUsize,
}

impl FakeApp {
    pub fn new(events: Events) -> Self {
        Self { events, ..Default::default() }
    }
}

#[async_trait]
impl App for FakeApp {
    async fn init(&self) -> Result<(), BoxError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.events.push("app.init");
        tokio::time::sleep(self.init_delay).await;
        if self.fail_init {
            return Err("database unreachable".into());
        }
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.events.push("app.shutdown");
        tokio::time::sleep(self.shutdown_delay).await;
        if self.fail_shutdown {
            return Err("pool close failed".into());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeListener {
    pub events: Events,
    pub fail_bind: bool,
    /// `start` fails after this delay instead of serving until stopped.
    pub fault_after: Option<Duration>,
    pub drain_delay: Duration,
    pub bind_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub shutdown_calls: AtomicUsize,
    pub stop: Notify,
}

impl FakeListener {
    pub fn new(events: Events) -> Self {
        Self { events, ..Default::default() }
    }
}

#[async_trait]
impl Listener for FakeListener {
    async fn bind(&self) -> Result<SocketAddr, ServerError> {
        self.bind_calls.fetch_add(1, Ordering::SeqCst);
        self.events.push("listener.bind");
        if self.fail_bind {
            return Err(ServerError::Bind {
                address: "127.0.0.1:1".into(),
                source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
            });
        }
        Ok("127.0.0.1:0".parse().unwrap())
    }

    async fn start(&self) -> Result<(), ServerError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.events.push("listener.start");
        match self.fault_after {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                Err(ServerError::Serve(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "accept loop died",
                )))
            }
            None => {
                self.stop.notified().await;
                Ok(())
            }
        }
    }

    async fn shutdown(&self, _deadline: Instant) -> Result<(), ServerError> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.events.push("listener.shutdown");
        tokio::time::sleep(self.drain_delay).await;
        self.stop.notify_one();
        Ok(())
    }
}

/// Authenticator with a fixed token table that records every call.
#[derive(Default)]
pub struct FakeAuthenticator {
    tokens: HashMap<String, String>,
    failing_token: Option<String>,
    pub calls: AtomicUsize,
    pub roles: Mutex<Vec<Role>>,
}

impl FakeAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, principal: &str) -> Self {
        self.tokens.insert(token.into(), principal.into());
        self
    }

    /// Presenting this token makes the backend fail.
    pub fn failing_on(mut self, token: &str) -> Self {
        self.failing_token = Some(token.into());
        self
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn is_token_valid(&self, token: &str, role: Role) -> Result<TokenValidation, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.roles.lock().unwrap().push(role);
        if self.failing_token.as_deref() == Some(token) {
            return Err(AuthError::Unavailable("session store timed out at 10.0.0.7".into()));
        }
        Ok(match self.tokens.get(token) {
            Some(principal) => TokenValidation::Valid { principal: principal.clone() },
            None => TokenValidation::Invalid,
        })
    }
}

pub const BOUNDARY: &str = "catalog-test-boundary";

/// Build a `multipart/form-data` body from text fields and file parts.
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
