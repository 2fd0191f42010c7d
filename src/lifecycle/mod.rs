//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     App::init (bounded) → Listener::bind → spawn Listener::start
//!                                          → spawn Interrupt::wait
//!
//! Both producers → one mpsc channel (capacity 2) → read exactly once
//!
//! Shutdown (shutdown.rs, one shared deadline):
//!     Listener::shutdown (drain, force-close on deadline) → App::shutdown
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT, timer or manual trigger → LifecycleSignal::Interrupted
//! ```
//!
//! # Design Decisions
//! - Fail fast: init and bind errors are fatal, nothing is retried
//! - Listener always stops before the application releases its resources
//! - Shutdown step failures are logged, never escalated

pub mod shutdown;
pub mod signals;
pub mod startup;

use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::time::Instant;

pub use shutdown::{ShutdownReport, StepOutcome};
pub use signals::{Interrupt, TerminationSignal, Timer, Trigger};
pub use startup::{BootstrapConfig, BootstrapError, BuildInfo, Orchestrator};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Application-owned resources the orchestrator initializes and releases.
#[async_trait]
pub trait App: Send + Sync + 'static {
    /// Called exactly once, inside the init deadline.
    async fn init(&self) -> Result<(), BoxError>;

    /// Called at most once, after the listener has stopped.
    async fn shutdown(&self) -> Result<(), BoxError>;
}

/// Errors raised by a network listener.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener was started before being bound")]
    NotBound,

    #[error("serve loop failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("in-flight requests outlived the shutdown deadline and were closed")]
    DrainTimeout,
}

/// A network listener driven by the orchestrator.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Acquire the listening socket. Failure here is fatal to startup.
    async fn bind(&self) -> Result<SocketAddr, ServerError>;

    /// Serve until a fault occurs or [`Listener::shutdown`] is requested.
    async fn start(&self) -> Result<(), ServerError>;

    /// Stop accepting and let in-flight requests finish until `deadline`.
    /// Connections still open at the deadline are closed and
    /// [`ServerError::DrainTimeout`] is returned.
    async fn shutdown(&self, deadline: Instant) -> Result<(), ServerError>;
}

/// The single value read from the lifecycle channel.
#[derive(Debug)]
pub enum LifecycleSignal {
    /// The listener failed while serving.
    Fault(ServerError),
    /// The listener returned without an error.
    ListenerStopped,
    /// An interrupt source fired.
    Interrupted(String),
    /// Every producer went away without sending anything.
    ChannelClosed,
}

impl LifecycleSignal {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleSignal::Fault(_) => "fault",
            LifecycleSignal::ListenerStopped => "listener_stopped",
            LifecycleSignal::Interrupted(_) => "interrupted",
            LifecycleSignal::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleSignal::Fault(e) => write!(f, "listener fault: {}", e),
            LifecycleSignal::ListenerStopped => f.write_str("listener stopped"),
            LifecycleSignal::Interrupted(reason) => write!(f, "interrupted: {}", reason),
            LifecycleSignal::ChannelClosed => f.write_str("lifecycle channel closed"),
        }
    }
}
