//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize the application inside a bounded scope
//! - Bind the listener, then serve it in the background
//! - Race the listener against the interrupt source on one channel
//! - Hand the winning signal to the graceful shutdown sequence
//!
//! # Design Decisions
//! - Fail fast: init timeout, init error and bind error are fatal
//! - Listeners start last (traffic only when ready)
//! - The channel is read once; late writers fail fast instead of blocking

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::{InterruptConfig, LifecycleConfig};
use crate::lifecycle::shutdown::{shutdown_gracefully, ShutdownReport};
use crate::lifecycle::signals::{Interrupt, TerminationSignal, Timer};
use crate::lifecycle::{App, BoxError, LifecycleSignal, Listener, ServerError};
use crate::observability::metrics;

/// Room for both producers, so neither ever waits on the reader.
const SIGNAL_CAPACITY: usize = 2;

const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable orchestrator settings.
#[derive(Clone)]
pub struct BootstrapConfig {
    init_timeout: Duration,
    shutdown_timeout: Duration,
    interrupt: Arc<dyn Interrupt>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            init_timeout: DEFAULT_INIT_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            interrupt: Arc::new(TerminationSignal),
        }
    }
}

impl fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("init_timeout", &self.init_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish_non_exhaustive()
    }
}

impl BootstrapConfig {
    pub fn from_config(config: &LifecycleConfig) -> Self {
        let base = Self::default()
            .with_init_timeout(Duration::from_secs(config.init_timeout_secs))
            .with_shutdown_timeout(Duration::from_secs(config.shutdown_timeout_secs));
        match config.interrupt {
            InterruptConfig::Signal => base,
            InterruptConfig::Timer { after_secs } => {
                base.with_interrupt(Timer(Duration::from_secs(after_secs)))
            }
        }
    }

    /// Zero is ignored so the timeout stays strictly positive.
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            tracing::warn!("Ignoring zero init timeout, keeping {:?}", self.init_timeout);
        } else {
            self.init_timeout = timeout;
        }
        self
    }

    /// Zero is ignored so the timeout stays strictly positive.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        if timeout.is_zero() {
            tracing::warn!("Ignoring zero shutdown timeout, keeping {:?}", self.shutdown_timeout);
        } else {
            self.shutdown_timeout = timeout;
        }
        self
    }

    pub fn with_interrupt(mut self, interrupt: impl Interrupt) -> Self {
        self.interrupt = Arc::new(interrupt);
        self
    }

    pub fn init_timeout(&self) -> Duration {
        self.init_timeout
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

/// Version metadata logged at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_date: &'static str,
    pub git_commit: &'static str,
}

impl BuildInfo {
    /// Values baked in at compile time (`BUILD_DATE`, `GIT_COMMIT`).
    pub fn from_env() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
            git_commit: option_env!("GIT_COMMIT").unwrap_or("unknown"),
        }
    }
}

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("application init did not finish within {0:?}")]
    InitTimeout(Duration),

    #[error("failed initializing app: {0}")]
    Init(#[source] BoxError),

    #[error("failed starting the server: {0}")]
    ListenerStart(#[source] ServerError),
}

/// Drives one application through init, serving and shutdown.
pub struct Orchestrator {
    config: BootstrapConfig,
    build: BuildInfo,
}

impl Orchestrator {
    pub fn new(config: BootstrapConfig, build: BuildInfo) -> Self {
        Self { config, build }
    }

    /// Run until the first lifecycle signal, then shut down.
    ///
    /// Returns an error only for fatal startup failures; in that case the
    /// listener was never started and the application is not shut down.
    pub async fn run<A, L>(&self, app: Arc<A>, listener: Arc<L>) -> Result<ShutdownReport, BootstrapError>
    where
        A: App,
        L: Listener,
    {
        tracing::info!(
            version = self.build.version,
            build_date = self.build.build_date,
            git_commit = self.build.git_commit,
            "Build"
        );

        tracing::info!(timeout = ?self.config.init_timeout, "Initializing app");
        match tokio::time::timeout(self.config.init_timeout, app.init()).await {
            Ok(Ok(())) => tracing::info!("App initialized"),
            Ok(Err(e)) => return Err(BootstrapError::Init(e)),
            Err(_) => return Err(BootstrapError::InitTimeout(self.config.init_timeout)),
        }

        let address = listener.bind().await.map_err(BootstrapError::ListenerStart)?;
        tracing::info!(address = %address, "Listening for connections");

        let (tx, mut rx) = mpsc::channel(SIGNAL_CAPACITY);

        let serving = {
            let listener = listener.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let signal = match listener.start().await {
                    Ok(()) => LifecycleSignal::ListenerStopped,
                    Err(e) => LifecycleSignal::Fault(e),
                };
                let _ = tx.send(signal).await;
            })
        };

        let interrupting = {
            let interrupt = self.config.interrupt.clone();
            let tx = tx.clone();
            tokio::spawn(async move { interrupt.wait(tx).await })
        };
        drop(tx);

        let signal = rx.recv().await.unwrap_or(LifecycleSignal::ChannelClosed);
        // Later writers now fail immediately instead of waiting for a reader.
        drop(rx);

        metrics::record_lifecycle_signal(signal.label());
        tracing::info!(reason = %signal, "Closing server");

        let report = shutdown_gracefully(
            app.as_ref(),
            listener.as_ref(),
            serving,
            self.config.shutdown_timeout,
            signal,
        )
        .await;
        interrupting.abort();

        tracing::info!(listener = ?report.listener, app = ?report.app, "Shutdown complete");
        Ok(report)
    }
}
