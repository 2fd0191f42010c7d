//! Interrupt sources.
//!
//! An [`Interrupt`] blocks until its termination condition occurs, writes
//! exactly one [`LifecycleSignal::Interrupted`] and returns. The orchestrator
//! does not care which implementation is installed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use crate::lifecycle::LifecycleSignal;

/// Produces the interrupt that starts graceful shutdown.
#[async_trait]
pub trait Interrupt: Send + Sync + 'static {
    /// Wait for the termination condition, then send one signal on `tx`.
    async fn wait(&self, tx: mpsc::Sender<LifecycleSignal>);
}

/// SIGINT / SIGTERM (Ctrl-C on non-Unix targets).
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminationSignal;

#[cfg(unix)]
async fn termination() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = terminate.recv() => Ok("SIGTERM"),
        _ = interrupt.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}

#[async_trait]
impl Interrupt for TerminationSignal {
    async fn wait(&self, tx: mpsc::Sender<LifecycleSignal>) {
        match termination().await {
            Ok(name) => {
                tracing::info!(signal = name, "Shutdown signal received");
                let _ = tx.send(LifecycleSignal::Interrupted(name.to_string())).await;
            }
            Err(e) => {
                // Without handlers only a listener fault can end the process.
                tracing::error!(error = %e, "Failed to install signal handlers");
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Fires once after a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct Timer(pub Duration);

#[async_trait]
impl Interrupt for Timer {
    async fn wait(&self, tx: mpsc::Sender<LifecycleSignal>) {
        tokio::time::sleep(self.0).await;
        tracing::info!(after = ?self.0, "Shutdown timer elapsed");
        let _ = tx
            .send(LifecycleSignal::Interrupted(format!("timer elapsed after {:?}", self.0)))
            .await;
    }
}

/// Fires when [`Trigger::fire`] is called on any clone.
///
/// A fire that happens before the orchestrator starts waiting is kept.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    notify: Arc<Notify>,
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.notify.notify_one();
    }
}

#[async_trait]
impl Interrupt for Trigger {
    async fn wait(&self, tx: mpsc::Sender<LifecycleSignal>) {
        self.notify.notified().await;
        tracing::info!("Shutdown triggered");
        let _ = tx.send(LifecycleSignal::Interrupted("manual trigger".to_string())).await;
    }
}
