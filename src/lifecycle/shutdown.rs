//! Shutdown coordination.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

use crate::lifecycle::{App, LifecycleSignal, Listener, ServerError};

/// How one shutdown step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Failed(String),
    TimedOut,
}

/// What the shutdown sequence did and why it ran.
#[derive(Debug)]
pub struct ShutdownReport {
    pub reason: LifecycleSignal,
    pub listener: StepOutcome,
    pub app: StepOutcome,
}

/// Stop the listener, then the application, under one shared deadline.
///
/// Both steps are always attempted. A step that starts after the deadline
/// still gets polled once before it is abandoned.
pub async fn shutdown_gracefully<A, L>(
    app: &A,
    listener: &L,
    serving: JoinHandle<()>,
    timeout: Duration,
    reason: LifecycleSignal,
) -> ShutdownReport
where
    A: App + ?Sized,
    L: Listener + ?Sized,
{
    tracing::info!(timeout = ?timeout, "Gracefully shutting down");
    let deadline = Instant::now() + timeout;

    let listener_outcome = match timeout_at(deadline, listener.shutdown(deadline)).await {
        Ok(Ok(())) => {
            tracing::info!("HTTP server gracefully shut down");
            StepOutcome::Completed
        }
        Ok(Err(ServerError::DrainTimeout)) | Err(_) => {
            tracing::warn!("Server drain exceeded the shutdown deadline, forcing close");
            StepOutcome::TimedOut
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Error shutting down the server");
            StepOutcome::Failed(e.to_string())
        }
    };
    // The listener closed its connections; drop the serve task as well.
    serving.abort();

    let app_outcome = match timeout_at(deadline, app.shutdown()).await {
        Ok(Ok(())) => {
            tracing::info!("Application shut down successfully");
            StepOutcome::Completed
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Error shutting down the application");
            StepOutcome::Failed(e.to_string())
        }
        Err(_) => {
            tracing::warn!("Application shutdown exceeded the shutdown deadline");
            StepOutcome::TimedOut
        }
    };

    ShutdownReport {
        reason,
        listener: listener_outcome,
        app: app_outcome,
    }
}
