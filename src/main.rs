//! Image catalog service.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                    IMAGE CATALOG                     │
//!                 │                                                      │
//!   Request       │  ┌─────────┐   ┌────────────┐   ┌─────────────────┐  │
//!   ──────────────┼─▶│  http   │──▶│ authorize  │──▶│ images handlers │  │
//!                 │  │ server  │   │ (writes)   │   └────────┬────────┘  │
//!                 │  └─────────┘   └────────────┘            │           │
//!                 │                                          ▼           │
//!   Response      │  ┌──────────────┐                ┌──────────────┐    │
//!   ◀─────────────┼──│ error        │◀───────────────│   catalog    │    │
//!                 │  │ classifier   │                │  (memory)    │    │
//!                 │  └──────────────┘                └──────────────┘    │
//!                 │                                                      │
//!                 │  lifecycle: init → serve ⇄ interrupt → shutdown      │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use image_catalog::auth::StaticTokenAuthenticator;
use image_catalog::catalog::CatalogApp;
use image_catalog::config::{load_config, ServiceConfig};
use image_catalog::http::HttpServer;
use image_catalog::lifecycle::{BootstrapConfig, BuildInfo, Orchestrator};
use image_catalog::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "image-catalog")]
#[command(about = "Image catalog service", long_about = None)]
struct Args {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Human-readable logs instead of JSON.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed loading {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if args.pretty {
        config.observability.pretty = true;
    }

    logging::init_logging(&config.observability);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let authenticator = Arc::new(StaticTokenAuthenticator::from_config(&config.auth.tokens));
    if authenticator.is_empty() {
        tracing::warn!("No auth tokens configured; every protected route will answer 401");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        init_timeout_secs = config.lifecycle.init_timeout_secs,
        shutdown_timeout_secs = config.lifecycle.shutdown_timeout_secs,
        "Configuration loaded"
    );

    let app = Arc::new(CatalogApp::new(&config.catalog));
    let server = Arc::new(HttpServer::new(&config, app.catalog(), authenticator));
    let orchestrator = Orchestrator::new(
        BootstrapConfig::from_config(&config.lifecycle),
        BuildInfo::from_env(),
    );

    match orchestrator.run(app, server).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal startup failure");
            ExitCode::FAILURE
        }
    }
}
