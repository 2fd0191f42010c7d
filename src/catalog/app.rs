//! The catalog application driven by the orchestrator.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::catalog::MemoryCatalog;
use crate::config::CatalogConfig;
use crate::lifecycle::{App, BoxError};

/// Owns the catalog and its snapshot file.
pub struct CatalogApp {
    catalog: Arc<MemoryCatalog>,
    snapshot_path: Option<PathBuf>,
    initialized: AtomicBool,
}

impl CatalogApp {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            catalog: Arc::new(MemoryCatalog::new()),
            snapshot_path: config.snapshot_path.clone(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn catalog(&self) -> Arc<MemoryCatalog> {
        self.catalog.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl App for CatalogApp {
    async fn init(&self) -> Result<(), BoxError> {
        if let Some(path) = &self.snapshot_path {
            if tokio::fs::try_exists(path).await? {
                self.catalog.load_snapshot(path).await?;
            } else {
                tracing::info!(path = %path.display(), "No catalog snapshot yet, starting empty");
            }
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BoxError> {
        // Nothing was acquired if init never completed.
        if !self.initialized.swap(false, Ordering::SeqCst) {
            tracing::debug!("Catalog was never initialized, nothing to release");
            return Ok(());
        }
        if let Some(path) = &self.snapshot_path {
            self.catalog.save_snapshot(path).await?;
        }
        Ok(())
    }
}
