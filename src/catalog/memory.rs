//! In-memory catalog with JSON snapshot persistence.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::auth::AuthorizationIdentity;
use crate::catalog::{Image, ImageList, ImagesService, NewImage, Order, Paging};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredImage {
    /// Insertion order; breaks ties between equal timestamps.
    seq: u64,
    meta: Image,
    original: Vec<u8>,
    cropped: Vec<u8>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// A thread-safe image catalog kept in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    images: DashMap<String, StoredImage>,
    next_seq: AtomicU64,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Replace the contents with a snapshot written by [`Self::save_snapshot`].
    pub async fn load_snapshot(&self, path: &Path) -> Result<usize> {
        let raw = tokio::fs::read(path).await?;
        let stored: Vec<StoredImage> = serde_json::from_slice(&raw)?;

        self.images.clear();
        let mut max_seq = 0;
        for image in stored {
            max_seq = max_seq.max(image.seq + 1);
            self.images.insert(image.meta.id.clone(), image);
        }
        self.next_seq.store(max_seq, Ordering::SeqCst);

        tracing::info!(count = self.images.len(), path = %path.display(), "Loaded catalog snapshot");
        Ok(self.images.len())
    }

    pub async fn save_snapshot(&self, path: &Path) -> Result<usize> {
        let stored: Vec<StoredImage> = self.images.iter().map(|r| r.value().clone()).collect();
        let raw = serde_json::to_vec(&stored)?;
        tokio::fs::write(path, raw).await?;

        tracing::info!(count = stored.len(), path = %path.display(), "Saved catalog snapshot");
        Ok(stored.len())
    }

    fn owned_by(&self, identity: &AuthorizationIdentity, id: &str) -> Result<()> {
        let entry = self.images.get(id).ok_or(Error::NotFound)?;
        if entry.meta.owner != identity.principal {
            tracing::debug!(image_id = %id, principal = %identity.principal, "Not the owner");
            return Err(Error::Forbidden);
        }
        Ok(())
    }
}

#[async_trait]
impl ImagesService for MemoryCatalog {
    async fn list(&self, paging: Paging, order: Order) -> Result<ImageList> {
        let mut all: Vec<(u64, u64, Image)> = self
            .images
            .iter()
            .map(|r| (r.value().meta.created_at, r.value().seq, r.value().meta.clone()))
            .collect();
        all.sort_by_key(|(created, seq, _)| (*created, *seq));
        if order == Order::Descending {
            all.reverse();
        }

        let total = all.len();
        let items = all
            .into_iter()
            .skip(paging.offset())
            .take(paging.limit())
            .map(|(_, _, image)| image)
            .collect();

        Ok(ImageList {
            items,
            total,
            page: paging.page,
            size: paging.size,
        })
    }

    async fn get_one(&self, id: &str) -> Result<Image> {
        self.images
            .get(id)
            .map(|r| r.value().meta.clone())
            .ok_or(Error::NotFound)
    }

    async fn upload(&self, identity: &AuthorizationIdentity, image: NewImage) -> Result<Image> {
        image.validate()?;

        let now = now_secs();
        let meta = Image {
            id: Uuid::new_v4().to_string(),
            name: image.name,
            format: image.format,
            owner: identity.principal.clone(),
            created_at: now,
            updated_at: now,
            original_size: image.original.len(),
            cropped_size: image.cropped.len(),
        };
        let stored = StoredImage {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            meta: meta.clone(),
            original: image.original,
            cropped: image.cropped,
        };
        self.images.insert(meta.id.clone(), stored);

        tracing::info!(image_id = %meta.id, owner = %meta.owner, format = %meta.format, "Image uploaded");
        Ok(meta)
    }

    async fn update(&self, identity: &AuthorizationIdentity, id: &str, image: NewImage) -> Result<Image> {
        image.validate()?;
        self.owned_by(identity, id)?;

        let mut entry = self.images.get_mut(id).ok_or(Error::NotFound)?;
        let stored = entry.value_mut();
        stored.meta.name = image.name;
        stored.meta.format = image.format;
        stored.meta.updated_at = now_secs();
        stored.meta.original_size = image.original.len();
        stored.meta.cropped_size = image.cropped.len();
        stored.original = image.original;
        stored.cropped = image.cropped;

        tracing::info!(image_id = %id, "Image updated");
        Ok(stored.meta.clone())
    }

    async fn delete(&self, identity: &AuthorizationIdentity, id: &str) -> Result<()> {
        self.owned_by(identity, id)?;
        self.images.remove(id);
        tracing::info!(image_id = %id, principal = %identity.principal, "Image deleted");
        Ok(())
    }
}
