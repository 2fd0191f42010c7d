//! Image catalog subsystem.
//!
//! # Data Flow
//! ```text
//! http::images (parse + validate)
//!     → ImagesService (list / get / upload / update / delete)
//!     → memory.rs (MemoryCatalog, DashMap keyed by image id)
//!     → app.rs (CatalogApp: snapshot load on init, save on shutdown)
//! ```
//!
//! # Design Decisions
//! - Bytes are stored as received; encoding and resizing live elsewhere
//! - Only the uploading principal may replace or delete an image

pub mod app;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::AuthorizationIdentity;
use crate::error::{Error, Result};

pub use app::CatalogApp;
pub use memory::MemoryCatalog;

pub const MIN_NAME_LEN: usize = 5;
pub const MAX_NAME_LEN: usize = 200;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Supported image encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Format::Jpeg => "jpeg",
            Format::Png => "png",
            Format::Webp => "webp",
            Format::Gif => "gif",
        };
        f.write_str(s)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Format::Jpeg),
            "png" => Ok(Format::Png),
            "webp" => Ok(Format::Webp),
            "gif" => Ok(Format::Gif),
            _ => Err(Error::invalid_argument(format!("Unsupported format {}", s))),
        }
    }
}

/// Public metadata of a stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub format: Format,
    pub owner: String,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
    pub updated_at: u64,
    pub original_size: usize,
    pub cropped_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageList {
    pub items: Vec<Image>,
    pub total: usize,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    /// Parse `asc` / `desc`, falling back to `default` for anything else.
    pub fn parse_or(value: Option<&str>, default: Order) -> Order {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "asc" => Order::Ascending,
            Some(v) if v == "desc" => Order::Descending,
            _ => default,
        }
    }
}

/// One-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub size: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Paging {
    /// Lenient query parsing: garbage or zero falls back to defaults and
    /// the size is capped at [`MAX_PAGE_SIZE`].
    pub fn from_query(page: Option<&str>, size: Option<&str>) -> Self {
        let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<u32>().ok()).filter(|n| *n > 0);
        Self {
            page: parse(page).unwrap_or(1),
            size: parse(size).unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> usize {
        self.size as usize
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.size as usize)
    }
}

/// Names are counted in characters, not bytes.
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
        return Err(Error::invalid_argument(format!(
            "Name should be between {} and {} characters",
            MIN_NAME_LEN, MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// An upload after form parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub name: String,
    pub format: Format,
    pub original: Vec<u8>,
    pub cropped: Vec<u8>,
}

impl NewImage {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if self.original.is_empty() {
            return Err(Error::invalid_argument("originalFile is empty"));
        }
        if self.cropped.is_empty() {
            return Err(Error::invalid_argument("croppedFile is empty"));
        }
        Ok(())
    }
}

/// Catalog operations the HTTP layer consumes.
#[async_trait]
pub trait ImagesService: Send + Sync + 'static {
    async fn list(&self, paging: Paging, order: Order) -> Result<ImageList>;

    async fn get_one(&self, id: &str) -> Result<Image>;

    async fn upload(&self, identity: &AuthorizationIdentity, image: NewImage) -> Result<Image>;

    async fn update(&self, identity: &AuthorizationIdentity, id: &str, image: NewImage) -> Result<Image>;

    async fn delete(&self, identity: &AuthorizationIdentity, id: &str) -> Result<()>;
}
