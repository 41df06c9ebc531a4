//! Page metadata lookup.
//!
//! The publicity filter needs a page's public URL and whether it is
//! published. [`RecordMeta`] reads both from the record itself;
//! [`StoredMeta`] reads a separate `<page>/meta` entry from the store.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use smap_store::{Store, StoreError, StoreErrorKind, references};

use crate::record::PageRecord;

/// Public URL and publication state of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    /// Public URL, if the page has one.
    pub url: Option<String>,
    /// Whether the page is currently published.
    pub published: bool,
}

impl PageMeta {
    /// URL under which the page is publicly served, if any.
    #[must_use]
    pub fn published_url(&self) -> Option<&str> {
        if !self.published {
            return None;
        }
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Metadata lookup capability.
#[async_trait]
pub trait MetaLookup: Send + Sync {
    /// Fetch metadata for a page.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the lookup fails. A not-found error means the
    /// page has no metadata and is treated as unpublished by callers.
    async fn page_meta(&self, page: &PageRecord) -> Result<PageMeta, StoreError>;
}

/// Metadata taken from the record: `url` from its data, `published` from its reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMeta;

#[async_trait]
impl MetaLookup for RecordMeta {
    async fn page_meta(&self, page: &PageRecord) -> Result<PageMeta, StoreError> {
        Ok(PageMeta {
            url: page.url().map(str::to_owned),
            published: references::is_published(&page.reference),
        })
    }
}

/// Metadata stored as JSON `{url, published}` at `<page reference without version>/meta`.
pub struct StoredMeta {
    store: Arc<dyn Store>,
}

impl StoredMeta {
    /// Create a lookup reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Key of the metadata entry for a page reference.
    #[must_use]
    pub fn meta_key(reference: &str) -> String {
        format!("{}/meta", references::base(reference))
    }
}

#[async_trait]
impl MetaLookup for StoredMeta {
    async fn page_meta(&self, page: &PageRecord) -> Result<PageMeta, StoreError> {
        let key = Self::meta_key(&page.reference);
        let raw = match self.store.get(&key).await {
            Ok(raw) => raw,
            Err(err) if err.is_not_found() => return Ok(PageMeta::default()),
            Err(err) => return Err(err),
        };

        serde_json::from_str(&raw).map_err(|err| {
            StoreError::new(StoreErrorKind::Other)
                .with_key(key)
                .with_source(err)
        })
    }
}
