//! Application state.
//!
//! Shared state for all request handlers.

use smap_pipeline::{Locals, SitemapPipeline};

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Assembled sitemap pipeline.
    pub(crate) pipeline: SitemapPipeline,
    /// Namespace prefix of the served site.
    pub(crate) site_prefix: String,
    /// Public host of the served site.
    pub(crate) site_host: String,
}

impl AppState {
    /// Request context for the served site.
    pub(crate) fn locals(&self) -> Locals {
        Locals::for_site(self.site_prefix.clone(), self.site_host.clone())
    }
}
