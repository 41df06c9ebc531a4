//! Streaming sitemap pipeline.
//!
//! Turns a site's stored pages into a sitemap without holding the page set
//! in memory. Pages flow one at a time through a chain of stages:
//!
//! ```text
//! store scan ─► parse ─► published? ─► public? ─┬─► url + "\n"                        (text)
//!                                               └─► compose ─► <url>…</url> ─► bookends (xml)
//! ```
//!
//! Each stage pulls the next upstream item only after it has decided the
//! current one, so at most one page is in flight per request. Per-item
//! decisions are [`Outcome`]s: forward, drop (recoverable, logged) or fatal
//! (ends the stream with a [`PipelineError`]).
//!
//! Collaborators are injected as traits: [`Store`](smap_store::Store) for
//! reads, [`MetaLookup`] for page metadata, [`Composer`] for component
//! resolution, and [`XmlTransform`] / [`Templates`](smap_templates::Templates)
//! for rendering.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use futures::TryStreamExt;
//! use smap_pipeline::{Locals, SitemapPipeline};
//! use smap_store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::from_json_file("pages.json".as_ref())?);
//! let pipeline = SitemapPipeline::new(store);
//! let xml: Vec<String> = pipeline.xml("example.com", Locals::default()).try_collect().await?;
//! ```

mod bookends;
mod compose;
mod error;
mod filter;
mod meta;
mod pipeline;
mod record;
mod render;
mod source;
mod stage;

pub use bookends::Bookends;
pub use compose::{ComposeError, Composer, StoreComposer, compose_pages, merge_composed};
pub use error::{DropReason, Outcome, PipelineError};
pub use filter::{filter_public, filter_published};
pub use meta::{MetaLookup, PageMeta, RecordMeta, StoredMeta};
pub use pipeline::{
    DEFAULT_LIMIT, DEFAULT_POSTLUDE, DEFAULT_PRELUDE, Format, SitemapOptions, SitemapPipeline,
    UnknownFormat,
};
pub use record::{Locals, PageRecord, SiteLocals};
pub use render::{TemplateXml, XmlTransform, component_refs, pages_to_text, pages_to_xml};
pub use source::stream_pages;

/// Stream of page records between stages.
pub type PageStream = futures::stream::BoxStream<'static, Result<PageRecord, PipelineError>>;

/// Stream of sitemap fragments (rendered pages, prelude, postlude).
pub type FragmentStream = futures::stream::BoxStream<'static, Result<String, PipelineError>>;
