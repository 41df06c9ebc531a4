//! Pipeline assembly.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::StreamExt;
use smap_store::Store;
use smap_templates::{Multiplex, TemplateDir, Templates};

use crate::bookends::Bookends;
use crate::compose::{Composer, StoreComposer, compose_pages};
use crate::filter::{filter_public, filter_published};
use crate::meta::{MetaLookup, RecordMeta};
use crate::record::Locals;
use crate::render::{TemplateXml, XmlTransform, pages_to_text, pages_to_xml};
use crate::source::stream_pages;
use crate::stage::stop_after_error;
use crate::{FragmentStream, PageStream};

/// Default XML prelude: declaration and opening `<urlset>`.
pub const DEFAULT_PRELUDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#;

/// Default XML postlude.
pub const DEFAULT_POSTLUDE: &str = "</urlset>";

/// Default cap on pages read per sitemap (the sitemaps.org per-file limit).
pub const DEFAULT_LIMIT: usize = 50_000;

/// Sitemap output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One URL per line.
    Text,
    /// sitemaps.org `<urlset>` document.
    Xml,
}

impl Format {
    /// HTTP content type of the format.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain; charset=utf-8",
            Self::Xml => "text/xml; charset=utf-8",
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Error parsing a [`Format`].
#[derive(Debug, thiserror::Error)]
#[error("Unknown sitemap format: {0} (expected txt or xml)")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "txt" | "text" => Ok(Self::Text),
            "xml" => Ok(Self::Xml),
            other => Err(UnknownFormat(other.to_owned())),
        }
    }
}

/// Sitemap output options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapOptions {
    /// Text emitted before the first XML fragment.
    pub prelude: Option<String>,
    /// Text emitted after the last XML fragment.
    pub postlude: Option<String>,
    /// Maximum number of stored pages scanned.
    pub limit: usize,
}

impl Default for SitemapOptions {
    fn default() -> Self {
        Self {
            prelude: Some(DEFAULT_PRELUDE.to_owned()),
            postlude: Some(DEFAULT_POSTLUDE.to_owned()),
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Assembles sitemap streams from injected collaborators.
///
/// Text: pages → published → public → `url\n`.
/// XML: pages → published → public → compose → `<url>` → prelude/postlude.
///
/// Every stream returned ends right after its first error.
pub struct SitemapPipeline {
    store: Arc<dyn Store>,
    meta: Arc<dyn MetaLookup>,
    composer: Arc<dyn Composer>,
    xml: Arc<dyn XmlTransform>,
    options: SitemapOptions,
}

impl SitemapPipeline {
    /// Pipeline over `store` with default collaborators: metadata read from
    /// the records, components resolved from the store, and no component
    /// templates (`<loc>`/`<lastmod>` only).
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            meta: Arc::new(RecordMeta),
            composer: Arc::new(StoreComposer::new(Arc::clone(&store))),
            xml: Arc::new(TemplateXml::new(Arc::new(TemplateDir::empty(
                Multiplex::default(),
            )))),
            options: SitemapOptions::default(),
            store,
        }
    }

    /// Render component output with `templates`.
    #[must_use]
    pub fn with_templates(mut self, templates: Arc<dyn Templates>) -> Self {
        self.xml = Arc::new(TemplateXml::new(templates));
        self
    }

    /// Replace the metadata lookup.
    #[must_use]
    pub fn with_meta(mut self, meta: Arc<dyn MetaLookup>) -> Self {
        self.meta = meta;
        self
    }

    /// Replace the composer.
    #[must_use]
    pub fn with_composer(mut self, composer: Arc<dyn Composer>) -> Self {
        self.composer = composer;
        self
    }

    /// Replace the per-page XML renderer entirely.
    #[must_use]
    pub fn with_xml_transform(mut self, xml: Arc<dyn XmlTransform>) -> Self {
        self.xml = xml;
        self
    }

    /// Set output options.
    #[must_use]
    pub fn with_options(mut self, options: SitemapOptions) -> Self {
        self.options = options;
        self
    }

    /// Current output options.
    #[must_use]
    pub fn options(&self) -> &SitemapOptions {
        &self.options
    }

    /// Published pages of a site whose public URL resolves to them.
    pub fn public_pages(&self, site_prefix: &str) -> PageStream {
        let pages = stream_pages(self.store.as_ref(), site_prefix, self.options.limit);
        let published = filter_published(pages);
        filter_public(published, Arc::clone(&self.store), Arc::clone(&self.meta))
    }

    /// Text sitemap of a site.
    pub fn text(&self, site_prefix: &str) -> FragmentStream {
        tracing::debug!(site = %site_prefix, "Streaming text sitemap");
        stop_after_error(pages_to_text(self.public_pages(site_prefix)))
    }

    /// XML sitemap of a site.
    pub fn xml(&self, site_prefix: &str, locals: Locals) -> FragmentStream {
        tracing::debug!(site = %site_prefix, "Streaming XML sitemap");
        let locals = Arc::new(locals);
        let composed = compose_pages(
            self.public_pages(site_prefix),
            Arc::clone(&self.composer),
            Arc::clone(&locals),
        );
        let fragments = pages_to_xml(composed, Arc::clone(&self.xml), locals);
        let wrapped = Bookends::new(
            fragments,
            self.options.prelude.clone(),
            self.options.postlude.clone(),
        );
        stop_after_error(wrapped.boxed())
    }

    /// Sitemap of a site in `format`.
    pub fn stream(&self, format: Format, site_prefix: &str, locals: Locals) -> FragmentStream {
        match format {
            Format::Text => self.text(site_prefix),
            Format::Xml => self.xml(site_prefix, locals),
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;
    use smap_store::{MockStore, StoreErrorKind};

    use super::*;
    use crate::error::PipelineError;
    use crate::record::PageRecord;

    // YS5jb20vYg== is base64("a.com/b")
    fn store() -> MockStore {
        MockStore::new()
            .with_entry(
                "site/_pages/b",
                r#"{"url": "http://a.com/b", "main": ["site/_components/article/instances/x"]}"#,
            )
            .with_entry(
                "site/_pages/b@published",
                r#"{"url": "http://a.com/b", "lastModified": 1451606400000, "main": ["site/_components/article/instances/x"]}"#,
            )
            .with_entry("site/_components/article/instances/x", r#"{"title": "Hello"}"#)
            .with_entry("site/_uris/YS5jb20vYg==", "site/_pages/b")
    }

    fn pipeline(store: MockStore) -> SitemapPipeline {
        let templates = TemplateDir::empty(Multiplex::default()).with_template(
            "article",
            "sitemap",
            "jinja",
            "<news>{{ title }}</news>",
        );
        SitemapPipeline::new(Arc::new(store)).with_templates(Arc::new(templates))
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("txt".parse::<Format>().unwrap(), Format::Text);
        assert_eq!("xml".parse::<Format>().unwrap(), Format::Xml);
        assert_eq!(
            "html".parse::<Format>().unwrap_err().to_string(),
            "Unknown sitemap format: html (expected txt or xml)"
        );
        assert_eq!(Format::Xml.content_type(), "text/xml; charset=utf-8");
    }

    #[tokio::test]
    async fn test_text_sitemap() {
        let out: Vec<String> = pipeline(store()).text("site").try_collect().await.unwrap();

        assert_eq!(out, vec!["http://a.com/b\n"]);
    }

    #[tokio::test]
    async fn test_xml_sitemap() {
        let out: Vec<String> = pipeline(store())
            .xml("site", Locals::for_site("site", "a.com"))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(
            out,
            vec![
                DEFAULT_PRELUDE.to_owned(),
                "<url><loc>http://a.com/b</loc><lastmod>2016-01-01T00:00:00.000Z</lastmod><news>Hello</news></url>"
                    .to_owned(),
                DEFAULT_POSTLUDE.to_owned(),
            ]
        );
    }

    #[tokio::test]
    async fn test_xml_sitemap_bad_lastmod_keeps_other_pages() {
        // YS5jb20vYQ== is base64("a.com/a")
        let store = MockStore::new()
            .with_entry(
                "site/_pages/a@published",
                r#"{"url": "http://a.com/a", "lastModified": 1451606400000.0}"#,
            )
            .with_entry(
                "site/_pages/b@published",
                r#"{"url": "http://a.com/b", "lastModified": "not a date"}"#,
            )
            .with_entry("site/_pages/c@published", r#"{"url": "http://a.com/c"}"#)
            .with_entry("site/_uris/YS5jb20vYQ==", "site/_pages/a")
            .with_entry("site/_uris/YS5jb20vYg==", "site/_pages/b")
            .with_entry("site/_uris/YS5jb20vYw==", "site/_pages/c");

        let out: Vec<String> = pipeline(store)
            .xml("site", Locals::default())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(
            out,
            vec![
                DEFAULT_PRELUDE,
                "<url><loc>http://a.com/a</loc><lastmod>2016-01-01T00:00:00.000Z</lastmod></url>",
                "<url><loc>http://a.com/b</loc></url>",
                "<url><loc>http://a.com/c</loc></url>",
                DEFAULT_POSTLUDE,
            ]
        );
    }

    #[tokio::test]
    async fn test_xml_sitemap_without_pages() {
        let out: Vec<String> = pipeline(MockStore::new())
            .stream(Format::Xml, "site", Locals::default())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(out, vec![DEFAULT_PRELUDE, DEFAULT_POSTLUDE]);
    }

    #[tokio::test]
    async fn test_xml_sitemap_custom_bookends() {
        let options = SitemapOptions {
            prelude: Some("<urlset>".to_owned()),
            postlude: None,
            ..SitemapOptions::default()
        };

        let out: Vec<String> = pipeline(store())
            .with_options(options)
            .xml("site", Locals::default())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0], "<urlset>");
    }

    #[tokio::test]
    async fn test_composition_failure_drops_page() {
        let store = store().with_failure("site/_components/article/instances/x", StoreErrorKind::Timeout);

        let out: Vec<String> = pipeline(store)
            .xml("site", Locals::default())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(out, vec![DEFAULT_PRELUDE, DEFAULT_POSTLUDE]);
    }

    #[tokio::test]
    async fn test_fatal_error_ends_stream() {
        let store = store().with_failure("site/_uris/YS5jb20vYg==", StoreErrorKind::Unavailable);

        let out: Vec<_> = pipeline(store).xml("site", Locals::default()).collect().await;

        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(PipelineError::Store(_))));
    }

    struct LocOnly;

    impl XmlTransform for LocOnly {
        fn page_xml(&self, page: &PageRecord, _locals: &Locals) -> Result<String, PipelineError> {
            Ok(format!("<u>{}</u>", page.reference))
        }
    }

    #[tokio::test]
    async fn test_custom_xml_transform() {
        let options = SitemapOptions {
            prelude: None,
            postlude: None,
            ..SitemapOptions::default()
        };

        let out: Vec<String> = pipeline(store())
            .with_xml_transform(Arc::new(LocOnly))
            .with_options(options)
            .xml("site", Locals::default())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(out, vec!["<u>site/_pages/b@published</u>"]);
    }
}
