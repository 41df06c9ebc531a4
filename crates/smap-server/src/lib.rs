//! HTTP server streaming sitemaps.
//!
//! Serves a site's sitemap from the in-memory page store:
//! - `GET /sitemap.txt` - one public URL per line
//! - `GET /sitemap.xml` - sitemaps.org `<urlset>` document
//!
//! Query parameters are passed to component templates as `locals.<name>`.
//!
//! # Quick Start
//!
//! ```ignore
//! use smap_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         site_prefix: "example.com".to_owned(),
//!         site_host: "www.example.com".to_owned(),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```

mod app;
mod error;
mod handlers;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use smap_config::MetadataSource;
use smap_pipeline::{
    DEFAULT_POSTLUDE, DEFAULT_PRELUDE, MetaLookup, RecordMeta, SitemapOptions, SitemapPipeline,
    StoredMeta,
};
use smap_store::{MemoryStore, Store};
use smap_templates::{Multiplex, TemplateDir};
use state::AppState;

pub use error::ServerError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Namespace prefix of the served site.
    pub site_prefix: String,
    /// Public host of the served site.
    pub site_host: String,
    /// JSON dump loaded into the page store.
    pub dump: PathBuf,
    /// Component templates directory.
    pub templates_dir: PathBuf,
    /// Enabled template engines.
    pub engines: Vec<String>,
    /// Metadata source for the publicity check.
    pub metadata: MetadataSource,
    /// XML prelude (`None` uses the default `<urlset>` opening).
    pub prelude: Option<String>,
    /// XML postlude (`None` uses the default `</urlset>`).
    pub postlude: Option<String>,
    /// Maximum number of stored pages scanned per sitemap.
    pub limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7980,
            site_prefix: String::new(),
            site_host: String::new(),
            dump: PathBuf::from("pages.json"),
            templates_dir: PathBuf::from("components"),
            engines: vec!["jinja".to_owned(), "xml".to_owned()],
            metadata: MetadataSource::Record,
            prelude: None,
            postlude: None,
            limit: smap_pipeline::DEFAULT_LIMIT,
        }
    }
}

/// Assemble the sitemap pipeline described by `config`.
///
/// Loads the store dump and the component templates.
///
/// # Errors
///
/// Returns an error if the dump can't be loaded or the templates can't be read.
pub fn build_pipeline(config: &ServerConfig) -> Result<SitemapPipeline, ServerError> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::from_json_file(&config.dump)?);
    let multiplex = Multiplex::from_names(config.engines.as_slice())?;
    let templates = TemplateDir::load(&config.templates_dir, multiplex)?;
    tracing::info!(
        dump = %config.dump.display(),
        templates = templates.len(),
        "Loaded site"
    );

    let meta: Arc<dyn MetaLookup> = match config.metadata {
        MetadataSource::Record => Arc::new(RecordMeta),
        MetadataSource::Stored => Arc::new(StoredMeta::new(Arc::clone(&store))),
    };
    let options = SitemapOptions {
        prelude: Some(
            config
                .prelude
                .clone()
                .unwrap_or_else(|| DEFAULT_PRELUDE.to_owned()),
        ),
        postlude: Some(
            config
                .postlude
                .clone()
                .unwrap_or_else(|| DEFAULT_POSTLUDE.to_owned()),
        ),
        limit: config.limit,
    };

    Ok(SitemapPipeline::new(store)
        .with_templates(Arc::new(templates))
        .with_meta(meta)
        .with_options(options))
}

/// Run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if the site can't be loaded or the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let pipeline = build_pipeline(&config)?;

    let state = Arc::new(AppState {
        pipeline,
        site_prefix: config.site_prefix.clone(),
        site_host: config.site_host.clone(),
    });

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, site = %config.site_prefix, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from the loaded configuration.
#[must_use]
pub fn server_config_from_config(config: &smap_config::Config) -> ServerConfig {
    let sitemap = &config.sitemap_resolved;
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        site_prefix: config.site.prefix.clone(),
        site_host: config.site.host.clone(),
        dump: config.store_resolved.dump.clone(),
        templates_dir: sitemap.templates_dir.clone(),
        engines: sitemap.engines.clone(),
        metadata: sitemap.metadata,
        prelude: sitemap.prelude.clone(),
        postlude: sitemap.postlude.clone(),
        limit: sitemap.limit,
    }
}
