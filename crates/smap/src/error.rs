//! CLI error types.

use smap_config::ConfigError;
use smap_pipeline::PipelineError;
use smap_server::ServerError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("Sitemap generation aborted: {0}")]
    Pipeline(#[from] PipelineError),
}
