//! Stage outcomes and pipeline errors.

use std::fmt;

use smap_store::StoreError;
use smap_templates::TemplateError;

use crate::compose::ComposeError;

/// Systemic failure that terminates a sitemap stream.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A stored page record could not be parsed.
    #[error("Malformed page record {key}: {source}")]
    MalformedRecord {
        /// Store key of the record.
        key: String,
        /// Parse error.
        source: serde_json::Error,
    },

    /// A store read failed for a reason other than not-found.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A page reached XML rendering without a URL.
    #[error("Page {reference} has no url")]
    MissingUrl {
        /// Page reference.
        reference: String,
    },

    /// A sitemap template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Why a page was left out of the sitemap.
#[derive(Debug)]
pub enum DropReason {
    /// Reference isn't the published variant.
    Unpublished,
    /// Metadata carries no published URL.
    NoPublicUrl,
    /// No public URI index entry exists for the page's URL.
    NoPublicUri {
        /// Index key that was looked up.
        key: String,
    },
    /// The URL is served by another page (stale or superseded index).
    Superseded {
        /// Reference the index points at.
        current: String,
    },
    /// Component resolution failed.
    CompositionFailed(ComposeError),
    /// Text output needs a URL and the page has none.
    MissingUrl,
}

impl DropReason {
    /// Whether the drop hides a failure worth surfacing in logs.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CompositionFailed(_) | Self::MissingUrl)
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unpublished => write!(f, "not published"),
            Self::NoPublicUrl => write!(f, "no published url"),
            Self::NoPublicUri { key } => write!(f, "no public uri entry at {key}"),
            Self::Superseded { current } => write!(f, "url is served by {current}"),
            Self::CompositionFailed(err) => write!(f, "composition failed: {err}"),
            Self::MissingUrl => write!(f, "no url"),
        }
    }
}

/// Decision a stage makes about one item.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Pass the item downstream.
    Forward(T),
    /// Leave the item out and continue with the next one.
    Drop(DropReason),
    /// Abort the stream.
    Fatal(PipelineError),
}

impl<T> Outcome<T> {
    /// Drop the page behind `reference`, logging why.
    pub fn dropped(reference: &str, reason: DropReason) -> Self {
        if reason.is_failure() {
            tracing::warn!(reference = %reference, reason = %reason, "Dropped page from sitemap");
        } else {
            tracing::debug!(reference = %reference, reason = %reason, "Dropped page from sitemap");
        }
        Self::Drop(reason)
    }

    /// Collapse into a stream item: forwarded items and fatal errors are
    /// emitted, drops vanish.
    pub fn into_item(self) -> Option<Result<T, PipelineError>> {
        match self {
            Self::Forward(item) => Some(Ok(item)),
            Self::Drop(_) => None,
            Self::Fatal(err) => Some(Err(err)),
        }
    }
}

impl<T> From<Result<T, PipelineError>> for Outcome<T> {
    fn from(result: Result<T, PipelineError>) -> Self {
        match result {
            Ok(item) => Self::Forward(item),
            Err(err) => Self::Fatal(err),
        }
    }
}
