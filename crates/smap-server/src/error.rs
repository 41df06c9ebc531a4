//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use smap_pipeline::PipelineError;
use smap_store::StoreError;
use smap_templates::TemplateError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The store dump could not be loaded.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Component templates could not be loaded.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// The sitemap failed before its first fragment.
    #[error("Sitemap error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Host and port don't form a socket address.
    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        let body = json!({"error": self.to_string()});
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}
