//! Sitemap endpoints.
//!
//! Bodies are streamed fragment by fragment as the pipeline produces them.
//! A failure before the first fragment becomes a 500 response; a later one
//! ends the body early.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::{StreamExt, TryStreamExt, stream};
use serde_json::Value;
use smap_pipeline::{Format, PipelineError};

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /sitemap.txt.
pub(crate) async fn get_sitemap_txt(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, ServerError> {
    sitemap(&state, Format::Text, params).await
}

/// Handle GET /sitemap.xml.
pub(crate) async fn get_sitemap_xml(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Response, ServerError> {
    sitemap(&state, Format::Xml, params).await
}

async fn sitemap(
    state: &AppState,
    format: Format,
    params: BTreeMap<String, String>,
) -> Result<Response, ServerError> {
    let mut locals = state.locals();
    locals
        .extra
        .extend(params.into_iter().map(|(k, v)| (k, Value::String(v))));

    let mut fragments = state.pipeline.stream(format, &state.site_prefix, locals);
    let first = fragments.next().await.transpose()?;

    let body = stream::iter(first.map(Ok::<_, PipelineError>))
        .chain(fragments)
        .inspect_err(move |err| {
            tracing::error!(format = %format, error = %err, "Sitemap stream aborted");
        });

    Ok((
        [(header::CONTENT_TYPE, format.content_type())],
        Body::from_stream(body),
    )
        .into_response())
}
