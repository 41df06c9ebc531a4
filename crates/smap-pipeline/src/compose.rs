//! Page composition: resolving component references into their data.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use smap_store::{Store, StoreError, references};

use crate::PageStream;
use crate::error::{DropReason, Outcome};
use crate::record::{Locals, PageRecord};
use crate::stage::gate;

/// Key under which a resolved component keeps its own reference.
pub(crate) const REF_KEY: &str = "_ref";

/// Maximum nesting of components inside components.
const MAX_DEPTH: usize = 32;

/// Composition failure. Drops the page, never the stream.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// A component could not be read.
    #[error("Failed to read component {reference}: {source}")]
    Component {
        /// Component reference.
        reference: String,
        /// Store error.
        source: StoreError,
    },

    /// A component's stored data isn't a JSON object.
    #[error("Malformed component {reference}: {source}")]
    MalformedComponent {
        /// Component reference.
        reference: String,
        /// Parse error.
        source: serde_json::Error,
    },

    /// Components nest deeper than the composer allows (likely a cycle).
    #[error("Component nesting too deep at {reference}")]
    TooDeep {
        /// Reference at which the limit was hit.
        reference: String,
    },

    /// Failure reported by a custom composer.
    #[error("{0}")]
    Other(String),
}

/// Composition capability: expand a page's component references.
#[async_trait]
pub trait Composer: Send + Sync {
    /// Compose page data into a full document.
    ///
    /// The result is merged over the original data with [`merge_composed`],
    /// so it doesn't need to carry page configuration fields.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError`] if any reference fails to resolve.
    async fn compose_page(
        &self,
        data: &Map<String, Value>,
        locals: &Locals,
    ) -> Result<Map<String, Value>, ComposeError>;
}

/// Merge a composed document over the original page data.
///
/// Composed keys win; keys only present in the original survive.
#[must_use]
pub fn merge_composed(
    mut original: Map<String, Value>,
    composed: Map<String, Value>,
) -> Map<String, Value> {
    original.extend(composed);
    original
}

/// Replace each page's data with its composed document.
///
/// Pages that fail to compose are dropped with a warning.
pub fn compose_pages(
    upstream: PageStream,
    composer: Arc<dyn Composer>,
    locals: Arc<Locals>,
) -> PageStream {
    gate(upstream, move |page: PageRecord| {
        let composer = Arc::clone(&composer);
        let locals = Arc::clone(&locals);
        async move {
            match composer.compose_page(&page.data, &locals).await {
                Ok(composed) => Outcome::Forward(PageRecord {
                    data: merge_composed(page.data, composed),
                    reference: page.reference,
                }),
                Err(err) => Outcome::dropped(&page.reference, DropReason::CompositionFailed(err)),
            }
        }
    })
}

/// Composer reading component data from the store.
///
/// Areas of the page are top-level values that are a component reference or
/// a list of them. Each reference is replaced by the component's stored JSON
/// with a `_ref` key added, and nested `{"_ref": …}` placeholders inside
/// components are expanded the same way. Only areas appear in the result.
pub struct StoreComposer {
    store: Arc<dyn Store>,
}

impl StoreComposer {
    /// Create a composer reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn resolve(&self, reference: String, depth: usize) -> BoxFuture<'_, Result<Value, ComposeError>> {
        Box::pin(async move {
            if depth > MAX_DEPTH {
                return Err(ComposeError::TooDeep { reference });
            }

            let raw = self
                .store
                .get(&reference)
                .await
                .map_err(|source| ComposeError::Component {
                    reference: reference.clone(),
                    source,
                })?;
            let data: Map<String, Value> =
                serde_json::from_str(&raw).map_err(|source| ComposeError::MalformedComponent {
                    reference: reference.clone(),
                    source,
                })?;

            let mut resolved = Map::new();
            resolved.insert(REF_KEY.to_owned(), Value::String(reference));
            for (key, value) in data {
                if key == REF_KEY {
                    continue;
                }
                resolved.insert(key, self.expand(value, depth + 1).await?);
            }
            Ok(Value::Object(resolved))
        })
    }

    fn expand(&self, value: Value, depth: usize) -> BoxFuture<'_, Result<Value, ComposeError>> {
        Box::pin(async move {
            match value {
                Value::Object(map) => {
                    if let Some(reference) = placeholder(&map) {
                        return self.resolve(reference.to_owned(), depth).await;
                    }
                    let mut expanded = Map::new();
                    for (key, value) in map {
                        expanded.insert(key, self.expand(value, depth).await?);
                    }
                    Ok(Value::Object(expanded))
                }
                Value::Array(items) => {
                    let mut expanded = Vec::with_capacity(items.len());
                    for item in items {
                        expanded.push(self.expand(item, depth).await?);
                    }
                    Ok(Value::Array(expanded))
                }
                other => Ok(other),
            }
        })
    }
}

/// Reference of an unresolved `{"_ref": "<component>"}` placeholder.
fn placeholder(map: &Map<String, Value>) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    map.get(REF_KEY)
        .and_then(Value::as_str)
        .filter(|reference| references::is_component(reference))
}

fn is_area(value: &Value) -> bool {
    match value {
        Value::String(s) => references::is_component(s),
        Value::Array(items) => {
            !items.is_empty()
                && items
                    .iter()
                    .all(|item| item.as_str().is_some_and(references::is_component))
        }
        _ => false,
    }
}

#[async_trait]
impl Composer for StoreComposer {
    async fn compose_page(
        &self,
        data: &Map<String, Value>,
        _locals: &Locals,
    ) -> Result<Map<String, Value>, ComposeError> {
        let mut composed = Map::new();
        for (area, value) in data.iter().filter(|(_, value)| is_area(value)) {
            let resolved = match value {
                Value::Array(items) => {
                    let mut components = Vec::with_capacity(items.len());
                    for reference in items.iter().filter_map(Value::as_str) {
                        components.push(self.resolve(reference.to_owned(), 0).await?);
                    }
                    Value::Array(components)
                }
                Value::String(reference) => self.resolve(reference.clone(), 0).await?,
                _ => continue,
            };
            composed.insert(area.clone(), resolved);
        }
        Ok(composed)
    }
}
