//! Mock store implementation for testing.
//!
//! Provides [`MockStore`] for unit testing pipelines against injected
//! failures, with a log of every key the consumer actually pulled.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::StreamExt;

use crate::memory::MemoryStore;
use crate::store::{EntryStream, Store, StoreError, StoreErrorKind};

const BACKEND: &str = "Mock";

/// A single store access, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// An entry was pulled from a range scan.
    Scan(String),
    /// A point lookup was issued.
    Get(String),
}

/// Mock store for testing.
///
/// Holds entries in a [`MemoryStore`] and records accesses. Use the builder
/// methods to configure data and failures.
///
/// # Example
///
/// ```ignore
/// use smap_store::{MockStore, StoreErrorKind};
///
/// let store = MockStore::new()
///     .with_entry("site/_pages/a@published", r#"{"url":"http://a"}"#)
///     .with_failure("site/_uris/YQ==", StoreErrorKind::Unavailable);
/// ```
#[derive(Debug, Default)]
pub struct MockStore {
    inner: MemoryStore,
    failures: Arc<RwLock<HashMap<String, StoreErrorKind>>>,
    log: Arc<RwLock<Vec<Access>>>,
}

impl MockStore {
    /// Create a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.insert(key, value);
        self
    }

    /// Make every access to `key` fail with `kind`.
    ///
    /// Applies to point lookups and to the key being pulled from a scan.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, key: impl Into<String>, kind: StoreErrorKind) -> Self {
        self.failures.write().unwrap().insert(key.into(), kind);
        self
    }

    /// Accesses recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn accesses(&self) -> Vec<Access> {
        self.log.read().unwrap().clone()
    }

    /// Keys of point lookups recorded so far.
    #[must_use]
    pub fn gets(&self) -> Vec<String> {
        self.accesses()
            .into_iter()
            .filter_map(|access| match access {
                Access::Get(key) => Some(key),
                Access::Scan(_) => None,
            })
            .collect()
    }

    fn failure(failures: &RwLock<HashMap<String, StoreErrorKind>>, key: &str) -> Option<StoreError> {
        failures.read().unwrap().get(key).map(|kind| {
            StoreError::new(*kind)
                .with_key(key)
                .with_backend(BACKEND)
        })
    }
}

#[async_trait]
impl Store for MockStore {
    fn list(&self, prefix: &str, limit: usize) -> EntryStream {
        let failures = Arc::clone(&self.failures);
        let log = Arc::clone(&self.log);

        self.inner
            .list(prefix, limit)
            .map(move |entry| {
                let entry = entry?;
                log.write().unwrap().push(Access::Scan(entry.key.clone()));
                match Self::failure(&failures, &entry.key) {
                    Some(err) => Err(err),
                    None => Ok(entry),
                }
            })
            .boxed()
    }

    async fn get(&self, key: &str) -> Result<String, StoreError> {
        self.log.write().unwrap().push(Access::Get(key.to_owned()));
        if let Some(err) = Self::failure(&self.failures, key) {
            return Err(err);
        }
        self.inner
            .get(key)
            .await
            .map_err(|err| StoreError::new(err.kind).with_key(key).with_backend(BACKEND))
    }
}
