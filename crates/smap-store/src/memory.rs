//! In-memory store backend.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;

use crate::store::{Entry, EntryStream, Store, StoreError, StoreErrorKind};

const BACKEND: &str = "Memory";

/// Key-ordered in-memory store.
///
/// Range scans are lazy: each poll of the stream returned by [`Store::list`]
/// looks up the next key after the last one produced, so writes made while a
/// scan is in flight are visible to the remainder of that scan.
///
/// Cloning is cheap and clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder form of [`MemoryStore::insert`]).
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an entry.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a store from a JSON dump.
    ///
    /// The dump is a single JSON object mapping keys to values. String values
    /// are stored verbatim; any other value is stored as its JSON text, so
    /// page and component documents can be written inline.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file can't be read or isn't a JSON object.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::io(e, Some(path.display().to_string())))?;
        Self::from_json_str(&content).map_err(|e| e.with_key(path.display().to_string()))
    }

    /// Load a store from JSON dump text. See [`MemoryStore::from_json_file`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the text isn't a JSON object.
    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let dump: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)
            .map_err(|e| {
                StoreError::new(StoreErrorKind::Other)
                    .with_backend(BACKEND)
                    .with_source(e)
            })?;

        let entries: BTreeMap<String, String> = dump
            .into_iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect();

        tracing::debug!(entries = entries.len(), "Loaded store dump");
        Ok(Self {
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    /// Next entry strictly after `cursor` (or at/after `prefix` when starting)
    /// that still carries the prefix.
    fn next_after(&self, prefix: &str, cursor: Option<&str>) -> Option<Entry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let lower = match cursor {
            Some(key) => Bound::Excluded(key.to_owned()),
            None => Bound::Included(prefix.to_owned()),
        };
        let upper: Bound<String> = Bound::Unbounded;

        entries
            .range((lower, upper))
            .next()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| Entry {
                key: key.clone(),
                value: value.clone(),
            })
    }
}

/// Cursor state carried between polls of a scan.
struct Scan {
    store: MemoryStore,
    prefix: String,
    cursor: Option<String>,
    remaining: usize,
}

#[async_trait]
impl Store for MemoryStore {
    fn list(&self, prefix: &str, limit: usize) -> EntryStream {
        let scan = Scan {
            store: self.clone(),
            prefix: prefix.to_owned(),
            cursor: None,
            remaining: limit,
        };

        stream::unfold(scan, |mut scan| async move {
            if scan.remaining == 0 {
                return None;
            }
            let entry = scan
                .store
                .next_after(&scan.prefix, scan.cursor.as_deref())?;
            scan.cursor = Some(entry.key.clone());
            scan.remaining -= 1;
            Some((Ok(entry), scan))
        })
        .boxed()
    }

    async fn get(&self, key: &str) -> Result<String, StoreError> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key).with_backend(BACKEND))
    }
}
