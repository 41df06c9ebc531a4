//! Store trait and error types.
//!
//! Provides the core [`Store`] trait for reading page records and index
//! entries, along with [`StoreError`] for unified error handling across
//! backends.

use async_trait::async_trait;
use futures::stream::BoxStream;

/// A raw key/value pair returned by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Store key (e.g. `"example.com/_pages/home@published"`).
    pub key: String,
    /// Serialized value as stored.
    pub value: String,
}

/// Lazy sequence of scanned entries.
pub type EntryStream = BoxStream<'static, Result<Entry, StoreError>>;

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// Key does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Malformed key.
    InvalidKey,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Operation timed out.
    Timeout,
    /// Other/unknown error category.
    Other,
}

/// Store error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StoreError {
    /// Semantic error category.
    pub kind: StoreErrorKind,
    /// Key context (if applicable).
    pub key: Option<String>,
    /// Backend identifier (e.g., "Memory", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Create a new store error.
    #[must_use]
    pub fn new(kind: StoreErrorKind) -> Self {
        Self {
            kind,
            key: None,
            backend: None,
            source: None,
        }
    }

    /// Attach key context.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error for a key.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound).with_key(key)
    }

    /// Whether this is the distinguished not-found outcome.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }

    /// Create a store error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, key: Option<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StoreErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StoreErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => StoreErrorKind::Timeout,
            _ => StoreErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(k) = key {
            error = error.with_key(k);
        }
        error
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (key: foo)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StoreErrorKind::NotFound => "Not found",
            StoreErrorKind::PermissionDenied => "Permission denied",
            StoreErrorKind::InvalidKey => "Invalid key",
            StoreErrorKind::Unavailable => "Unavailable",
            StoreErrorKind::Timeout => "Timeout",
            StoreErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Read access to the keyed store holding pages, components and the public
/// URI index.
///
/// Implementations must be shareable across concurrent requests; the sitemap
/// pipeline never writes.
#[async_trait]
pub trait Store: Send + Sync {
    /// Scan entries whose key starts with `prefix`, in key order.
    ///
    /// The returned stream is lazy: the backend is only advanced when the
    /// consumer polls for the next entry. At most `limit` entries are
    /// produced; anything beyond is silently omitted.
    fn list(&self, prefix: &str, limit: usize) -> EntryStream;

    /// Fetch the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreErrorKind::NotFound`] error if the key is absent, or
    /// another kind if the backend fails.
    async fn get(&self, key: &str) -> Result<String, StoreError>;
}
