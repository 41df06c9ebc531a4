//! Keyed page store abstraction for the sitemap generator.
//!
//! This crate provides a [`Store`] trait over the key-value store that holds
//! site pages, components and the public URI index. The sitemap pipeline only
//! ever reads from it:
//!
//! - [`Store::list`] - lazy, key-ordered range scan over a key prefix
//! - [`Store::get`] - point lookup, with a distinguished not-found outcome
//!
//! # Implementations
//!
//! - [`MemoryStore`]: in-memory `BTreeMap` backend, loadable from a JSON dump
//! - [`MockStore`]: failure injection and access log for tests (behind the `mock` feature)
//!
//! Key conventions (`/_pages/`, `/_uris/`, `@published`) live in [`references`].
//!
//! # Example
//!
//! ```ignore
//! use futures::StreamExt;
//! use smap_store::{MemoryStore, Store};
//!
//! let store = MemoryStore::new().with_entry("site/_pages/a@published", r#"{"url":"a"}"#);
//! let mut pages = store.list("site/_pages/", 100);
//! while let Some(entry) = pages.next().await {
//!     let entry = entry?;
//!     println!("{}", entry.key);
//! }
//! ```

mod memory;
#[cfg(feature = "mock")]
mod mock;
pub mod references;
mod store;

pub use memory::MemoryStore;
#[cfg(feature = "mock")]
pub use mock::{Access, MockStore};
pub use store::{Entry, EntryStream, Store, StoreError, StoreErrorKind};
