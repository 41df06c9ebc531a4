//! Published and publicity filters.

use std::sync::Arc;

use futures::future;
use smap_store::{Store, references};

use crate::PageStream;
use crate::error::{DropReason, Outcome};
use crate::meta::MetaLookup;
use crate::record::PageRecord;
use crate::stage::gate;

/// Keep only published revisions (references ending in `@published`).
pub fn filter_published(upstream: PageStream) -> PageStream {
    gate(upstream, |page: PageRecord| {
        future::ready(if references::is_published(&page.reference) {
            Outcome::Forward(page)
        } else {
            Outcome::dropped(&page.reference, DropReason::Unpublished)
        })
    })
}

/// Keep only pages whose public URL currently resolves to them.
///
/// For each page the metadata is fetched for its published URL, then the
/// public URI index entry for that URL is read. The page survives if the
/// indexed reference, as its published variant, is the page itself. Missing
/// metadata or index entries drop the page; any other store failure is fatal.
pub fn filter_public(
    upstream: PageStream,
    store: Arc<dyn Store>,
    meta: Arc<dyn MetaLookup>,
) -> PageStream {
    gate(upstream, move |page| {
        let store = Arc::clone(&store);
        let meta = Arc::clone(&meta);
        async move { check_public(page, store.as_ref(), meta.as_ref()).await }
    })
}

async fn check_public(
    page: PageRecord,
    store: &dyn Store,
    meta: &dyn MetaLookup,
) -> Outcome<PageRecord> {
    let url = match meta.page_meta(&page).await {
        Ok(meta) => match meta.published_url() {
            Some(url) => url.to_owned(),
            None => return Outcome::dropped(&page.reference, DropReason::NoPublicUrl),
        },
        Err(err) if err.is_not_found() => {
            return Outcome::dropped(&page.reference, DropReason::NoPublicUrl);
        }
        Err(err) => return Outcome::Fatal(err.into()),
    };

    let key = references::uri_key(references::page_prefix(&page.reference), &url);
    match store.get(&key).await {
        Ok(indexed) => {
            let current = references::replace_version(indexed.trim(), references::PUBLISHED);
            if current == page.reference {
                Outcome::Forward(page)
            } else {
                Outcome::dropped(&page.reference, DropReason::Superseded { current })
            }
        }
        Err(err) if err.is_not_found() => {
            Outcome::dropped(&page.reference, DropReason::NoPublicUri { key })
        }
        Err(err) => Outcome::Fatal(err.into()),
    }
}
