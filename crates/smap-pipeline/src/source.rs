//! Page source: lazy scan of a site's stored pages.

use futures::{StreamExt, future};
use smap_store::{Store, references};

use crate::PageStream;
use crate::error::PipelineError;
use crate::record::PageRecord;

/// Stream every page stored under a site's namespace prefix, in key order.
///
/// At most `limit` records are read. The cap is a safety bound rather than a
/// cursor: pages beyond it are omitted, which is logged. Scan errors and
/// unparseable records are fatal to the stream.
pub fn stream_pages(store: &dyn Store, site_prefix: &str, limit: usize) -> PageStream {
    let prefix = references::pages_prefix(site_prefix);

    // One entry past the cap tells whether anything was left out.
    store
        .list(&prefix, limit.saturating_add(1))
        .enumerate()
        .filter_map(move |(index, entry)| {
            future::ready(if index < limit {
                Some(entry.map_err(PipelineError::from).and_then(PageRecord::parse))
            } else {
                tracing::warn!(
                    prefix = %prefix,
                    limit,
                    "Page scan limit reached, further pages are left out of the sitemap"
                );
                None
            })
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use smap_store::{Access, MockStore, StoreErrorKind};

    use super::*;

    fn store() -> MockStore {
        MockStore::new()
            .with_entry("site/_pages/bar", r#"{"url": "bar"}"#)
            .with_entry("site/_pages/zar@published", r#"{"url": "zar"}"#)
            .with_entry("site/_uris/YmFy", "site/_pages/bar")
    }

    #[tokio::test]
    async fn test_streams_and_parses_pages() {
        let store = store();

        let pages: Vec<PageRecord> = stream_pages(&store, "site", 100).try_collect().await.unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].reference, "site/_pages/bar");
        assert_eq!(serde_json::Value::Object(pages[0].data.clone()), json!({"url": "bar"}));
        assert_eq!(pages[1].reference, "site/_pages/zar@published");
        assert_eq!(serde_json::Value::Object(pages[1].data.clone()), json!({"url": "zar"}));
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let store = store();

        let pages: Vec<PageRecord> = stream_pages(&store, "site", 1).try_collect().await.unwrap();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].reference, "site/_pages/bar");
        // The entry past the cap is read to detect truncation, never parsed.
        assert_eq!(
            store.accesses(),
            vec![
                Access::Scan("site/_pages/bar".to_owned()),
                Access::Scan("site/_pages/zar@published".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn test_limit_past_cap_entry_not_parsed() {
        let store = store().with_entry("site/_pages/zzz", "not json");

        let pages: Vec<PageRecord> = stream_pages(&store, "site", 2).try_collect().await.unwrap();

        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_record_is_fatal() {
        let store = MockStore::new().with_entry("site/_pages/a", "not json");

        let err = stream_pages(&store, "site", 100)
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MalformedRecord { .. }));
    }

    #[tokio::test]
    async fn test_scan_failure_is_fatal() {
        let store = store().with_failure("site/_pages/bar", StoreErrorKind::Unavailable);

        let err = stream_pages(&store, "site", 100)
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Store(ref e) if e.kind == StoreErrorKind::Unavailable));
    }
}
