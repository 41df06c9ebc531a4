//! Prelude/postlude wrapper for fragment streams.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::Stream;

use crate::error::PipelineError;

/// Wraps a fragment stream with a prelude and a postlude.
///
/// The prelude is emitted once, before the first fragment or, for an empty
/// stream, right before the postlude. The postlude is emitted once, after
/// the last fragment. Empty strings count as not configured. If the inner
/// stream fails, the error is passed on and neither bookend follows it.
pub struct Bookends<S> {
    inner: Option<S>,
    prelude: Option<String>,
    postlude: Option<String>,
    prelude_emitted: bool,
    held: Option<String>,
}

impl<S> Bookends<S> {
    /// Wrap `inner`.
    pub fn new(inner: S, prelude: Option<String>, postlude: Option<String>) -> Self {
        Self {
            inner: Some(inner),
            prelude: prelude.filter(|s| !s.is_empty()),
            postlude: postlude.filter(|s| !s.is_empty()),
            prelude_emitted: false,
            held: None,
        }
    }

    fn take_prelude(&mut self) -> Option<String> {
        if self.prelude_emitted {
            return None;
        }
        self.prelude_emitted = true;
        self.prelude.take()
    }
}

impl<S> Stream for Bookends<S>
where
    S: Stream<Item = Result<String, PipelineError>> + Unpin,
{
    type Item = Result<String, PipelineError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(fragment) = this.held.take() {
            return Poll::Ready(Some(Ok(fragment)));
        }

        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(Pin::new(inner).poll_next(cx)) {
            Some(Ok(fragment)) => match this.take_prelude() {
                Some(prelude) => {
                    this.held = Some(fragment);
                    Poll::Ready(Some(Ok(prelude)))
                }
                None => Poll::Ready(Some(Ok(fragment))),
            },
            Some(Err(err)) => {
                this.inner = None;
                this.postlude = None;
                Poll::Ready(Some(Err(err)))
            }
            None => {
                this.inner = None;
                match this.take_prelude() {
                    Some(prelude) => {
                        this.held = this.postlude.take();
                        Poll::Ready(Some(Ok(prelude)))
                    }
                    None => Poll::Ready(this.postlude.take().map(Ok)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
    use pretty_assertions::assert_eq;

    use super::*;

    fn fragments(items: &[&str]) -> BoxStream<'static, Result<String, PipelineError>> {
        let items: Vec<_> = items.iter().map(|s| Ok((*s).to_owned())).collect();
        stream::iter(items).boxed()
    }

    async fn wrap(items: &[&str], prelude: Option<&str>, postlude: Option<&str>) -> Vec<String> {
        Bookends::new(
            fragments(items),
            prelude.map(str::to_owned),
            postlude.map(str::to_owned),
        )
        .try_collect()
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_stream_gets_both_bookends() {
        assert_eq!(wrap(&[], Some("A"), Some("B")).await, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_wraps_items() {
        assert_eq!(
            wrap(&["x", "y", "z"], Some("A"), Some("B")).await,
            vec!["A", "x", "y", "z", "B"]
        );
    }

    #[tokio::test]
    async fn test_postlude_only() {
        assert_eq!(
            wrap(&["x", "y", "z"], None, Some("B")).await,
            vec!["x", "y", "z", "B"]
        );
    }

    #[tokio::test]
    async fn test_prelude_only() {
        assert_eq!(wrap(&["x"], Some("A"), None).await, vec!["A", "x"]);
        assert_eq!(wrap(&[], Some("A"), None).await, vec!["A"]);
    }

    #[tokio::test]
    async fn test_empty_bookends_are_skipped() {
        assert_eq!(wrap(&["x"], Some(""), Some("")).await, vec!["x"]);
    }

    #[tokio::test]
    async fn test_error_ends_without_postlude() {
        let inner = stream::iter(vec![
            Ok("x".to_owned()),
            Err(PipelineError::MissingUrl {
                reference: "p".to_owned(),
            }),
            Ok("y".to_owned()),
        ])
        .boxed();

        let out: Vec<_> = Bookends::new(inner, Some("A".to_owned()), Some("B".to_owned()))
            .collect()
            .await;

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_ref().unwrap(), "A");
        assert_eq!(out[1].as_ref().unwrap(), "x");
        assert!(out[2].is_err());
    }
}
