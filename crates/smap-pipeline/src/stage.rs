//! Stage plumbing shared by every pipeline step.

use std::future::Future;

use futures::future::{self, Either};
use futures::stream::{BoxStream, StreamExt};

use crate::error::{Outcome, PipelineError};

/// Run `decide` over each upstream item, one at a time.
///
/// The next upstream item is not polled until the future for the current one
/// has resolved, so asynchronous stages never overlap and output order
/// matches input order. Upstream errors are passed through untouched.
pub(crate) fn gate<T, U, F, Fut>(
    upstream: BoxStream<'static, Result<T, PipelineError>>,
    mut decide: F,
) -> BoxStream<'static, Result<U, PipelineError>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnMut(T) -> Fut + Send + 'static,
    Fut: Future<Output = Outcome<U>> + Send + 'static,
{
    upstream
        .then(move |item| match item {
            Ok(item) => Either::Left(decide(item)),
            Err(err) => Either::Right(future::ready(Outcome::Fatal(err))),
        })
        .filter_map(|outcome| future::ready(outcome.into_item()))
        .boxed()
}

/// End the stream right after its first error.
pub(crate) fn stop_after_error<T>(
    stream: BoxStream<'static, Result<T, PipelineError>>,
) -> BoxStream<'static, Result<T, PipelineError>>
where
    T: Send + 'static,
{
    stream
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}
