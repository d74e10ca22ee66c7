//! Cancellable handles for dispatched requests.

use crate::{Error, Result};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// A request running on its client's runtime.
///
/// Await the handle to receive the result on the awaiting task. Calling
/// [`cancel`](Self::cancel), or dropping the handle, aborts the request: the
/// in-flight transport future is dropped and the result is never delivered.
///
/// # Examples
///
/// ```no_run
/// use netspec::{Client, RequestSpec};
/// use serde_json::Value;
///
/// # async fn example() -> Result<(), netspec::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// let feed = client.dispatch::<Value>(RequestSpec::get("feed"));
/// let profile = client.dispatch::<Value>(RequestSpec::get("me"));
///
/// // The user navigated away; the feed is no longer needed.
/// feed.cancel();
///
/// let profile = profile.await?;
/// println!("{profile}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RequestHandle<T> {
    task: JoinHandle<Result<T>>,
    cancelled: AtomicBool,
}

impl<T> RequestHandle<T> {
    pub(crate) fn new(task: JoinHandle<Result<T>>) -> Self {
        Self {
            task,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Cancels the request.
    ///
    /// Awaiting the handle afterwards yields [`Error::Cancelled`]. Calling
    /// this after the result was delivered has no effect.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            if !self.task.is_finished() {
                tracing::debug!("Cancelling dispatched request");
            }
            self.task.abort();
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns `true` if the request has completed, failed or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Future for RequestHandle<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.is_cancelled() {
            return Poll::Ready(Err(Error::Cancelled));
        }
        match Pin::new(&mut this.task).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Err(Error::Cancelled)),
            Poll::Ready(Err(e)) => std::panic::resume_unwind(e.into_panic()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for RequestHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
