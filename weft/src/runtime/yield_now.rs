use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that yields execution back to the scheduler exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    /// On the first poll, the task wakes itself and returns `Poll::Pending`,
    /// which puts it at the back of its priority band. On the second poll,
    /// the future completes.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.0 {
            self.0 = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        Poll::Ready(())
    }
}

/// Yields execution back to the scheduler.
///
/// This is an explicit suspension point: other ready tasks and actor drains
/// of the same or a higher priority get to run before the current task
/// continues. Long-running loops should yield regularly, and usually check
/// for cancellation right after.
///
/// # Examples
///
/// ```rust,ignore
/// loop {
///     task::check_cancellation()?;
///     step();
///     yield_now().await;
/// }
/// ```
pub async fn yield_now() {
    YieldOnce(false).await
}
