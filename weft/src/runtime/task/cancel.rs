//! Cooperative cancellation.
//!
//! Cancelling a task sets the flag on its tree node and on every node below
//! it. Nothing is interrupted: running code only notices when it asks, via
//! [`is_cancelled`] or [`check_cancellation`], usually right after resuming
//! from a suspension point. A task that never asks runs to completion.

use crate::error::CancellationError;
use crate::runtime::context;
use crate::runtime::task::TaskHandle;

use std::sync::atomic::{AtomicBool, Ordering};

/// Per-node cancellation signal. Once set it is never cleared.
#[derive(Debug, Default)]
pub(crate) struct CancellationFlag {
    set: AtomicBool,
}

impl CancellationFlag {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the flag, returning `true` if this call was the one that set it.
    pub(crate) fn set(&self) -> bool {
        !self.set.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_set(&self) -> bool {
        self.set.load(Ordering::SeqCst)
    }
}

/// Returns `true` if the calling task, or any of its ancestors, has been
/// cancelled.
///
/// Always `false` outside of a task.
pub fn is_cancelled() -> bool {
    context::current_task().is_some_and(|node| node.is_cancelled())
}

/// Returns `Err(CancellationError)` if the calling task, or any of its
/// ancestors, has been cancelled.
///
/// The error converts into [`TaskError::Cancelled`](crate::error::TaskError),
/// so `check_cancellation()?` inside a task body ends the task in the
/// `Cancelled` state.
///
/// # Examples
///
/// ```rust,ignore
/// task::spawn(async {
///     loop {
///         task::check_cancellation()?;
///         do_some_work();
///         yield_now().await;
///     }
/// });
/// ```
pub fn check_cancellation() -> Result<(), CancellationError> {
    if is_cancelled() {
        Err(CancellationError)
    } else {
        Ok(())
    }
}

/// Cancels the task behind `handle` together with its whole structured
/// subtree.
///
/// Detached tasks spawned from inside that subtree are unaffected.
pub fn cancel<T>(handle: &TaskHandle<T>) {
    handle.cancel();
}
